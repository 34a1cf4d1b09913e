//! Navigation menus, menu quality reports, and breadcrumb trails.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::application::error::ServiceError;
use crate::application::seo::{Breadcrumb, SiteProfile, generate_breadcrumb_structured_data};
use crate::application::store::{CachedCollection, CollectionStore, collections};
use crate::application::validation::{Validate, is_absolute_url, quality_score};
use crate::cache::CacheConfig;
use crate::domain::entities::{NavigationItem, NavigationMenu};
use crate::domain::types::{LinkType, MenuType};

pub const MAX_MENU_DEPTH: usize = 3;
const MAX_LABEL_LEN: usize = 50;
const MAX_MENU_ITEMS: usize = 20;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMenuCommand {
    pub name: String,
    #[serde(rename = "type")]
    pub menu_type: MenuType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub items: Vec<NavigationItem>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateMenuCommand {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub menu_type: Option<MenuType>,
    pub description: Option<String>,
    pub items: Option<Vec<NavigationItem>>,
    pub is_active: Option<bool>,
    /// When set, the update only applies if the stored version matches.
    pub expected_version: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuValidationReport {
    pub is_valid: bool,
    pub score: u8,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreadcrumbTrail {
    pub items: Vec<Breadcrumb>,
    pub structured_data: Value,
}

pub struct NavigationService {
    menus: CachedCollection<NavigationMenu>,
    site: SiteProfile,
}

impl NavigationService {
    pub fn new(store: Arc<dyn CollectionStore>, cache: CacheConfig, site: SiteProfile) -> Self {
        Self {
            menus: CachedCollection::new(store, collections::NAVIGATION_MENUS, cache.ttl),
            site,
        }
    }

    pub async fn list_menus(&self) -> Result<Vec<NavigationMenu>, ServiceError> {
        let mut menus = self.menus.all().await?.as_ref().clone();
        menus.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(menus)
    }

    pub async fn get_menu(&self, id: Uuid) -> Result<NavigationMenu, ServiceError> {
        self.menus
            .all()
            .await?
            .iter()
            .find(|menu| menu.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("menu"))
    }

    /// First active menu of the given type, by name.
    pub async fn get_menu_by_type(&self, menu_type: MenuType) -> Result<NavigationMenu, ServiceError> {
        self.list_menus()
            .await?
            .into_iter()
            .find(|menu| menu.menu_type == menu_type && menu.is_active)
            .ok_or_else(|| ServiceError::not_found("menu"))
    }

    pub async fn create_menu(&self, command: CreateMenuCommand) -> Result<NavigationMenu, ServiceError> {
        let now = OffsetDateTime::now_utc();
        let menu = NavigationMenu {
            id: Uuid::new_v4(),
            name: command.name.trim().to_string(),
            menu_type: command.menu_type,
            description: command.description.filter(|text| !text.trim().is_empty()),
            items: normalize_items(command.items),
            is_active: command.is_active.unwrap_or(true),
            version: 1,
            created_at: now,
            updated_at: now,
        };
        menu.validate()?;

        let created = self
            .menus
            .mutate(|menus| {
                ensure_unique_name(menus, &menu.name, None)?;
                menus.push(menu.clone());
                Ok(menu)
            })
            .await?;
        info!(
            target = "timberline::navigation",
            menu_id = %created.id,
            name = %created.name,
            items = created.item_count(),
            "navigation menu created"
        );
        Ok(created)
    }

    pub async fn update_menu(
        &self,
        id: Uuid,
        command: UpdateMenuCommand,
    ) -> Result<NavigationMenu, ServiceError> {
        let now = OffsetDateTime::now_utc();
        let updated = self
            .menus
            .mutate(|menus| {
                let index = menus
                    .iter()
                    .position(|menu| menu.id == id)
                    .ok_or_else(|| ServiceError::not_found("menu"))?;
                let mut menu = menus[index].clone();
                if let Some(expected) = command.expected_version
                    && expected != menu.version
                {
                    return Err(ServiceError::conflict(format!(
                        "menu was modified concurrently: expected version {expected}, found {}",
                        menu.version
                    )));
                }

                if let Some(name) = command.name {
                    menu.name = name.trim().to_string();
                    ensure_unique_name(menus, &menu.name, Some(id))?;
                }
                if let Some(menu_type) = command.menu_type {
                    menu.menu_type = menu_type;
                }
                if let Some(description) = command.description {
                    menu.description = Some(description).filter(|text| !text.trim().is_empty());
                }
                if let Some(items) = command.items {
                    menu.items = normalize_items(items);
                }
                if let Some(active) = command.is_active {
                    menu.is_active = active;
                }
                menu.version = menu.version.saturating_add(1);
                menu.updated_at = now;
                menu.validate()?;

                menus[index] = menu.clone();
                Ok(menu)
            })
            .await?;
        info!(
            target = "timberline::navigation",
            menu_id = %updated.id,
            version = updated.version,
            "navigation menu updated"
        );
        Ok(updated)
    }

    pub async fn delete_menu(&self, id: Uuid) -> Result<(), ServiceError> {
        self.menus
            .mutate(|menus| {
                let before = menus.len();
                menus.retain(|menu| menu.id != id);
                if menus.len() == before {
                    Err(ServiceError::not_found("menu"))
                } else {
                    Ok(())
                }
            })
            .await?;
        info!(target = "timberline::navigation", menu_id = %id, "navigation menu deleted");
        Ok(())
    }

    /// Breadcrumbs for a site path. Segment labels come from the active main
    /// menus where a matching item exists; other segments are humanized.
    pub async fn get_breadcrumbs(&self, path: &str) -> Result<BreadcrumbTrail, ServiceError> {
        let menus = self.menus.all().await?;
        let main: Vec<&NavigationMenu> = menus
            .iter()
            .filter(|menu| menu.menu_type == MenuType::Main && menu.is_active)
            .collect();

        let mut items = vec![Breadcrumb {
            label: "Home".to_string(),
            url: "/".to_string(),
        }];
        let mut prefix = String::new();
        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            prefix.push('/');
            prefix.push_str(segment);
            let label = main
                .iter()
                .find_map(|menu| find_by_url(&menu.items, &prefix))
                .map(|item| item.label.clone())
                .unwrap_or_else(|| humanize(segment));
            items.push(Breadcrumb {
                label,
                url: prefix.clone(),
            });
        }

        let structured_data = generate_breadcrumb_structured_data(&items, &self.site);
        Ok(BreadcrumbTrail {
            items,
            structured_data,
        })
    }
}

/// Score a menu: basic field errors, nesting beyond [`MAX_MENU_DEPTH`], and
/// malformed links are errors; accessibility and size issues are warnings.
pub fn validate_navigation_menu(menu: &NavigationMenu) -> MenuValidationReport {
    let mut errors = match menu.validate() {
        Ok(()) => Vec::new(),
        Err(violations) => violations.into_messages(),
    };
    let mut warnings = Vec::new();

    walk_items(&menu.items, "items", 1, &mut errors, &mut warnings);

    let total = menu.item_count();
    if total > MAX_MENU_ITEMS {
        warnings.push(format!(
            "menu has {total} items; more than {MAX_MENU_ITEMS} slows navigation rendering"
        ));
    }

    MenuValidationReport {
        is_valid: errors.is_empty(),
        score: quality_score(errors.len(), warnings.len()),
        errors,
        warnings,
    }
}

fn walk_items(
    items: &[NavigationItem],
    path: &str,
    depth: usize,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    for (index, item) in items.iter().enumerate() {
        let at = format!("{path}[{index}]");
        if depth > MAX_MENU_DEPTH {
            errors.push(format!(
                "{at}: nested {depth} levels deep; at most {MAX_MENU_DEPTH} levels are allowed"
            ));
        }

        let label = item.label.trim();
        if label.is_empty() {
            errors.push(format!("{at}.label: is required"));
        } else if label.chars().count() > MAX_LABEL_LEN {
            warnings.push(format!(
                "{at}.label: longer than {MAX_LABEL_LEN} characters is hard to scan"
            ));
        }

        match item.link_type {
            LinkType::Internal if !item.url.starts_with('/') => {
                errors.push(format!("{at}.url: internal links must start with \"/\""));
            }
            LinkType::External if !is_absolute_url(&item.url) => {
                errors.push(format!("{at}.url: external links must be absolute URLs"));
            }
            _ => {}
        }

        if !item.children.is_empty() {
            if item.description.as_deref().is_none_or(|text| text.trim().is_empty()) {
                warnings.push(format!(
                    "{at}.description: items with children should describe their submenu"
                ));
            }
            walk_items(&item.children, &format!("{at}.children"), depth + 1, errors, warnings);
        }
    }
}

fn normalize_items(items: Vec<NavigationItem>) -> Vec<NavigationItem> {
    items
        .into_iter()
        .map(|mut item| {
            if item.id.is_nil() {
                item.id = Uuid::new_v4();
            }
            item.label = item.label.trim().to_string();
            item.url = item.url.trim().to_string();
            item.children = normalize_items(item.children);
            item
        })
        .collect()
}

fn ensure_unique_name(menus: &[NavigationMenu], name: &str, except: Option<Uuid>) -> Result<(), ServiceError> {
    if menus
        .iter()
        .any(|menu| Some(menu.id) != except && menu.name.eq_ignore_ascii_case(name))
    {
        return Err(ServiceError::conflict(format!(
            "a menu named `{name}` already exists"
        )));
    }
    Ok(())
}

fn find_by_url<'a>(items: &'a [NavigationItem], url: &str) -> Option<&'a NavigationItem> {
    items.iter().find_map(|item| {
        if item.url.trim_end_matches('/') == url {
            Some(item)
        } else {
            find_by_url(&item.children, url)
        }
    })
}

fn humanize(segment: &str) -> String {
    segment
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::store::MemoryCollectionStore;
    use url::Url;

    fn service() -> NavigationService {
        NavigationService::new(
            Arc::new(MemoryCollectionStore::new()),
            CacheConfig::default(),
            SiteProfile {
                name: "Timberline".to_string(),
                base_url: Url::parse("https://timber.example").unwrap(),
            },
        )
    }

    fn item(label: &str, url: &str, children: Vec<NavigationItem>) -> NavigationItem {
        NavigationItem {
            id: Uuid::nil(),
            label: label.to_string(),
            url: url.to_string(),
            link_type: LinkType::Internal,
            icon: None,
            description: (!children.is_empty()).then(|| format!("{label} section")),
            open_in_new_tab: false,
            children,
        }
    }

    fn nested(depth: usize) -> NavigationItem {
        let mut current = item(&format!("Level {depth}"), &format!("/l{depth}"), Vec::new());
        for level in (1..depth).rev() {
            current = item(&format!("Level {level}"), &format!("/l{level}"), vec![current]);
        }
        current
    }

    fn menu_with(items: Vec<NavigationItem>) -> NavigationMenu {
        let now = OffsetDateTime::now_utc();
        NavigationMenu {
            id: Uuid::new_v4(),
            name: "Main".to_string(),
            menu_type: MenuType::Main,
            description: None,
            items,
            is_active: true,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    fn create(name: &str, items: Vec<NavigationItem>) -> CreateMenuCommand {
        CreateMenuCommand {
            name: name.to_string(),
            menu_type: MenuType::Main,
            description: None,
            items,
            is_active: None,
        }
    }

    #[test]
    fn three_levels_pass_and_four_fail() {
        let ok = validate_navigation_menu(&menu_with(vec![nested(3)]));
        assert!(ok.is_valid, "{:?}", ok.errors);
        assert_eq!(ok.score, 100);

        let deep = validate_navigation_menu(&menu_with(vec![nested(4)]));
        assert!(!deep.is_valid);
        assert!(deep.errors[0].contains("nested 4 levels"));
        assert_eq!(deep.score, 80);
    }

    #[test]
    fn link_format_and_heuristics_are_reported() {
        let mut external = item("Supplier", "not a url", Vec::new());
        external.link_type = LinkType::External;
        let mut parent = item("Products", "/products", vec![item("Decking", "/decking", Vec::new())]);
        parent.description = None;
        let long = item(&"x".repeat(60), "/long", Vec::new());
        let relative = item("Blog", "blog", Vec::new());

        let report = validate_navigation_menu(&menu_with(vec![external, parent, long, relative]));
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.warnings.len(), 2);
        assert_eq!(report.score, 50);
    }

    #[test]
    fn large_menus_warn() {
        let items = (0..21)
            .map(|index| item(&format!("Item {index}"), &format!("/i{index}"), Vec::new()))
            .collect();
        let report = validate_navigation_menu(&menu_with(items));
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 1);
    }

    #[tokio::test]
    async fn create_assigns_ids_version_and_rejects_duplicate_names() {
        let nav = service();
        let menu = nav.create_menu(create("Main", vec![nested(2)])).await.unwrap();
        assert_eq!(menu.version, 1);
        assert!(!menu.items[0].id.is_nil());
        assert!(!menu.items[0].children[0].id.is_nil());

        let err = nav.create_menu(create("main", Vec::new())).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict { .. }));
    }

    #[tokio::test]
    async fn over_deep_menus_can_still_be_stored() {
        let nav = service();
        let menu = nav.create_menu(create("Deep", vec![nested(5)])).await.unwrap();
        assert!(!validate_navigation_menu(&menu).is_valid);
    }

    #[tokio::test]
    async fn update_bumps_version_and_checks_expected_version() {
        let nav = service();
        let menu = nav.create_menu(create("Footer", Vec::new())).await.unwrap();

        let updated = nav
            .update_menu(
                menu.id,
                UpdateMenuCommand {
                    description: Some("Bottom links".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.version, 2);

        let stale = nav
            .update_menu(
                menu.id,
                UpdateMenuCommand {
                    is_active: Some(false),
                    expected_version: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(stale, ServiceError::Conflict { .. }));

        let fresh = nav
            .update_menu(
                menu.id,
                UpdateMenuCommand {
                    is_active: Some(false),
                    expected_version: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(fresh.version, 3);
        assert!(!fresh.is_active);
    }

    #[tokio::test]
    async fn menu_by_type_skips_inactive_and_delete_removes() {
        let nav = service();
        let inactive = nav
            .create_menu(CreateMenuCommand {
                is_active: Some(false),
                ..create("Archived", Vec::new())
            })
            .await
            .unwrap();
        let active = nav.create_menu(create("Primary", Vec::new())).await.unwrap();
        assert_eq!(nav.get_menu_by_type(MenuType::Main).await.unwrap().id, active.id);

        nav.delete_menu(inactive.id).await.unwrap();
        assert_eq!(nav.list_menus().await.unwrap().len(), 1);
        assert!(matches!(
            nav.delete_menu(inactive.id).await,
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn breadcrumbs_use_menu_labels_and_humanize_the_rest() {
        let nav = service();
        nav.create_menu(create(
            "Main",
            vec![item(
                "Timber Products",
                "/products",
                vec![item("Decking Boards", "/products/decking", Vec::new())],
            )],
        ))
        .await
        .unwrap();

        let trail = nav.get_breadcrumbs("/products/decking/spotted-gum").await.unwrap();
        let labels: Vec<&str> = trail.items.iter().map(|crumb| crumb.label.as_str()).collect();
        assert_eq!(labels, vec!["Home", "Timber Products", "Decking Boards", "Spotted Gum"]);
        assert_eq!(trail.structured_data["@type"], "BreadcrumbList");
        assert_eq!(
            trail.structured_data["itemListElement"][3]["item"],
            "https://timber.example/products/decking/spotted-gum"
        );
    }
}
