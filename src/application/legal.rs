//! Legal pages: one per page type and jurisdiction, versioned on every edit.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use time::serde::rfc3339;
use time::{Duration, OffsetDateTime};
use tracing::info;
use uuid::Uuid;

use crate::application::ai::{AiContentService, GenerateContentCommand};
use crate::application::error::ServiceError;
use crate::application::store::{CachedCollection, CollectionStore, collections};
use crate::application::validation::Validate;
use crate::cache::CacheConfig;
use crate::domain::entities::LegalPage;
use crate::domain::types::{AiContentType, LegalPageType};

pub const INITIAL_VERSION: &str = "1.0.0";
const REVIEW_INTERVAL_DAYS: i64 = 365;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLegalPageCommand {
    #[serde(rename = "type")]
    pub page_type: LegalPageType,
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    pub jurisdiction: String,
    #[serde(default)]
    pub applicable_laws: Vec<String>,
    #[serde(default, with = "rfc3339::option")]
    pub effective_date: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateLegalPageCommand {
    pub title: Option<String>,
    pub content: Option<String>,
    pub applicable_laws: Option<Vec<String>>,
    #[serde(with = "rfc3339::option")]
    pub effective_date: Option<OffsetDateTime>,
    pub legal_reviewed: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateLegalPageCommand {
    #[serde(rename = "type")]
    pub page_type: LegalPageType,
    pub jurisdiction: String,
    pub company_name: String,
    #[serde(default)]
    pub applicable_laws: Vec<String>,
}

pub struct LegalPageService {
    pages: CachedCollection<LegalPage>,
    ai: Arc<AiContentService>,
}

impl LegalPageService {
    pub fn new(store: Arc<dyn CollectionStore>, cache: CacheConfig, ai: Arc<AiContentService>) -> Self {
        Self {
            pages: CachedCollection::new(store, collections::LEGAL_PAGES, cache.ttl),
            ai,
        }
    }

    pub async fn list_pages(
        &self,
        jurisdiction: Option<&str>,
    ) -> Result<Vec<LegalPage>, ServiceError> {
        let mut pages: Vec<LegalPage> = self
            .pages
            .all()
            .await?
            .iter()
            .filter(|page| jurisdiction.is_none_or(|j| page.jurisdiction.eq_ignore_ascii_case(j)))
            .cloned()
            .collect();
        pages.sort_by(|a, b| {
            a.jurisdiction
                .cmp(&b.jurisdiction)
                .then_with(|| a.page_type.title().cmp(b.page_type.title()))
        });
        Ok(pages)
    }

    pub async fn get_page(&self, id: Uuid) -> Result<LegalPage, ServiceError> {
        self.pages
            .all()
            .await?
            .iter()
            .find(|page| page.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("legal page"))
    }

    pub async fn get_page_for(
        &self,
        page_type: LegalPageType,
        jurisdiction: &str,
    ) -> Result<LegalPage, ServiceError> {
        self.pages
            .all()
            .await?
            .iter()
            .find(|page| page.page_type == page_type && page.jurisdiction.eq_ignore_ascii_case(jurisdiction))
            .cloned()
            .ok_or_else(|| ServiceError::not_found("legal page"))
    }

    pub async fn create_page(&self, command: CreateLegalPageCommand) -> Result<LegalPage, ServiceError> {
        self.insert(command, false).await
    }

    pub async fn update_page(
        &self,
        id: Uuid,
        command: UpdateLegalPageCommand,
    ) -> Result<LegalPage, ServiceError> {
        let now = OffsetDateTime::now_utc();
        let updated = self
            .pages
            .mutate(|pages| {
                let index = pages
                    .iter()
                    .position(|page| page.id == id)
                    .ok_or_else(|| ServiceError::not_found("legal page"))?;
                let mut page = pages[index].clone();
                apply_update(&mut page, command, now)?;
                page.validate()?;
                pages[index] = page.clone();
                Ok(page)
            })
            .await?;
        info!(
            target = "timberline::legal",
            page_id = %updated.id,
            version = %updated.version,
            reviewed = updated.legal_reviewed,
            "legal page updated"
        );
        Ok(updated)
    }

    pub async fn delete_page(&self, id: Uuid) -> Result<(), ServiceError> {
        self.pages
            .mutate(|pages| {
                let before = pages.len();
                pages.retain(|page| page.id != id);
                if pages.len() == before {
                    Err(ServiceError::not_found("legal page"))
                } else {
                    Ok(())
                }
            })
            .await?;
        info!(target = "timberline::legal", page_id = %id, "legal page deleted");
        Ok(())
    }

    /// Draft a page with the content generator. An existing page for the same
    /// type and jurisdiction gets the draft as new content and must be
    /// reviewed again.
    pub async fn generate_page(
        &self,
        command: GenerateLegalPageCommand,
        user_id: &str,
    ) -> Result<LegalPage, ServiceError> {
        let jurisdiction = command.jurisdiction.trim().to_string();
        let request = GenerateContentCommand {
            description: format!("{} for {jurisdiction}", command.page_type.title()),
            content_type: AiContentType::LegalPage,
            template_id: None,
            prompt: None,
            variables: BTreeMap::from([
                ("page_type".to_string(), command.page_type.title().to_string()),
                ("company_name".to_string(), command.company_name.trim().to_string()),
                ("jurisdiction".to_string(), jurisdiction.clone()),
                (
                    "applicable_laws".to_string(),
                    if command.applicable_laws.is_empty() {
                        "the laws of the jurisdiction".to_string()
                    } else {
                        command.applicable_laws.join(", ")
                    },
                ),
            ]),
        };
        let generated = self.ai.generate_content(request, user_id).await?;
        let content = generated.generated_content.unwrap_or_default().trim().to_string();

        match self.get_page_for(command.page_type, &jurisdiction).await {
            Ok(existing) => {
                let now = OffsetDateTime::now_utc();
                self.pages
                    .mutate(|pages| {
                        let index = pages
                            .iter()
                            .position(|page| page.id == existing.id)
                            .ok_or_else(|| ServiceError::not_found("legal page"))?;
                        let mut page = pages[index].clone();
                        apply_update(
                            &mut page,
                            UpdateLegalPageCommand {
                                content: Some(content),
                                applicable_laws: Some(command.applicable_laws),
                                ..Default::default()
                            },
                            now,
                        )?;
                        page.ai_generated = true;
                        page.validate()?;
                        pages[index] = page.clone();
                        Ok(page)
                    })
                    .await
            }
            Err(ServiceError::NotFound { .. }) => {
                self.insert(
                    CreateLegalPageCommand {
                        page_type: command.page_type,
                        title: None,
                        content,
                        jurisdiction,
                        applicable_laws: command.applicable_laws,
                        effective_date: None,
                    },
                    true,
                )
                .await
            }
            Err(err) => Err(err),
        }
    }

    async fn insert(
        &self,
        command: CreateLegalPageCommand,
        ai_generated: bool,
    ) -> Result<LegalPage, ServiceError> {
        let now = OffsetDateTime::now_utc();
        let page = LegalPage {
            id: Uuid::new_v4(),
            page_type: command.page_type,
            title: command
                .title
                .map(|title| title.trim().to_string())
                .filter(|title| !title.is_empty())
                .unwrap_or_else(|| command.page_type.title().to_string()),
            content: command.content,
            version: INITIAL_VERSION.to_string(),
            ai_generated,
            legal_reviewed: false,
            jurisdiction: command.jurisdiction.trim().to_string(),
            applicable_laws: command.applicable_laws,
            effective_date: command.effective_date,
            last_reviewed_at: None,
            next_review_at: None,
            created_at: now,
            updated_at: now,
        };
        page.validate()?;

        let created = self
            .pages
            .mutate(|pages| {
                if pages.iter().any(|existing| {
                    existing.page_type == page.page_type
                        && existing.jurisdiction.eq_ignore_ascii_case(&page.jurisdiction)
                }) {
                    return Err(ServiceError::conflict(format!(
                        "a {} page for {} already exists",
                        page.page_type.title(),
                        page.jurisdiction
                    )));
                }
                pages.push(page.clone());
                Ok(page)
            })
            .await?;
        info!(
            target = "timberline::legal",
            page_id = %created.id,
            jurisdiction = %created.jurisdiction,
            ai_generated,
            "legal page created"
        );
        Ok(created)
    }
}

fn apply_update(
    page: &mut LegalPage,
    command: UpdateLegalPageCommand,
    now: OffsetDateTime,
) -> Result<(), ServiceError> {
    let content_changed = command
        .content
        .as_ref()
        .is_some_and(|content| *content != page.content);

    if let Some(title) = command.title {
        page.title = title.trim().to_string();
    }
    if let Some(content) = command.content {
        page.content = content;
    }
    if let Some(laws) = command.applicable_laws {
        page.applicable_laws = laws;
    }
    if let Some(effective) = command.effective_date {
        page.effective_date = Some(effective);
    }

    page.version = bump_version(&page.version, content_changed)?;
    if content_changed {
        page.legal_reviewed = false;
    }
    if command.legal_reviewed == Some(true) {
        page.legal_reviewed = true;
        page.last_reviewed_at = Some(now);
        page.next_review_at = Some(now + Duration::days(REVIEW_INTERVAL_DAYS));
    } else if command.legal_reviewed == Some(false) {
        page.legal_reviewed = false;
    }
    page.updated_at = now;
    Ok(())
}

/// Minor bump for content changes, patch bump otherwise.
pub fn bump_version(version: &str, content_changed: bool) -> Result<String, ServiceError> {
    let parts: Vec<u32> = version
        .split('.')
        .map(str::parse)
        .collect::<Result<_, _>>()
        .map_err(|_| ServiceError::unexpected(format!("stored version `{version}` is malformed")))?;
    let [major, minor, patch] = parts[..] else {
        return Err(ServiceError::unexpected(format!(
            "stored version `{version}` is malformed"
        )));
    };
    Ok(if content_changed {
        format!("{major}.{}.0", minor + 1)
    } else {
        format!("{major}.{minor}.{}", patch + 1)
    })
}
