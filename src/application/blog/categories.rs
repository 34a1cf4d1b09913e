use serde::Deserialize;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::BlogService;
use crate::application::error::ServiceError;
use crate::application::validation::Validate;
use crate::domain::entities::{BlogCategory, BlogPost};
use crate::domain::slug::generate_slug;

pub const DEFAULT_CATEGORY_COLOR: &str = "#8B5E3C";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryCommand {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateCategoryCommand {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub order: Option<i32>,
}

impl BlogService {
    /// Categories ordered by `order` then name, with `postCount` derived from
    /// posts of any status.
    pub async fn get_categories(&self, include_empty: bool) -> Result<Vec<BlogCategory>, ServiceError> {
        let posts = self.posts.all().await?;
        let mut categories: Vec<BlogCategory> = self
            .categories
            .all()
            .await?
            .iter()
            .cloned()
            .map(|mut category| {
                category.post_count = count_posts(&posts, category.id);
                category
            })
            .filter(|category| include_empty || category.post_count > 0)
            .collect();
        categories.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
        Ok(categories)
    }

    pub async fn get_category(&self, id: Uuid) -> Result<BlogCategory, ServiceError> {
        self.find_category(|category| category.id == id).await
    }

    pub async fn get_category_by_slug(&self, slug: &str) -> Result<BlogCategory, ServiceError> {
        self.find_category(|category| category.slug == slug).await
    }

    pub async fn create_category(
        &self,
        command: CreateCategoryCommand,
    ) -> Result<BlogCategory, ServiceError> {
        let slug = match command.slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => slug.to_string(),
            _ => generate_slug(&command.name)
                .map_err(|err| ServiceError::validation(format!("slug: {err}")))?,
        };
        let now = OffsetDateTime::now_utc();
        let category = BlogCategory {
            id: Uuid::new_v4(),
            name: command.name.trim().to_string(),
            slug,
            description: non_empty(command.description),
            color: non_empty(command.color).unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
            post_count: 0,
            order: command.order.unwrap_or(0),
            created_at: now,
            updated_at: now,
        };
        category.validate()?;

        let created = self
            .categories
            .mutate(|categories| {
                ensure_unique(categories, &category, None)?;
                categories.push(category.clone());
                Ok(category)
            })
            .await?;
        info!(
            target = "timberline::blog",
            category_id = %created.id,
            slug = %created.slug,
            "blog category created"
        );
        Ok(created)
    }

    pub async fn update_category(
        &self,
        id: Uuid,
        command: UpdateCategoryCommand,
    ) -> Result<BlogCategory, ServiceError> {
        let posts = self.posts.all().await?;
        let now = OffsetDateTime::now_utc();
        self.categories
            .mutate(|categories| {
                let index = categories
                    .iter()
                    .position(|category| category.id == id)
                    .ok_or_else(|| ServiceError::not_found("category"))?;
                let mut category = categories[index].clone();
                if let Some(name) = command.name {
                    category.name = name.trim().to_string();
                }
                if let Some(slug) = command.slug {
                    category.slug = slug.trim().to_string();
                }
                if let Some(description) = command.description {
                    category.description = non_empty(Some(description));
                }
                if let Some(color) = command.color {
                    category.color = color.trim().to_string();
                }
                if let Some(order) = command.order {
                    category.order = order;
                }
                category.updated_at = now;
                category.validate()?;
                ensure_unique(categories, &category, Some(id))?;

                categories[index] = category.clone();
                category.post_count = count_posts(&posts, id);
                Ok(category)
            })
            .await
    }

    /// Refused while any post, whatever its status, references the category.
    pub async fn delete_category(&self, id: Uuid) -> Result<(), ServiceError> {
        let posts = self.posts.all().await?;
        self.categories
            .mutate(|categories| {
                let index = categories
                    .iter()
                    .position(|category| category.id == id)
                    .ok_or_else(|| ServiceError::not_found("category"))?;
                let linked = count_posts(&posts, id);
                if linked > 0 {
                    return Err(ServiceError::conflict(format!(
                        "category is used by {linked} post(s)"
                    )));
                }
                categories.remove(index);
                Ok(())
            })
            .await?;
        info!(target = "timberline::blog", category_id = %id, "blog category deleted");
        Ok(())
    }

    async fn find_category<P>(&self, predicate: P) -> Result<BlogCategory, ServiceError>
    where
        P: Fn(&BlogCategory) -> bool,
    {
        let category = self
            .categories
            .all()
            .await?
            .iter()
            .find(|category| predicate(category))
            .cloned()
            .ok_or_else(|| ServiceError::not_found("category"))?;
        let posts = self.posts.all().await?;
        Ok(BlogCategory {
            post_count: count_posts(&posts, category.id),
            ..category
        })
    }
}

fn count_posts(posts: &[BlogPost], category_id: Uuid) -> u64 {
    posts
        .iter()
        .filter(|post| post.category_ids.contains(&category_id))
        .count() as u64
}

fn ensure_unique(
    categories: &[BlogCategory],
    candidate: &BlogCategory,
    except: Option<Uuid>,
) -> Result<(), ServiceError> {
    let clash = categories.iter().filter(|c| Some(c.id) != except).find(|c| {
        c.slug == candidate.slug || c.name.eq_ignore_ascii_case(&candidate.name)
    });
    match clash {
        Some(existing) if existing.slug == candidate.slug => Err(ServiceError::conflict(format!(
            "a category with slug `{}` already exists",
            candidate.slug
        ))),
        Some(_) => Err(ServiceError::conflict(format!(
            "a category named `{}` already exists",
            candidate.name
        ))),
        None => Ok(()),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
