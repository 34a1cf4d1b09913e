use std::collections::HashSet;

use metrics::counter;
use serde::Deserialize;
use time::OffsetDateTime;
use time::serde::rfc3339;
use tracing::{info, warn};
use uuid::Uuid;

use super::BlogService;
use super::query::{PostPage, PostQuery, query_posts};
use crate::application::error::ServiceError;
use crate::application::seo::{generate_meta_description, generate_post_seo};
use crate::application::validation::Validate;
use crate::domain::content::{reading_time_minutes, table_of_contents};
use crate::domain::entities::{BlogPost, SocialShares};
use crate::domain::seo::SeoData;
use crate::domain::slug::generate_slug;
use crate::domain::types::{PostStatus, SocialPlatform};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostCommand {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    pub content: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub category_ids: Vec<Uuid>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: Option<PostStatus>,
    #[serde(default, with = "rfc3339::option")]
    pub scheduled_for: Option<OffsetDateTime>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub seo: Option<SeoData>,
}

/// Partial update; `None` leaves the field untouched. An empty `coverImage`
/// clears the image.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdatePostCommand {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub cover_image: Option<String>,
    pub category_ids: Option<Vec<Uuid>>,
    pub tags: Option<Vec<String>>,
    pub status: Option<PostStatus>,
    #[serde(with = "rfc3339::option")]
    pub scheduled_for: Option<OffsetDateTime>,
    pub featured: Option<bool>,
    pub seo: Option<SeoData>,
}

impl BlogService {
    pub async fn list_posts(&self, query: &PostQuery) -> Result<PostPage, ServiceError> {
        let posts = self.posts.all().await?;
        let categories = self.categories.all().await?;
        Ok(query_posts(&posts, &categories, query))
    }

    pub async fn get_post_by_id(&self, id: Uuid, increment_view: bool) -> Result<BlogPost, ServiceError> {
        let post = self
            .posts
            .all()
            .await?
            .iter()
            .find(|post| post.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("post"))?;
        Ok(self.maybe_count_view(post, increment_view).await)
    }

    pub async fn get_post_by_slug(
        &self,
        slug: &str,
        increment_view: bool,
    ) -> Result<BlogPost, ServiceError> {
        let post = self
            .posts
            .all()
            .await?
            .iter()
            .find(|post| post.slug == slug)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("post"))?;
        Ok(self.maybe_count_view(post, increment_view).await)
    }

    /// Storefront lookup: anything not published reads as missing, and a hit
    /// counts as a view.
    pub async fn get_published_post(&self, slug: &str) -> Result<BlogPost, ServiceError> {
        let post = self
            .posts
            .all()
            .await?
            .iter()
            .find(|post| post.slug == slug && post.status == PostStatus::Published)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("post"))?;
        Ok(self.maybe_count_view(post, true).await)
    }

    pub async fn create_post(
        &self,
        command: CreatePostCommand,
        author_id: &str,
    ) -> Result<BlogPost, ServiceError> {
        let status = command.status.unwrap_or_default();
        if !PostStatus::Draft.can_transition_to(status) {
            return Err(ServiceError::validation(format!(
                "status: a new post cannot start as {}",
                status.as_str()
            )));
        }

        let now = OffsetDateTime::now_utc();
        let slug = match command.slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => slug.to_string(),
            _ => generate_slug(&command.title)
                .map_err(|err| ServiceError::validation(format!("slug: {err}")))?,
        };
        if status == PostStatus::Scheduled {
            ensure_future(command.scheduled_for, now)?;
        }
        self.ensure_categories_exist(&command.category_ids).await?;

        let content = command.content;
        let summary = command
            .summary
            .map(|summary| summary.trim().to_string())
            .filter(|summary| !summary.is_empty())
            .unwrap_or_else(|| generate_meta_description(&content));
        let mut post = BlogPost {
            id: Uuid::new_v4(),
            title: command.title.trim().to_string(),
            slug,
            summary,
            reading_time: reading_time_minutes(&content),
            table_of_contents: table_of_contents(&content),
            content,
            cover_image: command.cover_image.filter(|cover| !cover.trim().is_empty()),
            author_id: author_id.to_string(),
            category_ids: dedup(command.category_ids),
            tags: normalize_tags(command.tags),
            status,
            published_at: (status == PostStatus::Published).then_some(now),
            scheduled_for: if status == PostStatus::Scheduled {
                command.scheduled_for
            } else {
                None
            },
            view_count: 0,
            social_shares: SocialShares::default(),
            seo: SeoData::default(),
            featured: command.featured,
            created_at: now,
            updated_at: now,
        };
        post.seo = merge_seo(command.seo.unwrap_or_default(), generate_post_seo(&post, &self.site));
        post.validate()?;

        let created = self
            .posts
            .mutate(|posts| {
                ensure_unique_slug(posts, &post.slug, None)?;
                posts.push(post.clone());
                Ok(post)
            })
            .await?;

        info!(
            target = "timberline::blog",
            post_id = %created.id,
            slug = %created.slug,
            status = created.status.as_str(),
            "blog post created"
        );
        Ok(created)
    }

    pub async fn update_post(
        &self,
        id: Uuid,
        command: UpdatePostCommand,
    ) -> Result<BlogPost, ServiceError> {
        if let Some(ids) = &command.category_ids {
            self.ensure_categories_exist(ids).await?;
        }
        let site = &self.site;
        let now = OffsetDateTime::now_utc();

        let updated = self
            .posts
            .mutate(|posts| {
                let index = position(posts, id)?;
                let mut post = posts[index].clone();

                if let Some(title) = command.title {
                    post.title = title.trim().to_string();
                }
                if let Some(slug) = command.slug {
                    let slug = slug.trim().to_string();
                    if slug != post.slug {
                        ensure_unique_slug(posts, &slug, Some(id))?;
                        post.slug = slug;
                    }
                }
                if let Some(content) = command.content
                    && content != post.content
                {
                    post.reading_time = reading_time_minutes(&content);
                    post.table_of_contents = table_of_contents(&content);
                    post.content = content;
                }
                if let Some(summary) = command.summary {
                    post.summary = summary.trim().to_string();
                }
                if post.summary.is_empty() {
                    post.summary = generate_meta_description(&post.content);
                }
                if let Some(cover) = command.cover_image {
                    post.cover_image = Some(cover).filter(|cover| !cover.trim().is_empty());
                }
                if let Some(ids) = command.category_ids {
                    post.category_ids = dedup(ids);
                }
                if let Some(tags) = command.tags {
                    post.tags = normalize_tags(tags);
                }
                if let Some(featured) = command.featured {
                    post.featured = featured;
                }
                if let Some(when) = command.scheduled_for {
                    post.scheduled_for = Some(when);
                }
                if let Some(status) = command.status {
                    apply_status(&mut post, status, now)?;
                }

                post.updated_at = now;
                let existing = std::mem::take(&mut post.seo);
                post.seo = merge_seo(command.seo.unwrap_or(existing), generate_post_seo(&post, site));
                post.validate()?;

                posts[index] = post.clone();
                Ok(post)
            })
            .await?;

        info!(
            target = "timberline::blog",
            post_id = %updated.id,
            status = updated.status.as_str(),
            "blog post updated"
        );
        Ok(updated)
    }

    /// Publish now. An existing `publishedAt` is kept so re-publishing does
    /// not move the post in date order.
    pub async fn publish_post(&self, id: Uuid) -> Result<BlogPost, ServiceError> {
        self.transition(id, PostStatus::Published).await
    }

    pub async fn unpublish_post(&self, id: Uuid) -> Result<BlogPost, ServiceError> {
        self.transition(id, PostStatus::Unpublished).await
    }

    pub async fn schedule_post(
        &self,
        id: Uuid,
        when: OffsetDateTime,
    ) -> Result<BlogPost, ServiceError> {
        let now = OffsetDateTime::now_utc();
        ensure_future(Some(when), now)?;
        self.posts
            .mutate(|posts| {
                let index = position(posts, id)?;
                let post = &mut posts[index];
                post.scheduled_for = Some(when);
                apply_status(post, PostStatus::Scheduled, now)?;
                post.updated_at = now;
                Ok(post.clone())
            })
            .await
    }

    /// Soft delete: the row stays and its status becomes `unpublished`
    /// regardless of the current status.
    pub async fn delete_post(&self, id: Uuid) -> Result<(), ServiceError> {
        let now = OffsetDateTime::now_utc();
        self.posts
            .mutate(|posts| {
                let index = position(posts, id)?;
                let post = &mut posts[index];
                post.status = PostStatus::Unpublished;
                post.published_at = None;
                post.scheduled_for = None;
                post.updated_at = now;
                Ok(())
            })
            .await?;
        info!(target = "timberline::blog", post_id = %id, "blog post unpublished by delete");
        Ok(())
    }

    /// Count a share. A missing post is reported; a failed write is not.
    pub async fn record_social_share(
        &self,
        id: Uuid,
        platform: SocialPlatform,
    ) -> Result<(), ServiceError> {
        if !self.posts.all().await?.iter().any(|post| post.id == id) {
            return Err(ServiceError::not_found("post"));
        }
        let result = self
            .posts
            .mutate(|posts| {
                if let Some(post) = posts.iter_mut().find(|post| post.id == id) {
                    post.social_shares.increment(platform);
                }
                Ok(())
            })
            .await;
        if let Err(err) = result {
            side_effect_failed("social_share", id, &err);
        }
        Ok(())
    }

    /// Publish every scheduled post whose time has come. `publishedAt` is set
    /// to the scheduled time. Returns the published slugs.
    pub async fn publish_due(&self, now: OffsetDateTime) -> Result<Vec<String>, ServiceError> {
        let any_due = self.posts.all().await?.iter().any(|post| is_due(post, now));
        if !any_due {
            return Ok(Vec::new());
        }

        let published = self
            .posts
            .mutate(|posts| {
                let mut slugs = Vec::new();
                for post in posts.iter_mut().filter(|post| is_due(post, now)) {
                    post.status = PostStatus::Published;
                    post.published_at = post.scheduled_for.take().or(Some(now));
                    post.updated_at = now;
                    slugs.push(post.slug.clone());
                }
                Ok(slugs)
            })
            .await?;

        for slug in &published {
            info!(target = "timberline::blog", slug = %slug, "scheduled post published");
        }
        Ok(published)
    }

    async fn transition(&self, id: Uuid, status: PostStatus) -> Result<BlogPost, ServiceError> {
        let now = OffsetDateTime::now_utc();
        let post = self
            .posts
            .mutate(|posts| {
                let index = position(posts, id)?;
                let post = &mut posts[index];
                apply_status(post, status, now)?;
                post.updated_at = now;
                Ok(post.clone())
            })
            .await?;
        info!(
            target = "timberline::blog",
            post_id = %id,
            status = status.as_str(),
            "blog post status changed"
        );
        Ok(post)
    }

    async fn maybe_count_view(&self, mut post: BlogPost, increment_view: bool) -> BlogPost {
        if !increment_view {
            return post;
        }
        let id = post.id;
        let result = self
            .posts
            .mutate(|posts| {
                Ok(posts.iter_mut().find(|stored| stored.id == id).map(|stored| {
                    stored.view_count = stored.view_count.saturating_add(1);
                    stored.view_count
                }))
            })
            .await;
        match result {
            Ok(Some(count)) => post.view_count = count,
            Ok(None) => {}
            Err(err) => side_effect_failed("view_count", id, &err),
        }
        post
    }

    async fn ensure_categories_exist(&self, ids: &[Uuid]) -> Result<(), ServiceError> {
        if ids.is_empty() {
            return Ok(());
        }
        let categories = self.categories.all().await?;
        let unknown: Vec<String> = ids
            .iter()
            .filter(|id| !categories.iter().any(|category| category.id == **id))
            .map(Uuid::to_string)
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::validation(format!(
                "categoryIds: unknown category {}",
                unknown.join(", ")
            )))
        }
    }
}

/// Move `post` into `next`, maintaining the timestamps each status implies.
fn apply_status(post: &mut BlogPost, next: PostStatus, now: OffsetDateTime) -> Result<(), ServiceError> {
    if !post.status.can_transition_to(next) {
        return Err(ServiceError::validation(format!(
            "status: cannot move from {} to {}",
            post.status.as_str(),
            next.as_str()
        )));
    }
    match next {
        PostStatus::Published => {
            post.published_at.get_or_insert(now);
            post.scheduled_for = None;
        }
        PostStatus::Scheduled => ensure_future(post.scheduled_for, now)?,
        PostStatus::Unpublished => {
            post.published_at = None;
            post.scheduled_for = None;
        }
        PostStatus::Draft => post.scheduled_for = None,
    }
    post.status = next;
    Ok(())
}

fn ensure_future(when: Option<OffsetDateTime>, now: OffsetDateTime) -> Result<(), ServiceError> {
    match when {
        Some(when) if when > now => Ok(()),
        Some(_) => Err(ServiceError::validation("scheduledFor: must be in the future")),
        None => Err(ServiceError::validation(
            "scheduledFor: is required when status is scheduled",
        )),
    }
}

fn is_due(post: &BlogPost, now: OffsetDateTime) -> bool {
    post.status == PostStatus::Scheduled && post.scheduled_for.is_some_and(|when| when <= now)
}

fn position(posts: &[BlogPost], id: Uuid) -> Result<usize, ServiceError> {
    posts
        .iter()
        .position(|post| post.id == id)
        .ok_or_else(|| ServiceError::not_found("post"))
}

fn ensure_unique_slug(posts: &[BlogPost], slug: &str, except: Option<Uuid>) -> Result<(), ServiceError> {
    if posts
        .iter()
        .any(|post| post.slug == slug && Some(post.id) != except)
    {
        return Err(ServiceError::conflict(format!(
            "a post with slug `{slug}` already exists"
        )));
    }
    Ok(())
}

/// Caller-supplied SEO fields win; empty ones are filled from `generated`.
/// Canonical URL and structured data always follow the current post.
fn merge_seo(supplied: SeoData, generated: SeoData) -> SeoData {
    fn pick(supplied: Option<String>, generated: Option<String>) -> Option<String> {
        supplied.filter(|value| !value.trim().is_empty()).or(generated)
    }

    SeoData {
        meta_title: if supplied.meta_title.trim().is_empty() {
            generated.meta_title
        } else {
            supplied.meta_title
        },
        meta_description: if supplied.meta_description.trim().is_empty() {
            generated.meta_description
        } else {
            supplied.meta_description
        },
        keywords: if supplied.keywords.is_empty() {
            generated.keywords
        } else {
            supplied.keywords
        },
        canonical_url: generated.canonical_url,
        og_title: pick(supplied.og_title, generated.og_title),
        og_description: pick(supplied.og_description, generated.og_description),
        og_image: pick(supplied.og_image, generated.og_image),
        structured_data: generated.structured_data,
        no_index: supplied.no_index,
    }
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty() && seen.insert(tag.to_lowercase()))
        .collect()
}

fn dedup(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

fn side_effect_failed(effect: &'static str, post_id: Uuid, err: &ServiceError) {
    counter!("timberline_side_effect_failure_total", "effect" => effect).increment(1);
    warn!(
        target = "timberline::blog",
        effect,
        post_id = %post_id,
        error = %err,
        "post statistic update failed"
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::application::blog::CreateCategoryCommand;
    use crate::application::seo::SiteProfile;
    use crate::application::store::{CollectionStore, StoreError, collections};
    use crate::cache::CacheConfig;
    use crate::infra::store::MemoryCollectionStore;
    use async_trait::async_trait;
    use serde_json::Value;
    use time::Duration;
    use url::Url;

    fn site() -> SiteProfile {
        SiteProfile {
            name: "Timberline".to_string(),
            base_url: Url::parse("https://timber.example").unwrap(),
        }
    }

    fn service() -> BlogService {
        BlogService::new(Arc::new(MemoryCollectionStore::new()), CacheConfig::default(), site())
    }

    fn draft(title: &str) -> CreatePostCommand {
        CreatePostCommand {
            title: title.to_string(),
            content: format!("# Intro\n\nNotes on {title} for the workshop."),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_derives_slug_summary_and_toc() {
        let blog = service();
        let post = blog.create_post(draft("Teak Care 101"), "admin").await.unwrap();

        assert_eq!(post.slug, "teak-care-101");
        assert_eq!(post.status, PostStatus::Draft);
        assert!(post.published_at.is_none());
        assert_eq!(post.reading_time, 1);
        assert_eq!(post.table_of_contents.len(), 1);
        assert_eq!(post.table_of_contents[0].text, "Intro");
        assert!(post.summary.contains("Notes on Teak Care 101"));
        assert_eq!(
            post.seo.canonical_url.as_deref(),
            Some("https://timber.example/blog/teak-care-101")
        );
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_conflict() {
        let blog = service();
        blog.create_post(draft("Oiling Decks"), "admin").await.unwrap();
        let err = blog
            .create_post(
                CreatePostCommand {
                    content: "Different body".to_string(),
                    ..draft("Oiling decks")
                },
                "editor",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict { .. }));
    }

    #[tokio::test]
    async fn unknown_category_is_rejected() {
        let blog = service();
        let err = blog
            .create_post(
                CreatePostCommand {
                    category_ids: vec![Uuid::new_v4()],
                    ..draft("Jarrah")
                },
                "admin",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn publish_then_unpublish_manages_timestamps() {
        let blog = service();
        let post = blog.create_post(draft("Spotted Gum"), "admin").await.unwrap();

        let published = blog.publish_post(post.id).await.unwrap();
        assert_eq!(published.status, PostStatus::Published);
        let first_published = published.published_at.unwrap();

        let unpublished = blog.unpublish_post(post.id).await.unwrap();
        assert_eq!(unpublished.status, PostStatus::Unpublished);
        assert!(unpublished.published_at.is_none());
        assert!(unpublished.scheduled_for.is_none());

        let republished = blog.publish_post(post.id).await.unwrap();
        assert!(republished.published_at.unwrap() >= first_published);
    }

    #[tokio::test]
    async fn invalid_transition_is_rejected() {
        let blog = service();
        let post = blog.create_post(draft("Blackbutt"), "admin").await.unwrap();
        let err = blog
            .update_post(
                post.id,
                UpdatePostCommand {
                    status: Some(PostStatus::Unpublished),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn update_rederives_content_fields_and_checks_slug() {
        let blog = service();
        blog.create_post(draft("Merbau"), "admin").await.unwrap();
        let post = blog.create_post(draft("Cypress"), "admin").await.unwrap();

        let updated = blog
            .update_post(
                post.id,
                UpdatePostCommand {
                    content: Some("# One\n\n## Two\n\n### Three\n\n#### Four".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.table_of_contents.len(), 3);

        let err = blog
            .update_post(
                post.id,
                UpdatePostCommand {
                    slug: Some("merbau".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict { .. }));
    }

    #[tokio::test]
    async fn delete_is_soft() {
        let blog = service();
        let post = blog.create_post(draft("Ironbark"), "admin").await.unwrap();
        blog.publish_post(post.id).await.unwrap();
        blog.delete_post(post.id).await.unwrap();

        let page = blog.list_posts(&PostQuery::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.posts[0].status, PostStatus::Unpublished);
    }

    #[tokio::test]
    async fn views_and_shares_are_counted() {
        let blog = service();
        let post = blog.create_post(draft("Tallowwood"), "admin").await.unwrap();

        blog.get_post_by_slug("tallowwood", true).await.unwrap();
        let viewed = blog.get_post_by_id(post.id, true).await.unwrap();
        assert_eq!(viewed.view_count, 2);
        assert_eq!(blog.get_post_by_id(post.id, false).await.unwrap().view_count, 2);

        blog.record_social_share(post.id, SocialPlatform::Pinterest)
            .await
            .unwrap();
        let shared = blog.get_post_by_id(post.id, false).await.unwrap();
        assert_eq!(shared.social_shares.pinterest, 1);

        let missing = blog
            .record_social_share(Uuid::new_v4(), SocialPlatform::Email)
            .await;
        assert!(matches!(missing, Err(ServiceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn schedule_requires_future_and_publish_due_flips_status() {
        let blog = service();
        let post = blog.create_post(draft("Silvertop Ash"), "admin").await.unwrap();

        let past = OffsetDateTime::now_utc() - Duration::hours(1);
        assert!(blog.schedule_post(post.id, past).await.is_err());

        let when = OffsetDateTime::now_utc() + Duration::hours(1);
        let scheduled = blog.schedule_post(post.id, when).await.unwrap();
        assert_eq!(scheduled.status, PostStatus::Scheduled);

        assert!(blog.publish_due(OffsetDateTime::now_utc()).await.unwrap().is_empty());
        let published = blog.publish_due(when + Duration::minutes(1)).await.unwrap();
        assert_eq!(published, vec!["silvertop-ash".to_string()]);

        let post = blog.get_post_by_id(post.id, false).await.unwrap();
        assert_eq!(post.status, PostStatus::Published);
        assert_eq!(post.published_at, Some(when));
        assert!(post.scheduled_for.is_none());
    }

    #[tokio::test]
    async fn end_to_end_category_and_post_flow() {
        let blog = service();
        let category = blog
            .create_category(CreateCategoryCommand {
                name: "Timber Tips".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(category.slug, "timber-tips");

        let post = blog
            .create_post(
                CreatePostCommand {
                    title: "Teak Care 101".to_string(),
                    content: "# Intro\n\nOil twice a year.".to_string(),
                    category_ids: vec![category.id],
                    ..Default::default()
                },
                "admin",
            )
            .await
            .unwrap();
        assert_eq!(post.slug, "teak-care-101");
        blog.publish_post(post.id).await.unwrap();

        let page = blog
            .list_posts(&PostQuery {
                status: Some(PostStatus::Published),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.posts.len(), 1);
        assert_eq!(page.posts[0].id, post.id);

        let categories = blog.get_categories(false).await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].post_count, 1);
    }

    struct ReadOnlyStore(MemoryCollectionStore);

    #[async_trait]
    impl CollectionStore for ReadOnlyStore {
        async fn load(&self, name: &str) -> Result<Option<Vec<Value>>, StoreError> {
            self.0.load(name).await
        }

        async fn save(&self, name: &str, items: Vec<Value>) -> Result<(), StoreError> {
            if name == collections::BLOG_POSTS && !items.is_empty() {
                return Err(StoreError::Transport("read only".to_string()));
            }
            self.0.save(name, items).await
        }
    }

    #[tokio::test]
    async fn failed_view_increment_does_not_fail_the_read() {
        let writable = MemoryCollectionStore::new();
        let seeded = BlogService::new(Arc::new(writable.clone()), CacheConfig::default(), site());
        let post = seeded.create_post(draft("Blackwood"), "admin").await.unwrap();

        let blog = BlogService::new(
            Arc::new(ReadOnlyStore(writable)),
            CacheConfig::default(),
            site(),
        );
        let read = blog.get_post_by_id(post.id, true).await.unwrap();
        assert_eq!(read.view_count, 0);
        assert!(
            blog.record_social_share(post.id, SocialPlatform::Email)
                .await
                .is_ok()
        );
    }
}
