//! Cron-driven publication of scheduled blog posts.

use std::str::FromStr;
use std::sync::Arc;

use apalis::prelude::*;
use chrono::{DateTime, Utc};
use cron::Schedule;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::application::blog::BlogService;
use crate::application::error::ServiceError;

/// Every minute, at second zero.
pub const DEFAULT_PUBLISH_SCHEDULE: &str = "0 * * * * *";

/// Marker job for one cron tick. The cron stream builds it with `Default`,
/// so it carries no firing time; the handler reads the clock itself.
#[derive(Debug, Clone, Default)]
pub struct PublishDueJob;

impl From<DateTime<Utc>> for PublishDueJob {
    fn from(_: DateTime<Utc>) -> Self {
        Self
    }
}

#[derive(Clone)]
pub struct ScheduledPublisher {
    blog: Arc<BlogService>,
}

impl ScheduledPublisher {
    pub fn new(blog: Arc<BlogService>) -> Self {
        Self { blog }
    }

    /// Publish every scheduled post due at `now`; returns their slugs.
    pub async fn publish_due(&self, now: OffsetDateTime) -> Result<Vec<String>, ServiceError> {
        self.blog.publish_due(now).await
    }
}

pub fn publish_schedule(expression: &str) -> Result<Schedule, cron::error::Error> {
    Schedule::from_str(expression)
}

/// Worker entry point. Failures are logged and the next tick retries.
pub async fn process_publish_due_job(
    _job: PublishDueJob,
    publisher: Data<ScheduledPublisher>,
) -> Result<(), apalis::prelude::Error> {
    match publisher.publish_due(OffsetDateTime::now_utc()).await {
        Ok(slugs) if !slugs.is_empty() => {
            info!(
                target = "timberline::scheduler",
                published = slugs.len(),
                slugs = ?slugs,
                "scheduled posts published"
            );
        }
        Ok(_) => {}
        Err(err) => {
            warn!(
                target = "timberline::scheduler",
                error = %err,
                "scheduled publication tick failed"
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::blog::CreatePostCommand;
    use crate::application::seo::SiteProfile;
    use crate::cache::CacheConfig;
    use crate::domain::types::PostStatus;
    use crate::infra::store::MemoryCollectionStore;
    use url::Url;

    #[test]
    fn default_schedule_fires_every_minute() {
        let schedule = publish_schedule(DEFAULT_PUBLISH_SCHEDULE).unwrap();
        let upcoming: Vec<_> = schedule.upcoming(Utc).take(2).collect();
        assert_eq!((upcoming[1] - upcoming[0]).num_seconds(), 60);
        assert!(publish_schedule("every minute").is_err());
    }

    #[tokio::test]
    async fn tick_publishes_due_posts() {
        let blog = Arc::new(BlogService::new(
            Arc::new(MemoryCollectionStore::new()),
            CacheConfig::default(),
            SiteProfile {
                name: "Timberline".to_string(),
                base_url: Url::parse("https://timber.example").unwrap(),
            },
        ));
        let when = OffsetDateTime::now_utc() + time::Duration::seconds(1);
        blog.create_post(
            CreatePostCommand {
                title: "Autumn oiling".to_string(),
                content: "Oil decks before the rain.".to_string(),
                status: Some(PostStatus::Scheduled),
                scheduled_for: Some(when),
                ..Default::default()
            },
            "admin",
        )
        .await
        .unwrap();

        let publisher = ScheduledPublisher::new(blog.clone());
        process_publish_due_job(PublishDueJob::default(), Data::new(publisher.clone()))
            .await
            .unwrap();
        let early = blog.get_post_by_slug("autumn-oiling", false).await.unwrap();
        assert_eq!(early.status, PostStatus::Scheduled);

        tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
        process_publish_due_job(PublishDueJob::default(), Data::new(publisher))
            .await
            .unwrap();

        let post = blog.get_post_by_slug("autumn-oiling", false).await.unwrap();
        assert_eq!(post.status, PostStatus::Published);
    }
}
