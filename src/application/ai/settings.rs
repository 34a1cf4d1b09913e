use std::sync::Arc;

use serde::Deserialize;
use time::OffsetDateTime;
use tracing::info;

use crate::application::error::ServiceError;
use crate::application::store::{CachedCollection, CollectionStore, collections};
use crate::application::validation::Validate;
use crate::cache::CacheConfig;
use crate::domain::entities::{AiSettings, RateLimits};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAiSettingsCommand {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub rate_limits: Option<RateLimits>,
    pub cost_per_1k_tokens: Option<f64>,
}

/// Generation settings stored as a single-document collection, falling back
/// to configured defaults.
pub struct AiSettingsService {
    settings: CachedCollection<AiSettings>,
    defaults: AiSettings,
}

impl AiSettingsService {
    pub fn new(store: Arc<dyn CollectionStore>, cache: CacheConfig, defaults: AiSettings) -> Self {
        Self {
            settings: CachedCollection::new(store, collections::AI_SETTINGS, cache.ttl),
            defaults,
        }
    }

    pub async fn get(&self) -> Result<AiSettings, ServiceError> {
        let stored = self.settings.all().await?;
        Ok(stored.first().cloned().unwrap_or_else(|| self.defaults.clone()))
    }

    pub async fn update(&self, command: UpdateAiSettingsCommand) -> Result<AiSettings, ServiceError> {
        let mut settings = self.get().await?;
        if let Some(model) = command.model {
            settings.model = model.trim().to_string();
        }
        if let Some(temperature) = command.temperature {
            settings.temperature = temperature;
        }
        if let Some(max_tokens) = command.max_tokens {
            settings.max_tokens = max_tokens;
        }
        if let Some(limits) = command.rate_limits {
            settings.rate_limits = limits;
        }
        if let Some(cost) = command.cost_per_1k_tokens {
            settings.cost_per_1k_tokens = cost;
        }
        settings.validate()?;
        settings.updated_at = Some(OffsetDateTime::now_utc());

        let saved = self
            .settings
            .mutate(|items| {
                items.clear();
                items.push(settings.clone());
                Ok(settings)
            })
            .await?;

        info!(
            target = "timberline::ai",
            model = %saved.model,
            max_tokens = saved.max_tokens,
            per_minute = saved.rate_limits.per_minute,
            "ai settings updated"
        );
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::store::MemoryCollectionStore;

    fn defaults() -> AiSettings {
        AiSettings {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 1200,
            rate_limits: RateLimits::default(),
            cost_per_1k_tokens: 0.0006,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn defaults_until_updated() {
        let service = AiSettingsService::new(
            Arc::new(MemoryCollectionStore::new()),
            CacheConfig::default(),
            defaults(),
        );
        assert_eq!(service.get().await.unwrap(), defaults());

        let updated = service
            .update(UpdateAiSettingsCommand {
                temperature: Some(0.2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.temperature, 0.2);
        assert!(updated.updated_at.is_some());
        assert_eq!(service.get().await.unwrap(), updated);
    }

    #[tokio::test]
    async fn invalid_update_is_rejected_without_saving() {
        let service = AiSettingsService::new(
            Arc::new(MemoryCollectionStore::new()),
            CacheConfig::default(),
            defaults(),
        );
        let err = service
            .update(UpdateAiSettingsCommand {
                rate_limits: Some(RateLimits {
                    per_minute: 20,
                    per_hour: 10,
                    per_day: 100,
                }),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(service.get().await.unwrap(), defaults());
    }
}
