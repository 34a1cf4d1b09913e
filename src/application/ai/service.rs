use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use metrics::counter;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::generator::{ContentGenerator, GenerationRequest, GeneratorError};
use super::rate_limit::{check_rate_limit, estimate_tokens};
use super::settings::AiSettingsService;
use super::templates::{PromptTemplateService, fill_template};
use crate::application::error::ServiceError;
use crate::application::seo::{generate_meta_description, generate_meta_title, normalize_keywords};
use crate::application::store::{CachedCollection, CollectionStore, collections};
use crate::application::validation::Validator;
use crate::cache::CacheConfig;
use crate::domain::entities::{AiContentRequest, AiRequestMetadata};
use crate::domain::types::{AiContentType, AiRequestStatus};

const MAX_LISTED_REQUESTS: usize = 100;
pub const MAX_IMAGE_PROMPTS: usize = 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentCommand {
    pub description: String,
    pub content_type: AiContentType,
    #[serde(default)]
    pub template_id: Option<Uuid>,
    /// Ad-hoc prompt text; may contain placeholders like a template.
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoCopy {
    pub meta_title: String,
    pub meta_description: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub total_requests: usize,
    pub completed: usize,
    pub failed: usize,
    pub in_progress: usize,
    pub requests_last_24h: usize,
    pub total_tokens: u64,
    pub total_cost: f64,
}

/// Template-driven generation with an auditable request log.
pub struct AiContentService {
    requests: CachedCollection<AiContentRequest>,
    templates: Arc<PromptTemplateService>,
    settings: Arc<AiSettingsService>,
    generator: Arc<dyn ContentGenerator>,
    system_prompt: String,
}

impl AiContentService {
    pub fn new(
        store: Arc<dyn CollectionStore>,
        cache: CacheConfig,
        templates: Arc<PromptTemplateService>,
        settings: Arc<AiSettingsService>,
        generator: Arc<dyn ContentGenerator>,
        site_name: &str,
    ) -> Self {
        Self {
            requests: CachedCollection::new(store, collections::AI_REQUESTS, cache.ttl),
            templates,
            settings,
            generator,
            system_prompt: format!(
                "You write clear, accurate copy for {site_name}, a supplier of timber and \
                 wood products. Never invent certifications, prices, or legal guarantees."
            ),
        }
    }

    pub fn generator_name(&self) -> &'static str {
        self.generator.name()
    }

    /// Run one generation. The request is logged as `generating` before the
    /// provider is called and finalized as `completed` or `error` afterwards.
    pub async fn generate_content(
        &self,
        command: GenerateContentCommand,
        user_id: &str,
    ) -> Result<AiContentRequest, ServiceError> {
        validate_command(&command, user_id)?;
        let settings = self.settings.get().await?;
        let (template_id, template_text) = self.resolve_template(&command).await?;
        let now = OffsetDateTime::now_utc();

        let record = self
            .requests
            .mutate(|log| {
                check_rate_limit(log, user_id, settings.rate_limits, now).map_err(|exceeded| {
                    ServiceError::RateLimited {
                        window: exceeded.window,
                        limit: exceeded.limit,
                        retry_after_secs: exceeded.retry_after_secs,
                    }
                })?;
                let prompt = fill_template(&template_text, &command.variables).map_err(|missing| {
                    ServiceError::validation(format!(
                        "variables: missing value for {}",
                        missing.join(", ")
                    ))
                })?;
                let record = AiContentRequest {
                    id: Uuid::new_v4(),
                    description: command.description.trim().to_string(),
                    content_type: command.content_type,
                    template_id,
                    prompt,
                    generated_content: None,
                    status: AiRequestStatus::Generating,
                    error: None,
                    metadata: AiRequestMetadata {
                        model: settings.model.clone(),
                        ..AiRequestMetadata::default()
                    },
                    user_id: user_id.to_string(),
                    created_at: now,
                    completed_at: None,
                };
                log.push(record.clone());
                Ok(record)
            })
            .await
            .inspect_err(|err| {
                if let ServiceError::RateLimited { window, limit, .. } = err {
                    warn!(
                        target = "timberline::ai",
                        user_id,
                        window = *window,
                        limit = *limit,
                        "generation rejected by rate limit"
                    );
                }
            })?;

        let request = GenerationRequest {
            system: Some(self.system_prompt.clone()),
            prompt: record.prompt.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        };
        let started = Instant::now();
        let outcome = self.generator.generate(&request).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok(generated) => {
                let tokens = generated
                    .tokens_used
                    .unwrap_or_else(|| estimate_tokens(&generated.text));
                let cost = f64::from(tokens) / 1000.0 * settings.cost_per_1k_tokens;
                let completed = self
                    .finalize(record.id, |entry| {
                        entry.status = AiRequestStatus::Completed;
                        entry.generated_content = Some(generated.text);
                        entry.metadata = AiRequestMetadata {
                            model: generated.model,
                            tokens_used: tokens,
                            generation_time_ms: elapsed_ms,
                            cost,
                        };
                    })
                    .await?;

                counter!("timberline_ai_generation_total", "status" => "completed").increment(1);
                counter!("timberline_ai_tokens_total").increment(u64::from(tokens));
                info!(
                    target = "timberline::ai",
                    request_id = %completed.id,
                    content_type = completed.content_type.as_str(),
                    tokens,
                    elapsed_ms,
                    "content generated"
                );
                if let Some(id) = template_id {
                    self.templates.record_usage(id).await;
                }
                Ok(completed)
            }
            Err(err) => {
                counter!("timberline_ai_generation_total", "status" => "error").increment(1);
                let message = err.to_string();
                if let Err(persist_err) = self
                    .finalize(record.id, |entry| {
                        entry.status = AiRequestStatus::Error;
                        entry.error = Some(message);
                        entry.metadata.generation_time_ms = elapsed_ms;
                    })
                    .await
                {
                    error!(
                        target = "timberline::ai",
                        request_id = %record.id,
                        error = %persist_err,
                        "failed to mark generation request as errored"
                    );
                }
                warn!(
                    target = "timberline::ai",
                    request_id = %record.id,
                    generator = self.generator.name(),
                    error = %err,
                    "content generation failed"
                );
                Err(ServiceError::Generator(err))
            }
        }
    }

    /// Prompts for product or blog imagery. Model output that is not a JSON
    /// array is split into lines instead.
    pub async fn generate_image_prompts(
        &self,
        description: &str,
        count: usize,
        user_id: &str,
    ) -> Result<Vec<String>, ServiceError> {
        if !(1..=MAX_IMAGE_PROMPTS).contains(&count) {
            return Err(ServiceError::validation(format!(
                "count: must be between 1 and {MAX_IMAGE_PROMPTS}"
            )));
        }
        let command = GenerateContentCommand {
            description: summary_label("Image prompts", description),
            content_type: AiContentType::ImagePrompt,
            template_id: None,
            prompt: None,
            variables: BTreeMap::from([
                ("description".to_string(), description.trim().to_string()),
                ("count".to_string(), count.to_string()),
            ]),
        };
        let record = self.generate_content(command, user_id).await?;
        Ok(parse_prompt_list(
            record.generated_content.as_deref().unwrap_or_default(),
            count,
        ))
    }

    /// Title, description, and keywords clamped to search-engine limits.
    pub async fn generate_seo_copy(
        &self,
        subject: &str,
        context: Option<&str>,
        user_id: &str,
    ) -> Result<SeoCopy, ServiceError> {
        let command = GenerateContentCommand {
            description: summary_label("SEO copy", subject),
            content_type: AiContentType::SeoCopy,
            template_id: None,
            prompt: None,
            variables: BTreeMap::from([
                ("subject".to_string(), subject.trim().to_string()),
                (
                    "context".to_string(),
                    context.unwrap_or("none provided").trim().to_string(),
                ),
            ]),
        };
        let record = self.generate_content(command, user_id).await?;
        let copy = parse_seo_copy(record.generated_content.as_deref().unwrap_or_default())?;
        Ok(copy)
    }

    pub async fn list_requests(
        &self,
        user_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<AiContentRequest>, ServiceError> {
        let log = self.requests.all().await?;
        let mut requests: Vec<AiContentRequest> = log
            .iter()
            .filter(|request| user_id.is_none_or(|user| request.user_id == user))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        requests.truncate(limit.clamp(1, MAX_LISTED_REQUESTS));
        Ok(requests)
    }

    pub async fn get_request(&self, id: Uuid) -> Result<AiContentRequest, ServiceError> {
        let log = self.requests.all().await?;
        log.iter()
            .find(|request| request.id == id)
            .cloned()
            .ok_or(ServiceError::not_found("generation request"))
    }

    pub async fn usage_summary(&self, user_id: Option<&str>) -> Result<UsageSummary, ServiceError> {
        let log = self.requests.all().await?;
        let since = OffsetDateTime::now_utc() - Duration::days(1);
        let mut summary = UsageSummary {
            total_requests: 0,
            completed: 0,
            failed: 0,
            in_progress: 0,
            requests_last_24h: 0,
            total_tokens: 0,
            total_cost: 0.0,
        };
        for request in log
            .iter()
            .filter(|request| user_id.is_none_or(|user| request.user_id == user))
        {
            summary.total_requests += 1;
            match request.status {
                AiRequestStatus::Completed => summary.completed += 1,
                AiRequestStatus::Error => summary.failed += 1,
                AiRequestStatus::Generating => summary.in_progress += 1,
            }
            if request.created_at > since {
                summary.requests_last_24h += 1;
            }
            summary.total_tokens += u64::from(request.metadata.tokens_used);
            summary.total_cost += request.metadata.cost;
        }
        Ok(summary)
    }

    async fn resolve_template(
        &self,
        command: &GenerateContentCommand,
    ) -> Result<(Option<Uuid>, String), ServiceError> {
        if let Some(id) = command.template_id {
            let template = self.templates.get(id).await?;
            if !template.is_active {
                return Err(ServiceError::validation(format!(
                    "templateId: template `{}` is inactive",
                    template.name
                )));
            }
            return Ok((Some(template.id), template.template));
        }
        if let Some(prompt) = &command.prompt {
            return Ok((None, prompt.clone()));
        }
        match self.templates.default_for(command.content_type).await? {
            Some(template) => Ok((Some(template.id), template.template)),
            None => Err(ServiceError::validation(format!(
                "prompt: is required when no template exists for {}",
                command.content_type.as_str()
            ))),
        }
    }

    async fn finalize(
        &self,
        id: Uuid,
        apply: impl FnOnce(&mut AiContentRequest),
    ) -> Result<AiContentRequest, ServiceError> {
        self.requests
            .mutate(|log| {
                let entry = log
                    .iter_mut()
                    .find(|request| request.id == id)
                    .ok_or(ServiceError::not_found("generation request"))?;
                apply(entry);
                entry.completed_at = Some(OffsetDateTime::now_utc());
                Ok(entry.clone())
            })
            .await
    }
}

fn validate_command(command: &GenerateContentCommand, user_id: &str) -> Result<(), ServiceError> {
    let mut v = Validator::new();
    v.length("description", &command.description, 3, 500)
        .required("userId", user_id);
    if let Some(prompt) = &command.prompt {
        v.length("prompt", prompt, 10, 10_000);
    }
    for (name, value) in &command.variables {
        v.max_len(&format!("variables.{name}"), value, 5000);
    }
    v.finish().map_err(ServiceError::from)
}

fn summary_label(kind: &str, subject: &str) -> String {
    let subject: String = subject.trim().chars().take(400).collect();
    format!("{kind}: {subject}")
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = body.split_once('\n').map_or("", |(_, rest)| rest);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// JSON array of strings, else one prompt per non-empty line with list
/// markers removed.
pub fn parse_prompt_list(text: &str, count: usize) -> Vec<String> {
    let body = strip_code_fence(text);
    if let Ok(items) = serde_json::from_str::<Vec<String>>(body) {
        return items
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .take(count)
            .collect();
    }

    body.lines()
        .map(strip_list_marker)
        .map(|line| line.trim_matches(|ch: char| ch == '"' || ch == '\'').trim())
        .filter(|line| !line.is_empty() && *line != "[" && *line != "]")
        .map(str::to_string)
        .take(count)
        .collect()
}

fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();
    for bullet in ["- ", "* ", "• "] {
        if let Some(rest) = line.strip_prefix(bullet) {
            return rest.trim();
        }
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return rest.trim();
        }
    }
    line
}

pub fn parse_seo_copy(text: &str) -> Result<SeoCopy, GeneratorError> {
    let body = strip_code_fence(text);
    let json = match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => {
            return Err(GeneratorError::MalformedResponse(
                "seo copy response contained no JSON object".to_string(),
            ));
        }
    };
    let raw: SeoCopy = serde_json::from_str(json)
        .map_err(|err| GeneratorError::MalformedResponse(format!("seo copy: {err}")))?;

    Ok(SeoCopy {
        meta_title: generate_meta_title(&raw.meta_title, None),
        meta_description: generate_meta_description(&raw.meta_description),
        keywords: normalize_keywords(raw.keywords),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_list_prefers_json() {
        let text = "```json\n[\"Oiled jarrah deck at dusk\", \" \", \"Close-up of grain\"]\n```";
        assert_eq!(
            parse_prompt_list(text, 5),
            vec!["Oiled jarrah deck at dusk", "Close-up of grain"]
        );
    }

    #[test]
    fn prompt_list_falls_back_to_lines() {
        let text = "Here you go:\n1. Oiled jarrah deck at dusk\n2) \"Close-up of grain\"\n- Stacked boards";
        assert_eq!(
            parse_prompt_list(text, 3),
            vec!["Here you go:", "Oiled jarrah deck at dusk", "Close-up of grain"]
        );
        assert_eq!(parse_prompt_list("- a\n- b\n- c", 2), vec!["a", "b"]);
    }

    #[test]
    fn seo_copy_is_clamped() {
        let long_title = "Premium ".repeat(20);
        let text = format!(
            "Sure!\n{{\"metaTitle\": \"{long_title}\", \"metaDescription\": \"Durable decking.\", \"keywords\": [\"Decking\", \"decking\", \"Hardwood\"]}}"
        );
        let copy = parse_seo_copy(&text).unwrap();
        assert!(copy.meta_title.chars().count() <= 60);
        assert_eq!(copy.meta_description, "Durable decking.");
        assert_eq!(copy.keywords, vec!["decking", "hardwood"]);
    }

    #[test]
    fn seo_copy_parse_failure_is_reported() {
        assert!(matches!(
            parse_seo_copy("no json here"),
            Err(GeneratorError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_seo_copy("{\"metaTitle\": 3}"),
            Err(GeneratorError::MalformedResponse(_))
        ));
    }

    use crate::application::ai::GeneratedText;

    struct RejectingGenerator;

    #[async_trait::async_trait]
    impl ContentGenerator for RejectingGenerator {
        fn name(&self) -> &'static str {
            "rejecting"
        }

        async fn generate(&self, _request: &GenerationRequest) -> Result<GeneratedText, GeneratorError> {
            Err(GeneratorError::Api {
                status: 502,
                message: "upstream overloaded".to_string(),
            })
        }
    }

    fn service_with(generator: Arc<dyn ContentGenerator>) -> AiContentService {
        use crate::domain::entities::{AiSettings, RateLimits};
        use crate::infra::store::MemoryCollectionStore;

        let store: Arc<dyn CollectionStore> = Arc::new(MemoryCollectionStore::new());
        let cache = CacheConfig::default();
        let templates = Arc::new(PromptTemplateService::new(store.clone(), cache));
        let settings = Arc::new(AiSettingsService::new(
            store.clone(),
            cache,
            AiSettings {
                model: "test-model".to_string(),
                temperature: 0.5,
                max_tokens: 500,
                rate_limits: RateLimits::default(),
                cost_per_1k_tokens: 0.002,
                updated_at: None,
            },
        ));
        AiContentService::new(store, cache, templates, settings, generator, "Timberline")
    }

    #[tokio::test]
    async fn failed_generation_is_logged_as_error() {
        let service = service_with(Arc::new(RejectingGenerator));
        let command = GenerateContentCommand {
            description: "Decking care article".to_string(),
            content_type: AiContentType::BlogPost,
            template_id: None,
            prompt: Some("Write about caring for {{species}} decks.".to_string()),
            variables: BTreeMap::from([("species".to_string(), "merbau".to_string())]),
        };

        let err = service.generate_content(command, "editor").await.unwrap_err();
        assert!(matches!(err, ServiceError::Generator(GeneratorError::Api { status: 502, .. })));

        let logged = service.list_requests(Some("editor"), 10).await.unwrap();
        assert_eq!(logged.len(), 1);
        let request = service.get_request(logged[0].id).await.unwrap();
        assert_eq!(request.status, AiRequestStatus::Error);
        assert!(request.error.as_deref().unwrap().contains("upstream overloaded"));
        assert!(request.completed_at.is_some());
        assert!(request.generated_content.is_none());
        assert_eq!(request.prompt, "Write about caring for merbau decks.");

        let usage = service.usage_summary(Some("editor")).await.unwrap();
        assert_eq!(usage.total_requests, 1);
        assert_eq!(usage.failed, 1);
        assert_eq!(usage.completed, 0);
    }
}
