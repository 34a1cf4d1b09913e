use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use time::OffsetDateTime;
use time::macros::datetime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::error::ServiceError;
use crate::application::store::{CachedCollection, CollectionStore, collections};
use crate::application::validation::Validate;
use crate::cache::CacheConfig;
use crate::domain::entities::PromptTemplate;
use crate::domain::types::AiContentType;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateCommand {
    pub name: String,
    pub content_type: AiContentType,
    pub template: String,
    /// Derived from the template placeholders when omitted.
    #[serde(default)]
    pub variables: Option<Vec<String>>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTemplateCommand {
    pub name: Option<String>,
    pub template: Option<String>,
    pub variables: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

fn default_active() -> bool {
    true
}

/// Prompt templates with built-in fallbacks for every content type the
/// services generate.
pub struct PromptTemplateService {
    templates: CachedCollection<PromptTemplate>,
}

impl PromptTemplateService {
    pub fn new(store: Arc<dyn CollectionStore>, cache: CacheConfig) -> Self {
        Self {
            templates: CachedCollection::new(store, collections::AI_TEMPLATES, cache.ttl),
        }
    }

    /// Stored templates, or the built-in set while none are stored.
    pub async fn list(&self) -> Result<Vec<PromptTemplate>, ServiceError> {
        let stored = self.templates.all().await?;
        if stored.is_empty() {
            return Ok(builtin_templates());
        }
        let mut templates = stored.as_ref().clone();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(templates)
    }

    pub async fn get(&self, id: Uuid) -> Result<PromptTemplate, ServiceError> {
        let stored = self.templates.all().await?;
        stored
            .iter()
            .find(|template| template.id == id)
            .cloned()
            .or_else(|| builtin_templates().into_iter().find(|template| template.id == id))
            .ok_or(ServiceError::not_found("prompt template"))
    }

    /// First active stored template for `content_type`, else the built-in one.
    pub async fn default_for(
        &self,
        content_type: AiContentType,
    ) -> Result<Option<PromptTemplate>, ServiceError> {
        let stored = self.templates.all().await?;
        let found = stored
            .iter()
            .find(|template| template.is_active && template.content_type == content_type)
            .cloned()
            .or_else(|| {
                builtin_templates()
                    .into_iter()
                    .find(|template| template.content_type == content_type)
            });
        Ok(found)
    }

    pub async fn create(
        &self,
        command: CreateTemplateCommand,
    ) -> Result<PromptTemplate, ServiceError> {
        let now = OffsetDateTime::now_utc();
        let variables = command
            .variables
            .unwrap_or_else(|| placeholders(&command.template));
        let template = PromptTemplate {
            id: Uuid::new_v4(),
            name: command.name.trim().to_string(),
            content_type: command.content_type,
            template: command.template,
            variables,
            is_active: command.is_active,
            usage_count: 0,
            last_used_at: None,
            created_at: now,
            updated_at: now,
        };
        template.validate()?;

        let created = self
            .templates
            .mutate(|items| {
                if items
                    .iter()
                    .any(|existing| existing.name.eq_ignore_ascii_case(&template.name))
                {
                    return Err(ServiceError::conflict(format!(
                        "prompt template `{}` already exists",
                        template.name
                    )));
                }
                items.push(template.clone());
                Ok(template)
            })
            .await?;

        info!(
            target = "timberline::ai",
            template_id = %created.id,
            content_type = created.content_type.as_str(),
            "prompt template created"
        );
        Ok(created)
    }

    pub async fn update(
        &self,
        id: Uuid,
        command: UpdateTemplateCommand,
    ) -> Result<PromptTemplate, ServiceError> {
        self.templates
            .mutate(|items| {
                let Some(index) = items.iter().position(|template| template.id == id) else {
                    return Err(ServiceError::not_found("prompt template"));
                };
                let mut updated = items[index].clone();
                if let Some(name) = command.name {
                    updated.name = name.trim().to_string();
                }
                if let Some(text) = command.template {
                    updated.template = text;
                    if command.variables.is_none() {
                        updated.variables = placeholders(&updated.template);
                    }
                }
                if let Some(variables) = command.variables {
                    updated.variables = variables;
                }
                if let Some(active) = command.is_active {
                    updated.is_active = active;
                }
                updated.validate()?;
                if items.iter().any(|existing| {
                    existing.id != id && existing.name.eq_ignore_ascii_case(&updated.name)
                }) {
                    return Err(ServiceError::conflict(format!(
                        "prompt template `{}` already exists",
                        updated.name
                    )));
                }
                updated.updated_at = OffsetDateTime::now_utc();
                items[index] = updated.clone();
                Ok(updated)
            })
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.templates
            .mutate(|items| {
                let before = items.len();
                items.retain(|template| template.id != id);
                if items.len() == before {
                    Err(ServiceError::not_found("prompt template"))
                } else {
                    Ok(())
                }
            })
            .await
    }

    /// Bump usage statistics. Failures are logged and swallowed.
    pub async fn record_usage(&self, id: Uuid) {
        let result = self
            .templates
            .mutate(|items| {
                if let Some(template) = items.iter_mut().find(|template| template.id == id) {
                    template.usage_count = template.usage_count.saturating_add(1);
                    template.last_used_at = Some(OffsetDateTime::now_utc());
                    Ok(true)
                } else {
                    Ok(false)
                }
            })
            .await;

        match result {
            Ok(true) => {}
            Ok(false) => debug!(
                target = "timberline::ai",
                template_id = %id,
                "usage not recorded for built-in template"
            ),
            Err(err) => {
                metrics::counter!("timberline_side_effect_failure_total", "effect" => "template_usage")
                    .increment(1);
                warn!(
                    target = "timberline::ai",
                    template_id = %id,
                    error = %err,
                    "failed to record template usage"
                );
            }
        }
    }
}

/// Placeholder names in order of first appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    scan_placeholders(template, |name| {
        if !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
        None
    });
    names
}

/// Substitute `{{name}}` placeholders; returns the missing names on failure.
pub fn fill_template(
    template: &str,
    variables: &BTreeMap<String, String>,
) -> Result<String, Vec<String>> {
    let mut missing: Vec<String> = Vec::new();
    let filled = scan_placeholders(template, |name| match variables.get(name) {
        Some(value) => Some(value.clone()),
        None => {
            if !missing.iter().any(|existing| existing == name) {
                missing.push(name.to_string());
            }
            None
        }
    });
    if missing.is_empty() {
        Ok(filled)
    } else {
        Err(missing)
    }
}

fn scan_placeholders(template: &str, mut on_name: impl FnMut(&str) -> Option<String>) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        if let Some(end) = after.find("}}") {
            let name = after[..end].trim();
            if is_identifier(name) {
                if let Some(value) = on_name(name) {
                    output.push_str(&value);
                }
                rest = &after[end + 2..];
                continue;
            }
        }
        output.push_str("{{");
        rest = after;
    }
    output.push_str(rest);
    output
}

fn is_identifier(name: &str) -> bool {
    name.chars()
        .next()
        .is_some_and(|ch| ch.is_ascii_lowercase() || ch == '_')
        && name
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_')
}

const BUILTIN_TEMPLATES: &[(u128, &str, AiContentType, &str)] = &[
    (
        0x7f3c_1e2a_0001,
        "Blog post",
        AiContentType::BlogPost,
        "Write a blog post for a timber and wood products retailer about {{topic}}. \
         Audience: {{audience}}. Use markdown with ## section headings and aim for \
         about {{word_count}} words.",
    ),
    (
        0x7f3c_1e2a_0002,
        "Product description",
        AiContentType::ProductDescription,
        "Write a product description for {{product_name}}, made from {{species}}. \
         Key features: {{features}}. Keep it factual, practical, and under 200 words.",
    ),
    (
        0x7f3c_1e2a_0003,
        "Meta description",
        AiContentType::MetaDescription,
        "Write a single meta description of at most 160 characters for a page about \
         {{subject}}. Respond with the description only.",
    ),
    (
        0x7f3c_1e2a_0004,
        "Social media post",
        AiContentType::SocialMedia,
        "Write a short {{platform}} post announcing {{subject}}. Include one call to \
         action and no more than three hashtags.",
    ),
    (
        0x7f3c_1e2a_0005,
        "Legal page",
        AiContentType::LegalPage,
        "Draft a {{page_type}} for {{company_name}}, a timber products business \
         operating in {{jurisdiction}}. Reference these laws where relevant: \
         {{applicable_laws}}. Use markdown headings and plain language.",
    ),
    (
        0x7f3c_1e2a_0006,
        "Image prompts",
        AiContentType::ImagePrompt,
        "Write {{count}} distinct image generation prompts for: {{description}}. \
         Respond with a JSON array of strings only.",
    ),
    (
        0x7f3c_1e2a_0007,
        "SEO copy",
        AiContentType::SeoCopy,
        "Write search metadata for {{subject}}. Context: {{context}}. Respond with JSON \
         only: {\"metaTitle\": string of at most 60 characters, \"metaDescription\": \
         string of at most 160 characters, \"keywords\": array of 3 to 10 strings}.",
    ),
];

pub fn builtin_templates() -> Vec<PromptTemplate> {
    let epoch = datetime!(2024-01-01 0:00 UTC);
    BUILTIN_TEMPLATES
        .iter()
        .map(|(id, name, content_type, text)| PromptTemplate {
            id: Uuid::from_u128(*id),
            name: (*name).to_string(),
            content_type: *content_type,
            template: (*text).to_string(),
            variables: placeholders(text),
            is_active: true,
            usage_count: 0,
            last_used_at: None,
            created_at: epoch,
            updated_at: epoch,
        })
        .collect()
}
