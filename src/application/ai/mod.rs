//! AI-assisted content generation.

pub mod generator;
pub mod rate_limit;
mod service;
mod settings;
mod templates;

pub use generator::{ContentGenerator, GeneratedText, GenerationRequest, GeneratorError, UnavailableGenerator};
pub use service::{
    AiContentService, GenerateContentCommand, MAX_IMAGE_PROMPTS, SeoCopy, UsageSummary,
    parse_prompt_list, parse_seo_copy,
};
pub use settings::{AiSettingsService, UpdateAiSettingsCommand};
pub use templates::{
    CreateTemplateCommand, PromptTemplateService, UpdateTemplateCommand, builtin_templates,
    fill_template, placeholders,
};
