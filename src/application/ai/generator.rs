//! Capability interface for external text generation.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("content generation is not configured")]
    Unavailable,
    #[error("content generator request failed: {0}")]
    Transport(String),
    #[error("content generator returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("content generator response could not be used: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedText {
    pub text: String,
    pub model: String,
    /// Total tokens reported by the provider, when it reports usage.
    pub tokens_used: Option<u32>,
}

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedText, GeneratorError>;
}

/// Selected when no provider is configured; every call fails fast.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableGenerator;

#[async_trait]
impl ContentGenerator for UnavailableGenerator {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<GeneratedText, GeneratorError> {
        Err(GeneratorError::Unavailable)
    }
}
