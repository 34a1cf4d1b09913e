//! Chat-completions client for OpenAI-compatible providers.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::application::ai::{ContentGenerator, GeneratedText, GenerationRequest, GeneratorError};

#[derive(Debug, Clone)]
pub struct OpenAiCompatibleGenerator {
    client: Client,
    base_url: Url,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

impl OpenAiCompatibleGenerator {
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Result<Self, GeneratorError> {
        let client = Client::builder()
            .user_agent(concat!("timberline/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| GeneratorError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.base_url.as_str().trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ContentGenerator for OpenAiCompatibleGenerator {
    fn name(&self) -> &'static str {
        "openai-compatible"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedText, GeneratorError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });
        let body = ChatRequest {
            model: &request.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| GeneratorError::Transport(err.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| GeneratorError::Transport(err.to_string()))?;
        if !status.is_success() {
            return Err(GeneratorError::Api {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        let parsed: ChatResponse = serde_json::from_slice(&bytes)
            .map_err(|err| GeneratorError::MalformedResponse(err.to_string()))?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| GeneratorError::MalformedResponse("response has no content".to_string()))?;

        debug!(
            target = "timberline::ai",
            model = %request.model,
            tokens = ?parsed.usage.as_ref().map(|usage| usage.total_tokens),
            "completion received"
        );
        Ok(GeneratedText {
            text,
            model: parsed.model.unwrap_or_else(|| request.model.clone()),
            tokens_used: parsed.usage.map(|usage| usage.total_tokens),
        })
    }
}
