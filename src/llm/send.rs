//! HTTP client for an OpenAI-compatible chat-completions endpoint.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::config::LlmConfig;
use crate::llm::receive::LLMResponse;
use crate::llm::{ChatMessage, GenerationConfig, LLMError, LanguageModel, Result};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            kind: "json_object".to_string(),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct LLMRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

pub struct OpenAiClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| LLMError::InvalidInput {
                details: "API key is not configured".to_string(),
            })?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| LLMError::ClientBuild {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            model: config.model.clone(),
        })
    }

    #[instrument(skip(self, request), fields(model = %self.model, messages = request.messages.len()))]
    async fn send(&self, request: &LLMRequest<'_>) -> Result<String> {
        if request.messages.is_empty() {
            return Err(LLMError::InvalidInput {
                details: "Messages cannot be empty".to_string(),
            });
        }

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = status.as_u16(), "Model API returned an error status");
            return Err(classify_status(status, body));
        }

        let parsed: LLMResponse = response
            .json()
            .await
            .map_err(|e| LLMError::InvalidResponse {
                reason: e.to_string(),
            })?;

        if let Some(usage) = &parsed.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion received"
            );
        }

        parsed.into_content()
    }
}

fn classify_transport(e: reqwest::Error) -> LLMError {
    if e.is_timeout() {
        LLMError::Timeout
    } else {
        LLMError::Connection {
            reason: e.to_string(),
        }
    }
}

pub fn classify_status(status: StatusCode, body: String) -> LLMError {
    match status.as_u16() {
        401 => LLMError::Authentication,
        403 => LLMError::Forbidden,
        429 => LLMError::RateLimited,
        code @ 500..=599 => LLMError::Server { status: code, body },
        code => LLMError::Http { status: code, body },
    }
}

/// Appends the expected JSON shape to a prompt for JSON-mode requests.
pub fn structured_prompt(prompt: &str, schema_hint: &str) -> String {
    format!(
        "{}\n\nRespond with a single JSON object of this shape:\n{}",
        prompt.trim_end(),
        schema_hint
    )
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete_text(
        &self,
        messages: &[ChatMessage],
        options: &GenerationConfig,
    ) -> Result<String> {
        let request = LLMRequest {
            model: &self.model,
            messages,
            max_tokens: Some(options.max_tokens),
            temperature: Some(options.temperature),
            response_format: None,
        };
        self.send(&request).await
    }

    async fn complete_structured(
        &self,
        prompt: &str,
        schema_hint: &str,
        options: &GenerationConfig,
    ) -> Result<String> {
        let messages = [ChatMessage::user(structured_prompt(prompt, schema_hint))];
        let request = LLMRequest {
            model: &self.model,
            messages: &messages,
            max_tokens: Some(options.max_tokens),
            temperature: Some(options.temperature),
            response_format: Some(ResponseFormat::json_object()),
        };
        self.send(&request).await
    }
}
