//! # External language model
//!
//! The tutor never detects mistakes or writes replies itself; it sends
//! prompts to a chat-completions model and reads back either free text or a
//! JSON object.
//!
//! ```text
//! analyzer ──complete_structured──┐
//! composer ──complete_text────────┼──> LanguageModel ──> OpenAiClient (send.rs)
//! feedback ──complete_text────────┘                         │
//!                                              receive.rs <─┘ (response decoding)
//! ```

pub mod receive;
pub mod send;

pub use receive::{extract_json_from_response, LLMResponse};
pub use send::OpenAiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LLMError {
    #[error("Request timeout - the API took too long to respond")]
    Timeout,
    #[error("Connection error - unable to reach the API: {reason}")]
    Connection { reason: String },
    #[error("Authentication failed - check your API key")]
    Authentication,
    #[error("Access forbidden - insufficient permissions")]
    Forbidden,
    #[error("Rate limit exceeded - too many requests")]
    RateLimited,
    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Failed to parse API response: {reason}")]
    InvalidResponse { reason: String },
    #[error("API returned empty content")]
    EmptyResponse,
    #[error("Failed to create HTTP client: {reason}")]
    ClientBuild { reason: String },
    #[error("Invalid input parameters: {details}")]
    InvalidInput { details: String },
}

pub type Result<T> = std::result::Result<T, LLMError>;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 800,
            temperature: 0.7,
        }
    }
}

impl GenerationConfig {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Opaque completion capability.
///
/// Implementations do not retry; a failed call surfaces as `LLMError`.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Free-form completion over a chat transcript.
    async fn complete_text(
        &self,
        messages: &[ChatMessage],
        options: &GenerationConfig,
    ) -> Result<String>;

    /// Completion constrained to a JSON object shaped like `schema_hint`.
    ///
    /// Returns the raw body; callers decode it and must cope with output
    /// that does not match the hint.
    async fn complete_structured(
        &self,
        prompt: &str,
        schema_hint: &str,
        options: &GenerationConfig,
    ) -> Result<String>;
}
