//! Decoding what comes back from the model.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::llm::{LLMError, Result};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ResponseMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Choice {
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Body of a chat-completions response.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LLMResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl LLMResponse {
    /// Content of the first choice; blank content counts as empty.
    pub fn into_content(self) -> Result<String> {
        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LLMError::EmptyResponse)?;

        if content.trim().is_empty() {
            return Err(LLMError::EmptyResponse);
        }
        Ok(content)
    }
}

fn fenced_block() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").ok())
        .as_ref()
}

/// Pulls the JSON object out of a model reply that may be wrapped in a
/// Markdown fence or surrounded by prose.
pub fn extract_json_from_response(response: &str) -> std::result::Result<String, String> {
    let trimmed = response.trim();

    let candidate = fenced_block()
        .and_then(|fence| fence.captures(trimmed))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed);

    if let Some(start) = candidate.find('{') {
        if let Some(end) = candidate.rfind('}') {
            if end > start {
                return Ok(candidate[start..=end].to_string());
            }
        }
    }

    Err("No valid JSON found in response".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_raw_json() {
        let json = extract_json_from_response(r#"{"mistakes": []}"#).unwrap();
        assert_eq!(json, r#"{"mistakes": []}"#);
    }

    #[test]
    fn extracts_from_fence_and_prose() {
        let reply = "Here is the analysis:\n```json\n{\"overall_quality\": 4}\n```\nHope it helps!";
        assert_eq!(
            extract_json_from_response(reply).unwrap(),
            "{\"overall_quality\": 4}"
        );

        let reply = "Sure! {\"a\": {\"b\": 1}} done";
        assert_eq!(extract_json_from_response(reply).unwrap(), "{\"a\": {\"b\": 1}}");
    }

    #[test]
    fn rejects_text_without_object() {
        assert!(extract_json_from_response("no json here").is_err());
        assert!(extract_json_from_response("} backwards {").is_err());
    }

    #[test]
    fn response_content_of_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hola"},"finish_reason":"stop"}]}"#;
        let response: LLMResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.into_content().unwrap(), "Hola");
    }

    #[test]
    fn partial_usage_block_is_accepted() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Vale"}}],"usage":{"total_tokens":12}}"#;
        let response: LLMResponse = serde_json::from_str(body).unwrap();
        let usage = response.usage.clone().unwrap();
        assert_eq!((usage.prompt_tokens, usage.total_tokens), (0, 12));
        assert_eq!(response.into_content().unwrap(), "Vale");
    }

    #[test]
    fn blank_or_missing_content_is_empty_response() {
        let response: LLMResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(response.into_content(), Err(LLMError::EmptyResponse)));

        let body = r#"{"choices":[{"message":{"role":"assistant","content":"   "}}]}"#;
        let response: LLMResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(response.into_content(), Err(LLMError::EmptyResponse)));
    }
}
