//! OpenAI chat completions backend.

use crate::generator::{TestGenerator, user_message};
use crate::http::{build_client, endpoint, non_empty, send_json};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use testbench_core::config::GptConfig;
use testbench_core::{GeneratorKind, Result, TestbenchError};
use tracing::{debug, info};

pub struct GptGenerator {
    client: Client,
    config: GptConfig,
    api_key: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub(crate) fn user(content: String) -> Self {
        Self {
            role: "user".to_string(),
            content,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage>,
    temperature: f32,
    model: &'a str,
    store: bool,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponseMessage {
    pub content: Option<String>,
}

impl ChatResponse {
    pub(crate) fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
    }
}

impl GptGenerator {
    pub fn new(config: GptConfig, timeout: Duration) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| TestbenchError::config("OpenAI API key not configured"))?;

        let client = build_client(timeout)?;
        info!("Initialized GPT generator with model: {}", config.model);

        Ok(Self {
            client,
            config,
            api_key,
        })
    }
}

#[async_trait]
impl TestGenerator for GptGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Gpt
    }

    async fn generate_tests(&self, prompt: &str, code: &str) -> Result<String> {
        debug!("Requesting tests from GPT ({} bytes of code)", code.len());

        let request = ChatRequest {
            messages: vec![ChatMessage::user(user_message(prompt, code))],
            temperature: self.config.temperature,
            model: &self.config.model,
            store: true,
            max_tokens: self.config.max_tokens,
        };

        let response: ChatResponse = send_json(
            self.client
                .post(endpoint(&self.config.base_url, "chat/completions"))
                .bearer_auth(&self.api_key)
                .json(&request),
            "GPT",
        )
        .await?;

        non_empty(response.into_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_config_error() {
        let err = GptGenerator::new(GptConfig::default(), Duration::from_secs(1))
            .err()
            .unwrap();
        assert!(matches!(err, TestbenchError::Config(_)));
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            messages: vec![ChatMessage::user("p for c".into())],
            temperature: 1.0,
            model: "gpt-4o-mini",
            store: true,
            max_tokens: 1000,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "p for c");
        assert_eq!(json["store"], true);
        assert_eq!(json["max_tokens"], 1000);
    }

    #[test]
    fn test_response_without_choices() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(response.into_text().is_none());
    }
}
