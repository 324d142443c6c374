//! Google Gemini `generateContent` backend.

use crate::generator::{TestGenerator, user_message};
use crate::http::{build_client, endpoint, non_empty, send_json};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use testbench_core::config::GeminiConfig;
use testbench_core::{GeneratorKind, Result, TestbenchError};
use tracing::{debug, info};

pub struct GeminiGenerator {
    client: Client,
    config: GeminiConfig,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        Some(text)
    }
}

impl GeminiGenerator {
    pub fn new(config: GeminiConfig, timeout: Duration) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| TestbenchError::config("Gemini API key not configured"))?;

        let client = build_client(timeout)?;
        info!("Initialized Gemini generator with model: {}", config.model);

        Ok(Self {
            client,
            config,
            api_key,
        })
    }
}

#[async_trait]
impl TestGenerator for GeminiGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Gemini
    }

    async fn generate_tests(&self, prompt: &str, code: &str) -> Result<String> {
        debug!("Requesting tests from Gemini ({} bytes of code)", code.len());

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(user_message(prompt, code)),
                }],
            }],
        };
        let url = endpoint(
            &self.config.base_url,
            &format!("models/{}:generateContent", self.config.model),
        );

        let response: GenerateContentResponse = send_json(
            self.client
                .post(url)
                .query(&[("key", self.api_key.as_str())])
                .json(&request),
            "Gemini",
        )
        .await?;

        non_empty(response.into_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parts_are_concatenated() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "class A"}, {"text": "Test {}"}], "role": "model"}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.into_text().as_deref(), Some("class ATest {}"));
    }

    #[test]
    fn test_no_candidates() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(response.into_text().is_none());
    }
}
