//! CodeLlama through an OpenAI-compatible llama chat endpoint.

use crate::generator::TestGenerator;
use crate::gpt::{ChatMessage, ChatResponse};
use crate::http::{build_client, endpoint, non_empty, send_json};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use testbench_core::config::CodeLlamaConfig;
use testbench_core::{GeneratorKind, Result, TestbenchError};
use tracing::{debug, info};

pub struct CodeLlamaGenerator {
    client: Client,
    config: CodeLlamaConfig,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct LlamaRequest<'a> {
    messages: Vec<ChatMessage>,
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<GenerationParameters>,
}

#[derive(Debug, Default, PartialEq, Serialize)]
struct GenerationParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_new_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repetition_penalty: Option<f32>,
}

impl GenerationParameters {
    fn from_config(config: &CodeLlamaConfig) -> Option<Self> {
        let params = Self {
            max_new_tokens: config.max_new_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            repetition_penalty: config.repetition_penalty,
        };
        (params != Self::default()).then_some(params)
    }
}

/// Instruction-format prompt asking for JUnit 5 tests of Kotlin code.
pub fn build_prompt(prompt: &str, code: &str) -> String {
    format!(
        "[INST] Write JUnit 5 unit tests for the following Kotlin code.
Requirements: {prompt}

Code to test:
```kotlin
{code}
```

Generate comprehensive unit tests following best practices and make sure to:
- Include edge cases
- Test error conditions
- Follow naming conventions
- Add descriptive test names
[/INST]"
    )
}

impl CodeLlamaGenerator {
    pub fn new(config: CodeLlamaConfig, timeout: Duration) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| TestbenchError::config("CodeLlama API key not configured"))?;

        let client = build_client(timeout)?;
        info!("Initialized CodeLlama generator with model: {}", config.model);

        Ok(Self {
            client,
            config,
            api_key,
        })
    }
}

#[async_trait]
impl TestGenerator for CodeLlamaGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::CodeLlama
    }

    async fn generate_tests(&self, prompt: &str, code: &str) -> Result<String> {
        debug!("Requesting tests from CodeLlama ({} bytes of code)", code.len());

        let request = LlamaRequest {
            messages: vec![ChatMessage::user(build_prompt(prompt, code))],
            model: &self.config.model,
            parameters: GenerationParameters::from_config(&self.config),
        };

        let response: ChatResponse = send_json(
            self.client
                .post(endpoint(&self.config.base_url, "chat/completions"))
                .bearer_auth(&self.api_key)
                .json(&request),
            "CodeLlama",
        )
        .await?;

        non_empty(response.into_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_template() {
        let prompt = build_prompt("cover errors", "fun a() = 1");
        assert!(prompt.starts_with("[INST] Write JUnit 5 unit tests"));
        assert!(prompt.contains("Requirements: cover errors"));
        assert!(prompt.contains("```kotlin\nfun a() = 1\n```"));
        assert!(prompt.ends_with("[/INST]"));
    }

    #[test]
    fn test_parameters_omitted_when_unset() {
        let config = CodeLlamaConfig::default();
        assert!(GenerationParameters::from_config(&config).is_none());

        let request = LlamaRequest {
            messages: vec![],
            model: "llama3.1-70b",
            parameters: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("parameters").is_none());

        let tuned = CodeLlamaConfig {
            temperature: Some(0.7),
            ..CodeLlamaConfig::default()
        };
        let params = GenerationParameters::from_config(&tuned).unwrap();
        let json = serde_json::to_value(&params).unwrap();
        assert!(json.get("top_p").is_none());
        assert!(json.get("temperature").is_some());
    }
}
