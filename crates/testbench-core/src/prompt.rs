//! Prompt providers.

/// Prompt used when nothing else is configured.
pub const DEFAULT_PROMPT: &str = "Provide me a set of unit test for the provided codebase";

/// Source of the instruction sent alongside the code.
pub trait PromptProvider: Send + Sync {
    fn prompt(&self) -> String;
}

/// Fixed prompt with an optional override.
#[derive(Debug, Clone, Default)]
pub struct SimplePrompt {
    custom: Option<String>,
}

impl SimplePrompt {
    pub fn new(custom: Option<String>) -> Self {
        Self { custom }
    }
}

impl PromptProvider for SimplePrompt {
    fn prompt(&self) -> String {
        match &self.custom {
            Some(text) if !text.trim().is_empty() => text.clone(),
            _ => DEFAULT_PROMPT.to_string(),
        }
    }
}
