use async_trait::async_trait;
use testbench_core::{GeneratorKind, Result};

/// A backend that writes unit tests for a piece of source code.
#[async_trait]
pub trait TestGenerator: Send + Sync {
    /// Which generator this is.
    fn kind(&self) -> GeneratorKind;

    /// Ask the backend for tests covering `code`.
    ///
    /// Returns the raw response text. An empty response is an error.
    async fn generate_tests(&self, prompt: &str, code: &str) -> Result<String>;
}

#[async_trait]
impl<T: TestGenerator + ?Sized> TestGenerator for Box<T> {
    fn kind(&self) -> GeneratorKind {
        (**self).kind()
    }

    async fn generate_tests(&self, prompt: &str, code: &str) -> Result<String> {
        (**self).generate_tests(prompt, code).await
    }
}

/// The single user message sent by the chat-style backends.
pub(crate) fn user_message(prompt: &str, code: &str) -> String {
    format!("{prompt} for {code}")
}
