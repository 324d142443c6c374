//! LLM backends that turn a prompt and a source file into unit tests.
//!
//! Every backend implements [`TestGenerator`]. The HTTP backends share one
//! request path (see [`http`]) so status handling and timeouts behave the
//! same for all of them, and [`create_generator`] wraps them with
//! [`RetryingGenerator`] for transient failures.

pub mod generator;
pub mod http;
pub mod gpt;
pub mod gemini;
pub mod codellama;
pub mod mock;
pub mod retry;
pub mod factory;

pub use generator::TestGenerator;
pub use gpt::GptGenerator;
pub use gemini::GeminiGenerator;
pub use codellama::CodeLlamaGenerator;
pub use mock::MockGenerator;
pub use retry::{RetryConfig, RetryingGenerator, retry_with_backoff};
pub use factory::create_generator;
