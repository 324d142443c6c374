//! Core types and abstractions for the testbench harness.
//!
//! This crate provides the pieces shared by the generators, the scorer and
//! the CLI: error handling, configuration, generator identity, prompts and
//! the on-disk session layout.

pub mod error;
pub mod types;
pub mod prompt;
pub mod config;
pub mod session;

pub use error::{TestbenchError, Result};
pub use types::GeneratorKind;
pub use prompt::{PromptProvider, SimplePrompt, DEFAULT_PROMPT};
pub use config::{TestbenchConfig, GeneratorsConfig, PathsConfig, WeightsConfig};
pub use session::{SessionStore, SessionHandle, SessionInfo};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{TestbenchError, Result};
    pub use crate::types::GeneratorKind;
    pub use crate::prompt::{PromptProvider, SimplePrompt};
    pub use crate::config::TestbenchConfig;
    pub use crate::session::SessionStore;
}
