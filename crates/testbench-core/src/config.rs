//! Configuration for the testbench harness.
//!
//! Configuration is read from a TOML file (by default `testbench.toml` in
//! the working directory) and then overridden by environment variables.
//! A missing file is not an error: every field has a default that matches
//! the layout the harness has always used (`testData/` for sources,
//! `result/<generator>/session<N>/` for generated tests).
//!
//! # Example
//!
//! ```no_run
//! use testbench_core::config::TestbenchConfig;
//!
//! # async fn example() -> testbench_core::Result<()> {
//! let mut config = TestbenchConfig::load_or_default(None).await?;
//! config.merge_env_vars();
//! config.validate()?;
//! println!("Sources: {}", config.paths.source_dir.display());
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, TestbenchError};
use crate::prompt::DEFAULT_PROMPT;
use crate::types::GeneratorKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "testbench.toml";

// Environment variable names
pub const ENV_LOG_LEVEL: &str = "TESTBENCH_LOG_LEVEL";
pub const ENV_SOURCE_DIR: &str = "TESTBENCH_SOURCE_DIR";
pub const ENV_RESULTS_DIR: &str = "TESTBENCH_RESULTS_DIR";
pub const ENV_PROMPT: &str = "TESTBENCH_PROMPT";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_CODELLAMA_API_KEY: &str = "CODELLAMA_API_KEY";
pub const ENV_CODELLAMA_BASE_URL: &str = "CODELLAMA_BASE_URL";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TestbenchConfig {
    pub general: GeneralConfig,
    pub paths: PathsConfig,
    pub prompt: PromptConfig,
    pub weights: WeightsConfig,
    pub generators: GeneratorsConfig,
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error
    pub log_level: String,
}

/// Filesystem layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the source snippets to generate tests for
    pub source_dir: PathBuf,
    /// Root of `<generator>/session<N>/` output directories
    pub results_dir: PathBuf,
    /// Where comparison reports are written
    pub analysis_dir: PathBuf,
}

/// Prompt settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub text: String,
}

/// Category weights for the weighted score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightsConfig {
    pub basic: f64,
    pub coverage: f64,
    pub quality: f64,
    pub readability: f64,
    pub timing: f64,
}

/// Generator backends
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorsConfig {
    /// Generators used when none are selected on the command line
    pub enabled: Vec<GeneratorKind>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Retries after the first attempt for transient failures
    pub max_retries: usize,
    pub gpt: GptConfig,
    pub gemini: GeminiConfig,
    pub codellama: CodeLlamaConfig,
}

/// OpenAI chat completions backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GptConfig {
    /// API key (can be set via OPENAI_API_KEY env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Gemini generateContent backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key (can be set via GEMINI_API_KEY env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

/// CodeLlama backend (OpenAI-compatible chat endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeLlamaConfig {
    /// API key (can be set via CODELLAMA_API_KEY env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    /// Optional sampling parameters, omitted from requests when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_new_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repetition_penalty: Option<f32>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("testData"),
            results_dir: PathBuf::from("result"),
            analysis_dir: PathBuf::from("analysis_results"),
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            text: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            basic: 0.2,
            coverage: 0.2,
            quality: 0.2,
            readability: 0.2,
            timing: 0.2,
        }
    }
}

impl WeightsConfig {
    pub fn total(&self) -> f64 {
        self.basic + self.coverage + self.quality + self.readability + self.timing
    }

    fn as_array(&self) -> [(&'static str, f64); 5] {
        [
            ("basic", self.basic),
            ("coverage", self.coverage),
            ("quality", self.quality),
            ("readability", self.readability),
            ("timing", self.timing),
        ]
    }
}

impl Default for GeneratorsConfig {
    fn default() -> Self {
        Self {
            enabled: GeneratorKind::REMOTE.to_vec(),
            timeout_secs: 60,
            max_retries: 2,
            gpt: GptConfig::default(),
            gemini: GeminiConfig::default(),
            codellama: CodeLlamaConfig::default(),
        }
    }
}

impl Default for GptConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 1.0,
            max_tokens: 1000,
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
        }
    }
}

impl Default for CodeLlamaConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.llama-api.com".to_string(),
            model: "llama3.1-70b".to_string(),
            max_new_tokens: None,
            temperature: None,
            top_p: None,
            repetition_penalty: None,
        }
    }
}

impl TestbenchConfig {
    /// Load configuration from a TOML file.
    pub async fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            TestbenchError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load from `path`, or from `testbench.toml` when no path is given.
    ///
    /// An explicitly requested file must exist; the implicit one may not.
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path).await,
            None => {
                let implicit = Path::new(DEFAULT_CONFIG_FILE);
                if tokio::fs::try_exists(implicit).await.unwrap_or(false) {
                    Self::load_from_path(implicit).await
                } else {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write configuration to a TOML file, creating parent directories.
    pub async fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, self.to_toml_string()?).await?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        for (name, weight) in self.weights.as_array() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(TestbenchError::config(format!(
                    "Weight '{}' must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        if self.weights.total() <= 0.0 {
            return Err(TestbenchError::config("At least one weight must be positive"));
        }

        if self.generators.timeout_secs == 0 {
            return Err(TestbenchError::config("generators.timeout_secs must be greater than 0"));
        }

        for (name, path) in [
            ("paths.source_dir", &self.paths.source_dir),
            ("paths.results_dir", &self.paths.results_dir),
            ("paths.analysis_dir", &self.paths.analysis_dir),
        ] {
            if path.as_os_str().is_empty() {
                return Err(TestbenchError::config(format!("{} cannot be empty", name)));
            }
        }

        for (name, model) in [
            ("gpt", &self.generators.gpt.model),
            ("gemini", &self.generators.gemini.model),
            ("codellama", &self.generators.codellama.model),
        ] {
            if model.trim().is_empty() {
                return Err(TestbenchError::config(format!(
                    "generators.{}.model cannot be empty",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn merge_env_vars(&mut self) {
        self.merge_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides using the given variable lookup.
    pub fn merge_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            debug!("Overriding log_level from environment");
            self.general.log_level = level;
        }
        if let Some(dir) = lookup(ENV_SOURCE_DIR) {
            self.paths.source_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(ENV_RESULTS_DIR) {
            self.paths.results_dir = PathBuf::from(dir);
        }
        if let Some(prompt) = lookup(ENV_PROMPT) {
            self.prompt.text = prompt;
        }
        if let Some(key) = lookup(ENV_OPENAI_API_KEY) {
            self.generators.gpt.api_key = Some(key);
        }
        if let Some(key) = lookup(ENV_GEMINI_API_KEY) {
            self.generators.gemini.api_key = Some(key);
        }
        if let Some(key) = lookup(ENV_CODELLAMA_API_KEY) {
            self.generators.codellama.api_key = Some(key);
        }
        if let Some(url) = lookup(ENV_CODELLAMA_BASE_URL) {
            self.generators.codellama.base_url = url;
        }
    }
}
