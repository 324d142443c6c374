//! Generator identity shared across the workspace.

use crate::error::{Result, TestbenchError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The LLM backends that can be asked to write tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    /// OpenAI chat completions
    Gpt,
    /// Google Gemini generateContent
    Gemini,
    /// CodeLlama behind an OpenAI-compatible endpoint
    #[serde(rename = "codellama")]
    CodeLlama,
    /// Offline deterministic generator
    Mock,
}

impl GeneratorKind {
    /// Every generator, in report order.
    pub const ALL: [GeneratorKind; 4] = [Self::Gpt, Self::Gemini, Self::CodeLlama, Self::Mock];

    /// The generators backed by a remote API.
    pub const REMOTE: [GeneratorKind; 3] = [Self::Gpt, Self::Gemini, Self::CodeLlama];

    /// Directory name under the results root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Gpt => "gpt",
            Self::Gemini => "gemini",
            Self::CodeLlama => "codellama",
            Self::Mock => "mock",
        }
    }

    /// Human-facing name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Gpt => "GPT",
            Self::Gemini => "Gemini",
            Self::CodeLlama => "CodeLlama",
            Self::Mock => "Mock",
        }
    }

    /// Whether this backend needs network access and an API key.
    pub fn is_remote(&self) -> bool {
        !matches!(self, Self::Mock)
    }
}

impl std::str::FromStr for GeneratorKind {
    type Err = TestbenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gpt" | "openai" => Ok(Self::Gpt),
            "gemini" => Ok(Self::Gemini),
            "codellama" | "llama" => Ok(Self::CodeLlama),
            "mock" => Ok(Self::Mock),
            other => Err(TestbenchError::invalid_input(format!(
                "Unknown generator '{}'. Must be one of: gpt, gemini, codellama, mock",
                other
            ))),
        }
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("GPT".parse::<GeneratorKind>().unwrap(), GeneratorKind::Gpt);
        assert_eq!("CodeLlama".parse::<GeneratorKind>().unwrap(), GeneratorKind::CodeLlama);
        assert_eq!(" gemini ".parse::<GeneratorKind>().unwrap(), GeneratorKind::Gemini);
        assert!("copilot".parse::<GeneratorKind>().is_err());
    }

    #[test]
    fn test_dir_names_round_trip() {
        for kind in GeneratorKind::ALL {
            assert_eq!(kind.dir_name().parse::<GeneratorKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_serde_uses_dir_names() {
        let json = serde_json::to_string(&GeneratorKind::CodeLlama).unwrap();
        assert_eq!(json, "\"codellama\"");
        let kind: GeneratorKind = serde_json::from_str("\"gpt\"").unwrap();
        assert_eq!(kind, GeneratorKind::Gpt);
    }
}
