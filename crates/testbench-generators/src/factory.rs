use crate::codellama::CodeLlamaGenerator;
use crate::gemini::GeminiGenerator;
use crate::generator::TestGenerator;
use crate::gpt::GptGenerator;
use crate::mock::MockGenerator;
use crate::retry::{RetryConfig, RetryingGenerator};
use std::time::Duration;
use testbench_core::{GeneratorKind, GeneratorsConfig, Result};
use tracing::debug;

/// Builds the generator for `kind`.
///
/// Remote backends are wrapped in [`RetryingGenerator`] using
/// `max_retries`. Fails with a configuration error when a remote backend
/// has no API key.
pub fn create_generator(
    kind: GeneratorKind,
    config: &GeneratorsConfig,
) -> Result<Box<dyn TestGenerator>> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let retry = RetryConfig::with_retries(config.max_retries);
    debug!(generator = %kind, timeout_secs = config.timeout_secs, "Creating generator");

    let generator: Box<dyn TestGenerator> = match kind {
        GeneratorKind::Gpt => Box::new(RetryingGenerator::new(
            GptGenerator::new(config.gpt.clone(), timeout)?,
            retry,
        )),
        GeneratorKind::Gemini => Box::new(RetryingGenerator::new(
            GeminiGenerator::new(config.gemini.clone(), timeout)?,
            retry,
        )),
        GeneratorKind::CodeLlama => Box::new(RetryingGenerator::new(
            CodeLlamaGenerator::new(config.codellama.clone(), timeout)?,
            retry,
        )),
        GeneratorKind::Mock => Box::new(MockGenerator::new()),
    };
    Ok(generator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use testbench_core::TestbenchError;

    #[test]
    fn test_missing_keys() {
        let config = GeneratorsConfig::default();
        for kind in GeneratorKind::REMOTE {
            let err = create_generator(kind, &config).err().unwrap();
            assert!(matches!(err, TestbenchError::Config(_)), "{kind}: {err}");
        }
    }

    #[test]
    fn test_creates_configured_generators() {
        let mut config = GeneratorsConfig::default();
        config.gpt.api_key = Some("sk-test".into());
        config.gemini.api_key = Some("g-test".into());
        config.codellama.api_key = Some("l-test".into());

        for kind in GeneratorKind::ALL {
            let generator = create_generator(kind, &config).unwrap();
            assert_eq!(generator.kind(), kind);
        }
    }
}
