//! Analyzers over `(source, generated test)` text pairs.
//!
//! Every analyzer is total: any input, including empty or garbage text,
//! produces a metrics record.

pub mod basic;
pub mod coverage;
pub mod quality;
pub mod readability;

pub use basic::{BasicMetrics, BasicMetricsAnalyzer};
pub use coverage::{CoverageAnalyzer, CoverageMetrics, EdgeCase};
pub use quality::{QualityAnalyzer, QualityMetrics};
pub use readability::{ReadabilityAnalyzer, ReadabilityMetrics};

use crate::scoring::TestAnalysisResult;
use once_cell::sync::Lazy;
use regex::Regex;

/// Assertion functions recognised in generated tests.
pub const ASSERTION_KINDS: [&str; 7] = [
    "assertEquals",
    "assertTrue",
    "assertFalse",
    "assertNull",
    "assertNotNull",
    "assertThrows",
    "assertThat",
];

/// A metrics record with a 0–100 category score.
pub trait Metrics {
    fn score(&self) -> f64;
}

/// One family of metrics computed from source and test text.
pub trait MetricsAnalyzer {
    type Output: Metrics;

    fn analyze(&self, code: &str, test: &str) -> Self::Output;
}

// `@Test` followed by optional extra annotations, then the function name,
// either backticked or a plain identifier.
static TEST_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@Test\s*(?:@\w+(?:\([^)]*\))?\s*)*fun\s+(`[^`]+`|\w+)\s*\(").unwrap()
});

/// Name of a `@Test` function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFunctionName {
    pub name: String,
    pub backticked: bool,
}

/// Names of the functions annotated with `@Test`, in order.
pub fn test_function_names(test: &str) -> Vec<TestFunctionName> {
    TEST_FUNCTION
        .captures_iter(test)
        .map(|caps| {
            let raw = &caps[1];
            match raw.strip_prefix('`').and_then(|r| r.strip_suffix('`')) {
                Some(inner) => TestFunctionName {
                    name: inner.to_string(),
                    backticked: true,
                },
                None => TestFunctionName {
                    name: raw.to_string(),
                    backticked: false,
                },
            }
        })
        .collect()
}

/// Runs all analyzers and bundles the results.
#[derive(Debug, Clone, Default)]
pub struct TestQualityAnalyzer {
    basic: BasicMetricsAnalyzer,
    coverage: CoverageAnalyzer,
    quality: QualityAnalyzer,
    readability: ReadabilityAnalyzer,
}

impl TestQualityAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyze_test(&self, original_code: &str, generated_test: &str) -> TestAnalysisResult {
        TestAnalysisResult {
            basic: self.basic.analyze(original_code, generated_test),
            coverage: self.coverage.analyze(original_code, generated_test),
            quality: self.quality.analyze(original_code, generated_test),
            readability: self.readability.analyze(original_code, generated_test),
        }
    }
}
