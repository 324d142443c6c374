//! Test and assertion counts.

use super::{ASSERTION_KINDS, Metrics, MetricsAnalyzer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Annotation that marks a test function.
pub const TEST_ANNOTATION: &str = "@Test";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicMetrics {
    pub total_tests: usize,
    pub total_assertions: usize,
    pub average_assertions_per_test: f64,
}

impl BasicMetrics {
    /// Points for the number of tests, capped at 15.
    pub fn test_points(&self) -> u32 {
        (self.total_tests.saturating_mul(3)).min(15) as u32
    }

    /// Points for assertion density, capped at 15.
    pub fn assertion_points(&self) -> u32 {
        let raw = (self.average_assertions_per_test * 10.0).floor();
        if raw.is_finite() && raw > 0.0 {
            (raw as u32).min(15)
        } else {
            0
        }
    }
}

impl Metrics for BasicMetrics {
    fn score(&self) -> f64 {
        f64::from(self.test_points() + self.assertion_points()) / 30.0 * 100.0
    }
}

impl fmt::Display for BasicMetrics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "tests: {}, assertions: {}, per test: {:.2}",
            self.total_tests, self.total_assertions, self.average_assertions_per_test
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BasicMetricsAnalyzer;

impl MetricsAnalyzer for BasicMetricsAnalyzer {
    type Output = BasicMetrics;

    fn analyze(&self, _code: &str, test: &str) -> BasicMetrics {
        let total_tests = count_annotations(test, TEST_ANNOTATION);
        let total_assertions = count_assertions(test);
        let average_assertions_per_test = if total_tests > 0 {
            total_assertions as f64 / total_tests as f64
        } else {
            0.0
        };

        BasicMetrics {
            total_tests,
            total_assertions,
            average_assertions_per_test,
        }
    }
}

/// Lines whose trimmed text starts with `annotation`.
pub fn count_annotations(test: &str, annotation: &str) -> usize {
    test.lines()
        .filter(|line| line.trim_start().starts_with(annotation))
        .count()
}

/// Lines that call at least one known assertion.
pub fn count_assertions(test: &str) -> usize {
    test.lines()
        .filter(|line| ASSERTION_KINDS.iter().any(|kind| line.contains(kind)))
        .count()
}
