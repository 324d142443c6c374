//! How easy a generated test suite is to read.
//!
//! Scores backticked names, comments and whether tests stay a readable
//! length.

use super::basic::TEST_ANNOTATION;
use super::{Metrics, MetricsAnalyzer};
use serde::{Deserialize, Serialize};

/// Average test length, in lines, that earns full readability credit.
pub const PREFERRED_TEST_LENGTH: std::ops::RangeInclusive<usize> = 5..=25;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadabilityMetrics {
    pub uses_backticks: bool,
    pub has_comments: bool,
    pub average_test_length: usize,
}

impl ReadabilityMetrics {
    pub fn has_preferred_length(&self) -> bool {
        PREFERRED_TEST_LENGTH.contains(&self.average_test_length)
    }

    /// 1.0 inside the preferred range, falling off linearly outside it.
    pub fn length_factor(&self) -> f64 {
        let len = self.average_test_length as f64;
        let (low, high) = (
            *PREFERRED_TEST_LENGTH.start() as f64,
            *PREFERRED_TEST_LENGTH.end() as f64,
        );
        if self.average_test_length == 0 {
            0.0
        } else if len < low {
            len / low
        } else if len > high {
            (high / len).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

impl Metrics for ReadabilityMetrics {
    fn score(&self) -> f64 {
        let mut score = 0.0;
        if self.uses_backticks {
            score += 30.0;
        }
        if self.has_comments {
            score += 30.0;
        }
        score + 40.0 * self.length_factor()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReadabilityAnalyzer;

impl MetricsAnalyzer for ReadabilityAnalyzer {
    type Output = ReadabilityMetrics;

    fn analyze(&self, _code: &str, test: &str) -> ReadabilityMetrics {
        ReadabilityMetrics {
            uses_backticks: test.contains('`'),
            has_comments: test.contains("//") || test.contains("/*"),
            average_test_length: average_test_length(test),
        }
    }
}

/// Mean line count of the blocks that follow each `@Test`, truncated.
fn average_test_length(test: &str) -> usize {
    let blocks: Vec<&str> = test.split(TEST_ANNOTATION).skip(1).collect();
    if blocks.is_empty() {
        return 0;
    }
    let lines: usize = blocks.iter().map(|b| b.split('\n').count()).sum();
    lines / blocks.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_length() {
        let test = "class T {\n@Test\nfun a() {\n  x()\n}\n@Test\nfun b() {}\n}";
        // blocks: "\nfun a() {\n  x()\n}\n" (5 lines) and "\nfun b() {}\n}" (3 lines)
        assert_eq!(average_test_length(test), 4);
        assert_eq!(average_test_length("no tests here"), 0);
    }

    #[test]
    fn test_readability_score() {
        let metrics = ReadabilityMetrics {
            uses_backticks: true,
            has_comments: false,
            average_test_length: 10,
        };
        assert!(metrics.has_preferred_length());
        assert_eq!(metrics.score(), 70.0);

        let long = ReadabilityMetrics {
            average_test_length: 50,
            ..metrics
        };
        assert_eq!(long.length_factor(), 0.5);
        assert!(!long.has_preferred_length());
    }
}
