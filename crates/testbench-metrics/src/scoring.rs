//! Turning metrics into scores.
//!
//! Two scores come out of an analysis. The fixed score is the integer
//! 0–100 used for ranking. The weighted score mixes the five category
//! scores with the configured weights.

use crate::analyzer::{BasicMetrics, CoverageMetrics, Metrics, QualityMetrics, ReadabilityMetrics};
use crate::timing::TimingMetrics;
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use testbench_core::WeightsConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestAnalysisResult {
    pub basic: BasicMetrics,
    pub coverage: CoverageMetrics,
    pub quality: QualityMetrics,
    pub readability: ReadabilityMetrics,
}

impl TestAnalysisResult {
    /// Fixed-weight score in 0–100.
    pub fn score(&self) -> u32 {
        let mut score = self.basic.test_points() + self.basic.assertion_points();

        score += (self.coverage.methods_covered.len() as u32)
            .saturating_mul(10)
            .min(20);
        score += self.coverage.edge_cases_covered() as u32 * 2;
        score += (self.coverage.boundary_tests.len() as u32)
            .saturating_mul(2)
            .min(6);

        score += self.quality.flags_set() * 5;

        if self.readability.uses_backticks {
            score += 7;
        }
        if self.readability.has_comments {
            score += 7;
        }
        if self.readability.has_preferred_length() {
            score += 6;
        }

        score.min(100)
    }

    pub fn category_scores(&self, timing: Option<&TimingMetrics>) -> TestScores {
        TestScores {
            total: f64::from(self.score()),
            basic: self.basic.score(),
            coverage: self.coverage.score(),
            quality: self.quality.score(),
            readability: self.readability.score(),
            timing: timing.map(TimingMetrics::score).unwrap_or(0.0),
        }
    }

    /// Weighted mean of the category scores. 0 when the weights sum to 0.
    pub fn weighted_score(&self, weights: &WeightsConfig, timing: Option<&TimingMetrics>) -> f64 {
        self.category_scores(timing).weighted(weights)
    }
}

/// Per-category scores, each 0–100, plus the fixed score as `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TestScores {
    pub total: f64,
    pub basic: f64,
    pub coverage: f64,
    pub quality: f64,
    pub readability: f64,
    pub timing: f64,
}

impl TestScores {
    pub fn weighted(&self, weights: &WeightsConfig) -> f64 {
        let sum = weights.total();
        if !(sum.is_finite() && sum > 0.0) {
            return 0.0;
        }
        (weights.basic * self.basic
            + weights.coverage * self.coverage
            + weights.quality * self.quality
            + weights.readability * self.readability
            + weights.timing * self.timing)
            / sum
    }

    /// Component-wise division, for averaging a sum of `count` scores.
    pub fn divided_by(self, count: usize) -> TestScores {
        if count == 0 {
            return TestScores::default();
        }
        let n = count as f64;
        TestScores {
            total: self.total / n,
            basic: self.basic / n,
            coverage: self.coverage / n,
            quality: self.quality / n,
            readability: self.readability / n,
            timing: self.timing / n,
        }
    }

    pub fn average<'a>(scores: impl IntoIterator<Item = &'a TestScores>) -> TestScores {
        let mut count = 0;
        let mut sum = TestScores::default();
        for s in scores {
            sum += *s;
            count += 1;
        }
        sum.divided_by(count)
    }
}

impl Add for TestScores {
    type Output = TestScores;

    fn add(mut self, rhs: TestScores) -> TestScores {
        self += rhs;
        self
    }
}

impl AddAssign for TestScores {
    fn add_assign(&mut self, rhs: TestScores) {
        self.total += rhs.total;
        self.basic += rhs.basic;
        self.coverage += rhs.coverage;
        self.quality += rhs.quality;
        self.readability += rhs.readability;
        self.timing += rhs.timing;
    }
}

impl Sum for TestScores {
    fn sum<I: Iterator<Item = TestScores>>(iter: I) -> TestScores {
        iter.fold(TestScores::default(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::EdgeCase;
    use std::collections::BTreeSet;

    fn sample() -> TestAnalysisResult {
        TestAnalysisResult {
            basic: BasicMetrics {
                total_tests: 4,
                total_assertions: 6,
                average_assertions_per_test: 1.5,
            },
            coverage: CoverageMetrics {
                methods_covered: BTreeSet::from(["get".to_string()]),
                methods_total: 2,
                edge_cases: vec![
                    EdgeCase {
                        kind: "zero".into(),
                        covered: true,
                        description: None,
                    },
                    EdgeCase {
                        kind: "null".into(),
                        covered: false,
                        description: None,
                    },
                ],
                boundary_tests: vec!["test max".into(); 5],
                ..Default::default()
            },
            quality: QualityMetrics {
                has_descriptive_names: true,
                has_test_documentation: true,
                ..Default::default()
            },
            readability: ReadabilityMetrics {
                uses_backticks: true,
                has_comments: false,
                average_test_length: 8,
            },
        }
    }

    #[test]
    fn test_fixed_score() {
        // 12 + 15 + 10 + 2 + 6 + 10 + 7 + 0 + 6
        assert_eq!(sample().score(), 68);
    }

    #[test]
    fn test_fixed_score_is_clamped() {
        let mut result = sample();
        result.coverage.edge_cases = (0..40)
            .map(|i| EdgeCase {
                kind: format!("k{i}"),
                covered: true,
                description: None,
            })
            .collect();
        assert_eq!(result.score(), 100);
    }

    #[test]
    fn test_weighted_score() {
        let scores = TestScores {
            total: 50.0,
            basic: 100.0,
            coverage: 50.0,
            quality: 0.0,
            readability: 50.0,
            timing: 0.0,
        };
        let equal = WeightsConfig {
            basic: 0.2,
            coverage: 0.2,
            quality: 0.2,
            readability: 0.2,
            timing: 0.2,
        };
        assert!((scores.weighted(&equal) - 40.0).abs() < 1e-9);

        let only_basic = WeightsConfig {
            basic: 1.0,
            coverage: 0.0,
            quality: 0.0,
            readability: 0.0,
            timing: 0.0,
        };
        assert_eq!(scores.weighted(&only_basic), 100.0);

        let none = WeightsConfig { basic: 0.0, ..only_basic };
        assert_eq!(scores.weighted(&none), 0.0);
    }

    #[test]
    fn test_scores_average() {
        let a = TestScores {
            total: 10.0,
            basic: 20.0,
            ..Default::default()
        };
        let b = TestScores {
            total: 30.0,
            timing: 40.0,
            ..Default::default()
        };

        let avg = TestScores::average([a, b].iter());
        assert_eq!(avg.total, 20.0);
        assert_eq!(avg.basic, 10.0);
        assert_eq!(avg.timing, 20.0);

        let sum: TestScores = vec![a, b].into_iter().sum();
        assert_eq!(sum.total, 40.0);
        assert_eq!(TestScores::average(std::iter::empty()), TestScores::default());
    }
}
