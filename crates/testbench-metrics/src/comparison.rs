//! Side-by-side comparison of the generators on one source file.

use crate::analyzer::TestQualityAnalyzer;
use crate::scoring::{TestAnalysisResult, TestScores};
use crate::timing::TimingMetrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use testbench_core::{GeneratorKind, Result, WeightsConfig};
use tracing::{debug, info};

/// Tests produced by one generator for one source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub tests: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingMetrics>,
}

impl GenerationResult {
    pub fn new(tests: impl Into<String>) -> Self {
        Self {
            tests: tests.into(),
            timing: None,
        }
    }

    pub fn with_timing(mut self, timing: TimingMetrics) -> Self {
        self.timing = Some(timing);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub generator: GeneratorKind,
    pub analysis: TestAnalysisResult,
    /// Fixed-weight score used for ranking
    pub score: u32,
    pub scores: TestScores,
    pub weighted_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingMetrics>,
    pub timestamp: DateTime<Utc>,
}

/// Paths written by [`TestGeneratorComparator::save_results`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFiles {
    pub json: PathBuf,
    pub text: PathBuf,
}

#[derive(Debug, Clone)]
pub struct TestGeneratorComparator {
    analyzer: TestQualityAnalyzer,
    weights: WeightsConfig,
}

impl Default for TestGeneratorComparator {
    fn default() -> Self {
        Self::new(WeightsConfig::default())
    }
}

impl TestGeneratorComparator {
    pub fn new(weights: WeightsConfig) -> Self {
        Self {
            analyzer: TestQualityAnalyzer::new(),
            weights,
        }
    }

    pub fn weights(&self) -> &WeightsConfig {
        &self.weights
    }

    /// Analyzes every generator's output and ranks them, best first.
    pub fn compare_generators(
        &self,
        original_code: &str,
        generated: &BTreeMap<GeneratorKind, GenerationResult>,
    ) -> Vec<ComparisonResult> {
        let timestamp = Utc::now();
        let mut results: Vec<ComparisonResult> = generated
            .iter()
            .map(|(kind, result)| {
                let analysis = self.analyzer.analyze_test(original_code, &result.tests);
                let scores = analysis.category_scores(result.timing.as_ref());
                debug!(generator = %kind, score = analysis.score(), "Analyzed generated tests");

                ComparisonResult {
                    generator: *kind,
                    score: analysis.score(),
                    weighted_score: scores.weighted(&self.weights),
                    scores,
                    analysis,
                    timing: result.timing.clone(),
                    timestamp,
                }
            })
            .collect();

        results.sort_by(rank);
        results
    }

    /// Writes `comparison_report_<millis>.json` and `.txt` into `dir`.
    pub fn save_results(&self, results: &[ComparisonResult], dir: &Path) -> Result<ReportFiles> {
        fs::create_dir_all(dir)?;

        let stamp = Utc::now().timestamp_millis();
        let json = dir.join(format!("comparison_report_{stamp}.json"));
        let text = dir.join(format!("comparison_report_{stamp}.txt"));

        fs::write(&json, serde_json::to_string_pretty(results)?)?;
        fs::write(&text, text_report(results))?;

        info!(json = %json.display(), "Saved comparison report");
        Ok(ReportFiles { json, text })
    }
}

fn rank(a: &ComparisonResult, b: &ComparisonResult) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| {
            b.weighted_score
                .partial_cmp(&a.weighted_score)
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.generator.cmp(&b.generator))
}

pub fn text_report(results: &[ComparisonResult]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Test Generator Comparison Report");
    let _ = writeln!(out, "================================");

    for (index, result) in results.iter().enumerate() {
        let a = &result.analysis;
        let methods: Vec<&str> = a.coverage.methods_covered.iter().map(String::as_str).collect();

        let _ = writeln!(out);
        let _ = writeln!(out, "{}. {}", index + 1, result.generator);
        let _ = writeln!(out, "Score: {}", result.score);
        let _ = writeln!(out, "Weighted Score: {:.1}", result.weighted_score);
        let _ = writeln!(out, "Basic Metrics:");
        let _ = writeln!(out, "  - Total Tests: {}", a.basic.total_tests);
        let _ = writeln!(out, "  - Total Assertions: {}", a.basic.total_assertions);
        let _ = writeln!(
            out,
            "  - Avg Assertions per Test: {:.2}",
            a.basic.average_assertions_per_test
        );
        let _ = writeln!(out, "Coverage:");
        let _ = writeln!(
            out,
            "  - Methods Covered: [{}] of {}",
            methods.join(", "),
            a.coverage.methods_total
        );
        let _ = writeln!(
            out,
            "  - Edge Cases: {}/{}",
            a.coverage.edge_cases_covered(),
            a.coverage.edge_cases.len()
        );
        let _ = writeln!(out, "  - Boundary Tests: {}", a.coverage.boundary_tests.len());
        let _ = writeln!(
            out,
            "  - Line/Branch/Condition/Statement/Path: {:.2}/{:.2}/{:.2}/{:.2}/{:.2}",
            a.coverage.line_coverage,
            a.coverage.branch_coverage,
            a.coverage.condition_coverage,
            a.coverage.statement_coverage,
            a.coverage.path_coverage
        );
        let _ = writeln!(out, "Quality:");
        let _ = writeln!(out, "  - Descriptive Names: {}", a.quality.has_descriptive_names);
        let _ = writeln!(out, "  - Assertion Variety: {}", a.quality.uses_assertion_variety);
        let _ = writeln!(out, "  - Documentation: {}", a.quality.has_test_documentation);
        let _ = writeln!(
            out,
            "  - Naming Conventions: {}",
            a.quality.follows_naming_conventions
        );
        let _ = writeln!(out, "Readability:");
        let _ = writeln!(out, "  - Uses Backticks: {}", a.readability.uses_backticks);
        let _ = writeln!(out, "  - Has Comments: {}", a.readability.has_comments);
        let _ = writeln!(
            out,
            "  - Average Test Length: {}",
            a.readability.average_test_length
        );
        if let Some(timing) = &result.timing {
            let _ = writeln!(out, "Timing:");
            let _ = writeln!(out, "  - API Call: {} ms", timing.api_call_time_ms);
            let _ = writeln!(
                out,
                "  - Total Processing: {} ms",
                timing.total_processing_time_ms()
            );
        }
    }

    out
}
