//! Heuristic quality scoring for generated unit tests.
//!
//! The scorer never parses code. It runs line-oriented regex scans over the
//! original source and the generated test text and combines the counts
//! into a 0–100 score.
//!
//! ## Metric families
//!
//! - **Basic**: number of `@Test` functions and assertion lines
//! - **Coverage**: which source methods the tests mention, edge-case tags,
//!   boundary tests and heuristic line/branch/condition/statement/path ratios
//! - **Quality**: descriptive names, assertion variety, documentation,
//!   naming conventions
//! - **Readability**: backtick names, comments, average test length
//! - **Timing**: how long prompt building and the API call took
//!
//! ## Usage
//!
//! ```
//! use testbench_metrics::TestQualityAnalyzer;
//!
//! let code = "fun sum(a: Int, b: Int): Int = a + b";
//! let test = "@Test\nfun `sum adds two numbers`() {\n    assertEquals(3, sum(1, 2))\n}";
//!
//! let analysis = TestQualityAnalyzer::new().analyze_test(code, test);
//! assert_eq!(analysis.basic.total_tests, 1);
//! assert!(analysis.coverage.methods_covered.contains("sum"));
//! ```

pub mod analyzer;
pub mod parser;
pub mod scoring;
pub mod timing;
pub mod comparison;
pub mod leaderboard;

pub use analyzer::{
    BasicMetrics, CoverageMetrics, EdgeCase, Metrics, MetricsAnalyzer, QualityMetrics,
    ReadabilityMetrics, TestQualityAnalyzer,
};
pub use parser::{CodeParser, ParseResult};
pub use scoring::{TestAnalysisResult, TestScores};
pub use timing::{TimingCollector, TimingMetrics};
pub use comparison::{ComparisonResult, GenerationResult, ReportFiles, TestGeneratorComparator};
pub use leaderboard::{GeneratorStanding, Leaderboard};
