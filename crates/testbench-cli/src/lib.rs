//! Command-line front end for the testbench harness.

pub mod commands;
pub mod logging;
pub mod output;
pub mod pipeline;

pub use logging::{LogHandle, init_logging};
pub use output::OutputFormat;
pub use pipeline::{AnalysisReport, FileAnalysis, FileOutcome, GenerationReport, PairScore};
