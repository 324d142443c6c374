//! Command implementations for the testbench CLI.

use crate::output::{self, OutputFormat, TableBuilder};
use crate::pipeline::{self, AnalysisReport, FileOutcome, GenerationReport, PairScore};
use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::time::Duration;
use testbench_core::config::DEFAULT_CONFIG_FILE;
use testbench_core::{GeneratorKind, GeneratorsConfig, SessionStore, SimplePrompt, TestbenchConfig};
use testbench_generators::{TestGenerator, create_generator};
use testbench_metrics::{GeneratorStanding, TimingMetrics};
use tracing::warn;

/// Generators to run: the explicitly selected ones, else the configured
/// default set.
pub fn selected_kinds(selected: &[GeneratorKind], config: &TestbenchConfig) -> Vec<GeneratorKind> {
    let kinds = if selected.is_empty() {
        &config.generators.enabled
    } else {
        selected
    };
    let mut kinds = kinds.to_vec();
    kinds.sort();
    kinds.dedup();
    kinds
}

/// Builds a generator per kind, skipping backends that cannot be created.
pub fn build_generators(
    kinds: &[GeneratorKind],
    config: &GeneratorsConfig,
    format: OutputFormat,
) -> Vec<Box<dyn TestGenerator>> {
    let mut generators = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        match create_generator(kind, config) {
            Ok(generator) => generators.push(generator),
            Err(e) => {
                warn!(generator = %kind, "Skipping generator: {}", e);
                if !format.is_json() {
                    output::warning(format!("Skipping {}: {}", kind, e));
                }
            }
        }
    }
    generators
}

async fn run_generation(
    config: &TestbenchConfig,
    selected: &[GeneratorKind],
    prompt: Option<String>,
    format: OutputFormat,
) -> Result<GenerationReport> {
    let kinds = selected_kinds(selected, config);
    if kinds.is_empty() {
        bail!("No generators selected. Pass --gpt, --gemini, --codellama or --mock");
    }

    let generators = build_generators(&kinds, &config.generators, format);
    if generators.is_empty() {
        bail!("None of the selected generators could be created");
    }

    let prompt = SimplePrompt::new(prompt.or_else(|| Some(config.prompt.text.clone())));
    let spinner = output::spinner("Generating tests...", format);
    let report = pipeline::generate(config, &generators, &prompt, |outcome: &FileOutcome| {
        spinner.set_message(format!("{}: {}", outcome.generator, outcome.file));
    })
    .await;
    spinner.finish_and_clear();
    report
}

/// Generate tests for every source file with the selected generators.
pub async fn generate(
    config: &TestbenchConfig,
    selected: &[GeneratorKind],
    prompt: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let report = run_generation(config, selected, prompt, format).await?;

    if format.is_json() {
        return output::output(&report);
    }
    print_generation(&report);
    Ok(())
}

fn print_generation(report: &GenerationReport) {
    output::header(format!("Session {}", report.session));

    let mut table = TableBuilder::new().header(vec!["Generator", "File", "Status", "Time"]);
    for outcome in &report.outcomes {
        let status = match &outcome.error {
            None => "saved".to_string(),
            Some(e) => format!("failed: {}", e),
        };
        let time = outcome
            .timing
            .as_ref()
            .map(|t| output::format_duration(Duration::from_millis(t.total_generation_time_ms)))
            .unwrap_or_else(|| "-".to_string());
        table = table.row(vec![
            outcome.generator.to_string(),
            outcome.file.clone(),
            status,
            time,
        ]);
    }
    table.print();

    if report.failed() == 0 {
        output::success(format!(
            "Generated {} test files in session {}",
            report.succeeded(),
            report.session
        ));
    } else {
        output::warning(format!(
            "Generated {} test files, {} failed",
            report.succeeded(),
            report.failed()
        ));
    }
}

/// Score stored tests and write comparison reports.
pub async fn analyze(config: &TestbenchConfig, session: Option<u32>, format: OutputFormat) -> Result<()> {
    let spinner = output::spinner("Analyzing generated tests...", format);
    let report = pipeline::analyze(config, session).await;
    spinner.finish_and_clear();
    let report = report?;

    if format.is_json() {
        return output::output(&report);
    }
    print_analysis(&report, &config.paths.analysis_dir);
    Ok(())
}

fn print_analysis(report: &AnalysisReport, analysis_dir: &Path) {
    for file in &report.files {
        output::header(&file.file);
        let mut table = TableBuilder::new().header(vec![
            "Rank", "Generator", "Score", "Weighted", "Tests", "Assertions", "Coverage", "Time",
        ]);
        for (rank, result) in file.results.iter().enumerate() {
            table = table.row(vec![
                (rank + 1).to_string(),
                result.generator.to_string(),
                result.score.to_string(),
                format!("{:.1}", result.weighted_score),
                result.analysis.basic.total_tests.to_string(),
                result.analysis.basic.total_assertions.to_string(),
                format!("{:.1}", result.scores.coverage),
                timing_cell(result.timing.as_ref()),
            ]);
        }
        table.print();
        output::kv("Report", file.report_text.display());
    }

    for skipped in &report.skipped {
        output::warning(format!("No generated tests for {}", skipped));
    }

    if report.files.is_empty() {
        output::info("Nothing to analyze. Run 'testbench generate' first");
        return;
    }

    print_standings(&report.standings);
    output::success(format!(
        "Analyzed {} files, reports in {}",
        report.files.len(),
        analysis_dir.display()
    ));
}

fn timing_cell(timing: Option<&TimingMetrics>) -> String {
    match timing {
        Some(t) if !t.is_empty() => {
            output::format_duration(Duration::from_millis(t.total_generation_time_ms))
        }
        _ => "-".to_string(),
    }
}

fn print_standings(standings: &[GeneratorStanding]) {
    output::header("Leaderboard");
    let mut table = TableBuilder::new().header(vec![
        "Rank", "Generator", "Files", "Wins", "Avg score", "Avg weighted",
    ]);
    for standing in standings {
        table = table.row(vec![
            standing.rank.to_string(),
            standing.generator.to_string(),
            standing.files.to_string(),
            standing.wins.to_string(),
            format!("{:.1}", standing.average.total),
            format!("{:.1}", standing.average_weighted),
        ]);
    }
    table.print();
}

/// Generate then immediately analyze the new session.
pub async fn run(
    config: &TestbenchConfig,
    selected: &[GeneratorKind],
    prompt: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let generation = run_generation(config, selected, prompt, format).await?;
    if generation.succeeded() == 0 {
        bail!("No tests were generated in session {}", generation.session);
    }

    let spinner = output::spinner("Analyzing generated tests...", format);
    let analysis = pipeline::analyze(config, Some(generation.session)).await;
    spinner.finish_and_clear();
    let analysis = analysis?;

    if format.is_json() {
        return output::output(&serde_json::json!({
            "generation": generation,
            "analysis": analysis,
        }));
    }
    print_generation(&generation);
    print_analysis(&analysis, &config.paths.analysis_dir);
    Ok(())
}

/// Score a single test file against its source.
pub async fn score(
    config: &TestbenchConfig,
    source: &Path,
    test: &Path,
    format: OutputFormat,
) -> Result<()> {
    let score = pipeline::score_pair(source, test, &config.weights).await?;
    if format.is_json() {
        return output::output(&score);
    }
    print_score(&score);
    Ok(())
}

fn print_score(score: &PairScore) {
    let analysis = &score.analysis;
    output::header(format!("{} vs {}", score.test.display(), score.source.display()));
    output::kv("Score", score.score);
    output::kv("Weighted", format!("{:.1}", score.weighted_score));

    output::header("Basic");
    output::kv("Tests", analysis.basic.total_tests);
    output::kv("Assertions", analysis.basic.total_assertions);
    output::kv(
        "Assertions per test",
        format!("{:.2}", analysis.basic.average_assertions_per_test),
    );

    output::header("Coverage");
    let coverage = &analysis.coverage;
    output::kv(
        "Methods",
        format!(
            "{}/{} ({})",
            coverage.methods_covered.len(),
            coverage.methods_total,
            coverage
                .methods_covered
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        ),
    );
    output::kv(
        "Edge cases",
        format!("{}/{}", coverage.edge_cases_covered(), coverage.edge_cases.len()),
    );
    output::kv("Boundary tests", coverage.boundary_tests.len());
    output::kv("Line", format!("{:.2}", coverage.line_coverage));
    output::kv("Branch", format!("{:.2}", coverage.branch_coverage));
    output::kv("Condition", format!("{:.2}", coverage.condition_coverage));
    output::kv("Statement", format!("{:.2}", coverage.statement_coverage));
    output::kv("Path", format!("{:.2}", coverage.path_coverage));

    output::header("Quality");
    let quality = &analysis.quality;
    output::kv("Descriptive names", output::flag(quality.has_descriptive_names));
    output::kv("Assertion variety", output::flag(quality.uses_assertion_variety));
    output::kv("Documentation", output::flag(quality.has_test_documentation));
    output::kv("Naming conventions", output::flag(quality.follows_naming_conventions));

    output::header("Readability");
    let readability = &analysis.readability;
    output::kv("Backtick names", output::flag(readability.uses_backticks));
    output::kv("Comments", output::flag(readability.has_comments));
    output::kv("Average test length", readability.average_test_length);
}

/// List sessions found under the results directory.
pub async fn sessions(config: &TestbenchConfig, format: OutputFormat) -> Result<()> {
    let store = SessionStore::new(&config.paths.results_dir);
    let sessions = store.list_sessions();

    if format.is_json() {
        return output::output(&sessions);
    }
    if sessions.is_empty() {
        output::info(format!(
            "No sessions in {}. Run 'testbench generate' first",
            config.paths.results_dir.display()
        ));
        return Ok(());
    }

    let mut table = TableBuilder::new().header(vec!["Session", "Generators"]);
    for session in &sessions {
        let generators = session
            .generators
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        table = table.row(vec![session.number.to_string(), generators]);
    }
    table.print();
    Ok(())
}

fn redact(key: &mut Option<String>) {
    if key.as_deref().is_some_and(|k| !k.is_empty()) {
        *key = Some("****".to_string());
    }
}

/// Effective configuration with API keys masked.
pub fn redacted(config: &TestbenchConfig) -> TestbenchConfig {
    let mut config = config.clone();
    redact(&mut config.generators.gpt.api_key);
    redact(&mut config.generators.gemini.api_key);
    redact(&mut config.generators.codellama.api_key);
    config
}

/// Print the effective configuration.
pub async fn config_show(config: &TestbenchConfig, format: OutputFormat) -> Result<()> {
    let config = redacted(config);
    if format.is_json() {
        return output::output(&config);
    }
    print!("{}", config.to_toml_string()?);
    Ok(())
}

/// Write the default configuration file.
pub async fn config_init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    if tokio::fs::try_exists(&path).await.unwrap_or(false) && !force {
        bail!("{} already exists. Use --force to overwrite", path.display());
    }

    TestbenchConfig::default()
        .save_to_path(&path)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    output::success(format!("Wrote default configuration to {}", path.display()));
    Ok(())
}
