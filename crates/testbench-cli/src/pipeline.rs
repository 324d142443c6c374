//! Generate-then-analyze workflow over a directory of source files.
//!
//! Nothing here prints. Commands render the returned reports in the
//! requested output format.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use testbench_core::{GeneratorKind, PromptProvider, SessionStore, TestbenchConfig, WeightsConfig};
use testbench_generators::TestGenerator;
use testbench_metrics::timing::{API_END, API_START, PROMPT_END, PROMPT_START};
use testbench_metrics::{
    ComparisonResult, GenerationResult, GeneratorStanding, Leaderboard, TestAnalysisResult,
    TestGeneratorComparator, TestQualityAnalyzer, TestScores, TimingCollector, TimingMetrics,
};
use tracing::{debug, info, warn};

/// Result of generating tests for one source file with one generator.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub generator: GeneratorKind,
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_to: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingMetrics>,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub session: u32,
    pub generators: Vec<GeneratorKind>,
    pub outcomes: Vec<FileOutcome>,
}

impl GenerationReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Comparison of all generators for one source file.
#[derive(Debug, Clone, Serialize)]
pub struct FileAnalysis {
    pub file: String,
    pub results: Vec<ComparisonResult>,
    pub report_json: PathBuf,
    pub report_text: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub files: Vec<FileAnalysis>,
    /// Source files no generator produced tests for
    pub skipped: Vec<String>,
    pub standings: Vec<GeneratorStanding>,
}

/// Score of a single source/test pair.
#[derive(Debug, Clone, Serialize)]
pub struct PairScore {
    pub source: PathBuf,
    pub test: PathBuf,
    pub score: u32,
    pub weighted_score: f64,
    pub scores: TestScores,
    pub analysis: TestAnalysisResult,
}

/// Regular files in `dir`, sorted by name.
///
/// Fails when the directory is missing, is not a directory, or holds no
/// files.
pub async fn source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let metadata = tokio::fs::metadata(dir)
        .await
        .with_context(|| format!("Source directory {} does not exist", dir.display()))?;
    if !metadata.is_dir() {
        bail!("Source path {} is not a directory", dir.display());
    }

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read source directory {}", dir.display()))?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }

    if files.is_empty() {
        bail!("Source directory {} is empty", dir.display());
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Runs every generator over every source file in a fresh session.
///
/// A file that fails is recorded in the report and skipped. `observer` is
/// called after each file.
pub async fn generate(
    config: &TestbenchConfig,
    generators: &[Box<dyn TestGenerator>],
    prompt: &dyn PromptProvider,
    mut observer: impl FnMut(&FileOutcome),
) -> Result<GenerationReport> {
    if generators.is_empty() {
        bail!("No generators selected");
    }

    let files = source_files(&config.paths.source_dir).await?;
    let store = SessionStore::new(&config.paths.results_dir);
    let kinds: Vec<GeneratorKind> = generators.iter().map(|g| g.kind()).collect();
    let session = store
        .create_session(&kinds)
        .context("Failed to create session directories")?;
    info!(session = session.number, files = files.len(), "Starting session");

    let mut outcomes = Vec::with_capacity(files.len() * generators.len());
    for generator in generators {
        let kind = generator.kind();
        info!(generator = %kind, "Generating tests");

        let mut timings: BTreeMap<String, TimingMetrics> = BTreeMap::new();
        for path in &files {
            let outcome =
                generate_file(&store, session.number, generator.as_ref(), prompt, path).await;
            if let Some(timing) = &outcome.timing {
                timings.insert(outcome.file.clone(), timing.clone());
            }
            observer(&outcome);
            outcomes.push(outcome);
        }

        if let Err(e) = store.save_timings(kind, session.number, &timings) {
            warn!(generator = %kind, "Failed to save timing metrics: {}", e);
        }
    }

    Ok(GenerationReport {
        session: session.number,
        generators: kinds,
        outcomes,
    })
}

async fn generate_file(
    store: &SessionStore,
    session: u32,
    generator: &dyn TestGenerator,
    prompt: &dyn PromptProvider,
    path: &Path,
) -> FileOutcome {
    let kind = generator.kind();
    let name = file_name(path);
    debug!(generator = %kind, file = %name, "Processing");

    let started = Instant::now();
    let mut timing = TimingCollector::new();
    timing.start();

    let result: Result<PathBuf> = async {
        timing.mark(PROMPT_START);
        let code = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let prompt_text = prompt.prompt();
        timing.mark(PROMPT_END);

        timing.mark(API_START);
        let tests = generator.generate_tests(&prompt_text, &code).await;
        timing.mark(API_END);

        let saved = store.save_test(kind, session, &name, &tests?)?;
        Ok(saved)
    }
    .await;

    timing.record_file(&name, started.elapsed());
    match result {
        Ok(saved_to) => {
            info!(generator = %kind, file = %name, "Tests saved to {}", saved_to.display());
            FileOutcome {
                generator: kind,
                file: name,
                saved_to: Some(saved_to),
                error: None,
                timing: Some(timing.metrics()),
            }
        }
        Err(e) => {
            warn!(generator = %kind, file = %name, "Generation failed: {:#}", e);
            FileOutcome {
                generator: kind,
                file: name,
                saved_to: None,
                error: Some(format!("{:#}", e)),
                timing: None,
            }
        }
    }
}

/// Collects each generator's test for `path` from `session`, or from the
/// generator's latest session when none is given.
pub fn collect_generated(
    store: &SessionStore,
    path: &Path,
    session: Option<u32>,
) -> BTreeMap<GeneratorKind, GenerationResult> {
    let name = file_name(path);
    let stem = file_stem(path);
    let mut generated = BTreeMap::new();

    for kind in GeneratorKind::ALL {
        let Some(number) = session.or_else(|| store.latest_session(kind)) else {
            continue;
        };
        match store.read_test(kind, number, &stem) {
            Ok(Some(tests)) => {
                let timing = store
                    .load_timings::<TimingMetrics>(kind, number)
                    .remove(&name);
                let mut result = GenerationResult::new(tests);
                result.timing = timing;
                generated.insert(kind, result);
            }
            Ok(None) => debug!(generator = %kind, session = number, file = %name, "No test found"),
            Err(e) => warn!(generator = %kind, file = %name, "Failed to read test: {}", e),
        }
    }

    generated
}

/// Compares the generators on every source file and writes the reports.
pub async fn analyze(config: &TestbenchConfig, session: Option<u32>) -> Result<AnalysisReport> {
    let files = source_files(&config.paths.source_dir).await?;
    let store = SessionStore::new(&config.paths.results_dir);
    let comparator = TestGeneratorComparator::new(config.weights);
    let mut leaderboard = Leaderboard::new();
    let mut analyses = Vec::new();
    let mut skipped = Vec::new();

    for path in &files {
        let name = file_name(path);
        let generated = collect_generated(&store, path, session);
        if generated.is_empty() {
            warn!(file = %name, "No generated tests to analyze");
            skipped.push(name);
            continue;
        }

        let code = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let results = comparator.compare_generators(&code, &generated);
        let reports = comparator
            .save_results(&results, &config.paths.analysis_dir.join(file_stem(path)))
            .with_context(|| format!("Failed to save reports for {}", name))?;
        leaderboard.record(&results);

        analyses.push(FileAnalysis {
            file: name,
            results,
            report_json: reports.json,
            report_text: reports.text,
        });
    }

    Ok(AnalysisReport {
        files: analyses,
        skipped,
        standings: leaderboard.standings(),
    })
}

/// Scores one generated test file against its source.
pub async fn score_pair(source: &Path, test: &Path, weights: &WeightsConfig) -> Result<PairScore> {
    let code = tokio::fs::read_to_string(source)
        .await
        .with_context(|| format!("Failed to read source {}", source.display()))?;
    let tests = tokio::fs::read_to_string(test)
        .await
        .with_context(|| format!("Failed to read test {}", test.display()))?;

    let analysis = TestQualityAnalyzer::new().analyze_test(&code, &tests);
    let scores = analysis.category_scores(None);

    Ok(PairScore {
        source: source.to_path_buf(),
        test: test.to_path_buf(),
        score: analysis.score(),
        weighted_score: scores.weighted(weights),
        scores,
        analysis,
    })
}
