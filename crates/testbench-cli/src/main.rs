//! Testbench CLI - generate unit tests with LLMs and score them.
//!
//! # Usage
//!
//! ```bash
//! # Generate tests for every file in the source directory
//! testbench generate --gpt --gemini
//!
//! # Score the latest session of each generator
//! testbench analyze
//!
//! # Both in one go, offline
//! testbench run --mock
//!
//! # Score a single test file
//! testbench score src/Fibonacci.kt FibonacciTest.kt
//! ```

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process;
use testbench_cli::{OutputFormat, commands, init_logging, output};
use testbench_core::{GeneratorKind, TestbenchConfig};

#[derive(Parser)]
#[command(name = "testbench")]
#[command(about = "Testbench - compare LLM-generated unit tests", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "TESTBENCH_CONFIG")]
    config: Option<PathBuf>,

    /// Output format (human, json, plain)
    #[arg(long, global = true, default_value = "human")]
    format: OutputFormatArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormatArg {
    Human,
    Json,
    Plain,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Plain => OutputFormat::Plain,
        }
    }
}

#[derive(Args, Clone, Debug, Default)]
struct GeneratorArgs {
    /// Use OpenAI GPT
    #[arg(long)]
    gpt: bool,

    /// Use Google Gemini
    #[arg(long)]
    gemini: bool,

    /// Use CodeLlama
    #[arg(long)]
    codellama: bool,

    /// Use the offline mock generator
    #[arg(long)]
    mock: bool,

    /// Custom prompt sent with each source file
    #[arg(short, long)]
    prompt: Option<String>,
}

impl GeneratorArgs {
    fn kinds(&self) -> Vec<GeneratorKind> {
        [
            (self.gpt, GeneratorKind::Gpt),
            (self.gemini, GeneratorKind::Gemini),
            (self.codellama, GeneratorKind::CodeLlama),
            (self.mock, GeneratorKind::Mock),
        ]
        .into_iter()
        .filter_map(|(on, kind)| on.then_some(kind))
        .collect()
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate tests for every source file in a new session
    Generate(GeneratorArgs),

    /// Score stored tests and write comparison reports
    Analyze {
        /// Session to analyze (default: latest per generator)
        #[arg(short, long)]
        session: Option<u32>,
    },

    /// Generate, then analyze the new session
    Run(GeneratorArgs),

    /// Score one test file against its source
    Score {
        /// Source file the tests were written for
        source: PathBuf,

        /// Test file to score
        test: PathBuf,
    },

    /// List result sessions
    Sessions,

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        output::error(format!("{:#}", e));
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = OutputFormat::from(cli.format);
    if format == OutputFormat::Plain {
        console::set_colors_enabled(false);
    }

    let logging = init_logging(cli.verbose);

    // Init must work before a config file exists
    if let Commands::Config(ConfigCommands::Init { force }) = cli.command {
        return commands::config_init(cli.config, force).await;
    }

    let mut config = TestbenchConfig::load_or_default(cli.config.as_deref()).await?;
    config.merge_env_vars();
    config.validate()?;
    logging.apply_config_level(&config.general.log_level);

    match cli.command {
        Commands::Generate(args) => {
            commands::generate(&config, &args.kinds(), args.prompt, format).await?;
        }
        Commands::Analyze { session } => {
            commands::analyze(&config, session, format).await?;
        }
        Commands::Run(args) => {
            commands::run(&config, &args.kinds(), args.prompt, format).await?;
        }
        Commands::Score { source, test } => {
            commands::score(&config, &source, &test, format).await?;
        }
        Commands::Sessions => {
            commands::sessions(&config, format).await?;
        }
        Commands::Config(ConfigCommands::Show) => {
            commands::config_show(&config, format).await?;
        }
        Commands::Config(ConfigCommands::Init { .. }) => {}
    }

    Ok(())
}
