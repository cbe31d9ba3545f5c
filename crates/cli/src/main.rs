//! Critik E2E CLI - Main Entry Point
//!
//! Runs the full end-to-end check sequence against a Critik backend and
//! exits non-zero when any check fails.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use critik_e2e::{HarnessConfig, Recorder, TestRunner};
use tracing::debug;

mod output;

use output::OutputFormat;

/// Exit code for errors raised before any check runs
const EXIT_HARNESS_ERROR: i32 = 2;

/// Critik E2E - end-to-end API checks for the Critik backend
#[derive(Parser, Debug)]
#[command(name = "critik-e2e")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Backend base URL (overrides config file and CRITIK_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// YAML configuration file
    #[arg(long, env = "CRITIK_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Disable colored check tags
    #[arg(long)]
    no_color: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_HARNESS_ERROR
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = load_config(&cli)?;
    debug!(?config, "resolved configuration");

    let runner = TestRunner::new(config).context("invalid harness configuration")?;
    let mut recorder = Recorder::stdout();
    let report = runner.run(&mut recorder).await;

    output::print_report(&report, cli.format)?;
    Ok(output::exit_code(&report))
}

/// Defaults, then the config file, then environment, then flags
fn load_config(cli: &Cli) -> anyhow::Result<HarnessConfig> {
    let mut config = match &cli.config {
        Some(path) => HarnessConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => HarnessConfig::default(),
    };
    config.apply_env()?;
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    Ok(config)
}
