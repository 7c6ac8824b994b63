//! SkillTrend - monthly self-assessment metrics aggregator
//!
//! A CLI tool that reads questionnaire sessions and skill metrics from a
//! remote JSON service, groups the sessions by month and prints averaged
//! skill scores.
//!
//! Exit codes:
//!   0 - Run finished and the session history was usable
//!   1 - Runtime error (configuration, output, client setup, etc.)
//!   2 - Run finished but the session history could not be read

mod analysis;
mod cli;
mod config;
mod models;
mod pipeline;
mod report;
mod source;

use analysis::Bucketing;
use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use models::{AggregationResult, RunStatus};
use pipeline::{Orchestrator, OrchestratorConfig};
use source::{Endpoint, HttpSource};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("SkillTrend v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .skilltrend.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("Created {} with default settings.", CONFIG_FILE_NAME);
    Ok(())
}

/// Initialize logging. `RUST_LOG` wins over the verbosity flags.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

/// Run one aggregation and write the report. Returns the exit code.
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let bucketing = Bucketing::from_config(&config.aggregation)?;
    let read_timeout = Duration::from_secs(config.source.timeout_seconds);

    info!("Reading metrics from {}", config.source.base_url);
    let source = HttpSource::new(config.source.clone())?;
    for endpoint in Endpoint::ALL {
        debug!("{} -> {}", endpoint, source.url_for(endpoint));
    }

    let orchestrator = Orchestrator::new(
        Arc::new(source),
        bucketing,
        OrchestratorConfig { read_timeout },
    );

    let spinner = spawn_loading_spinner(orchestrator.subscribe(), args.quiet);
    let result = orchestrator.run().await;
    if let Err(e) = spinner.await {
        warn!("Loading indicator task failed: {}", e);
    }

    let output = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&result)?,
        OutputFormat::Text => report::generate_text_report(&result, config.report.decimals),
    };

    match config.report.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path))?;
            info!("Report saved to {}", path);
        }
        None => print!("{}", output),
    }

    Ok(exit_code(&result))
}

/// Show a spinner until the published status leaves `loading`.
fn spawn_loading_spinner(
    mut status: watch::Receiver<AggregationResult>,
    quiet: bool,
) -> tokio::task::JoinHandle<()> {
    let spinner = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(report::generator::LOADING_MESSAGE);
    spinner.enable_steady_tick(Duration::from_millis(120));

    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            if status.borrow_and_update().status.is_terminal() {
                break;
            }
        }
        spinner.finish_and_clear();
    })
}

fn exit_code(result: &AggregationResult) -> i32 {
    match result.status {
        RunStatus::Error => 2,
        RunStatus::Ready | RunStatus::Loading => 0,
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
