//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Settings left unset here fall back to the
//! configuration file, then to built-in defaults.

use crate::analysis::BucketingKind;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// SkillTrend - monthly self-assessment metrics aggregator
///
/// Reads session questionnaires and skill metrics from a remote service
/// and prints month-by-month averages plus global skill scores.
///
/// Examples:
///   skilltrend
///   skilltrend --base-url http://127.0.0.1:5000 --locale pt_BR
///   skilltrend --bucketing year-month --format json --output metrics.json
///   skilltrend --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Base URL of the metrics service
    #[arg(long, value_name = "URL", env = "SKILLTREND_BASE_URL")]
    pub base_url: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .skilltrend.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Per-read timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// How session records are grouped
    ///
    /// month-name merges the same month across years; year-month keeps them apart.
    #[arg(long, value_name = "KIND")]
    pub bucketing: Option<BucketingKind>,

    /// Locale for month names (e.g. en_US, pt_BR)
    #[arg(long, value_name = "LOCALE")]
    pub locale: Option<String>,

    /// Output format (text, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Decimals shown for averages
    #[arg(long, value_name = "N")]
    pub decimals: Option<usize>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .skilltrend.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text summary (default)
    #[default]
    Text,
    /// JSON document
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Base URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(decimals) = self.decimals {
            if decimals > 10 {
                return Err("Decimals must be between 0 and 10".to_string());
            }
        }

        if let Some(ref locale) = self.locale {
            if locale.trim().is_empty() {
                return Err("Locale must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_args() -> Args {
        Args {
            base_url: None,
            config: None,
            timeout: None,
            bucketing: None,
            locale: None,
            format: None,
            output: None,
            decimals: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_defaults_pass() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.base_url = Some("127.0.0.1:5000".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_init_config_skips_validation() {
        let mut args = make_args();
        args.base_url = Some("bogus".to_string());
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "skilltrend",
            "--bucketing",
            "year-month",
            "--format",
            "json",
            "--locale",
            "pt_BR",
        ])
        .unwrap();
        assert_eq!(args.bucketing, Some(BucketingKind::YearMonth));
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert_eq!(args.locale.as_deref(), Some("pt_BR"));
    }
}
