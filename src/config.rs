//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.skilltrend.toml` files.

use crate::analysis::BucketingKind;
use crate::cli::OutputFormat;
use crate::source::Endpoint;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".skilltrend.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote service settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Bucketing settings.
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Remote service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the metrics service.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-read timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User-Agent header sent with every read.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_performance_path")]
    pub performance_path: String,

    #[serde(default = "default_sessions_path")]
    pub sessions_path: String,

    #[serde(default = "default_focus_path")]
    pub focus_path: String,

    #[serde(default = "default_stress_path")]
    pub stress_path: String,

    #[serde(default = "default_control_path")]
    pub control_path: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
            performance_path: default_performance_path(),
            sessions_path: default_sessions_path(),
            focus_path: default_focus_path(),
            stress_path: default_stress_path(),
            control_path: default_control_path(),
        }
    }
}

impl SourceConfig {
    /// Configured path of an endpoint.
    pub fn path_for(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::GlobalPerformance => &self.performance_path,
            Endpoint::SessionHistory => &self.sessions_path,
            Endpoint::FocusValues => &self.focus_path,
            Endpoint::StressValues => &self.stress_path,
            Endpoint::ControlValues => &self.control_path,
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("skilltrend/{}", env!("CARGO_PKG_VERSION"))
}

fn default_performance_path() -> String {
    Endpoint::GlobalPerformance.default_path().to_string()
}

fn default_sessions_path() -> String {
    Endpoint::SessionHistory.default_path().to_string()
}

fn default_focus_path() -> String {
    Endpoint::FocusValues.default_path().to_string()
}

fn default_stress_path() -> String {
    Endpoint::StressValues.default_path().to_string()
}

fn default_control_path() -> String {
    Endpoint::ControlValues.default_path().to_string()
}

/// How session records are bucketed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Bucket key strategy.
    #[serde(default)]
    pub bucketing: BucketingKind,

    /// Locale for month names (e.g. `en_US`, `pt_BR`).
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            bucketing: BucketingKind::default(),
            locale: default_locale(),
        }
    }
}

fn default_locale() -> String {
    "en_US".to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Decimals shown for averages.
    #[serde(default = "default_decimals")]
    pub decimals: usize,

    /// Write the report here instead of stdout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            decimals: default_decimals(),
            output: None,
        }
    }
}

fn default_decimals() -> usize {
    2
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from a directory.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Try to load configuration from the working directory.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence, but only when explicitly provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref base_url) = args.base_url {
            self.source.base_url = base_url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.source.timeout_seconds = timeout;
        }

        if let Some(bucketing) = args.bucketing {
            self.aggregation.bucketing = bucketing;
        }
        if let Some(ref locale) = args.locale {
            self.aggregation.locale = locale.clone();
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(decimals) = args.decimals {
            self.report.decimals = decimals;
        }
        if let Some(ref output) = args.output {
            self.report.output = Some(output.display().to_string());
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
