//! Bucket keys for the monthly series.
//!
//! The aggregator only needs a `timestamp -> label` function; this module
//! provides the two built-in strategies and the config plumbing for them.

use crate::config::AggregationConfig;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Locale, Utc};
use serde::{Deserialize, Serialize};

/// Maps a timestamp to the label of the bucket it falls in.
pub trait BucketKey {
    fn key(&self, timestamp: &DateTime<Utc>) -> String;
}

impl<F> BucketKey for F
where
    F: Fn(&DateTime<Utc>) -> String,
{
    fn key(&self, timestamp: &DateTime<Utc>) -> String {
        self(timestamp)
    }
}

/// Configurable bucketing strategy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum BucketingKind {
    /// Localized month name. The same month of different years shares a bucket.
    #[default]
    MonthName,
    /// `YYYY-MM`, one bucket per calendar month.
    YearMonth,
}

/// A resolved bucketing strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bucketing {
    MonthName(Locale),
    YearMonth,
}

impl Bucketing {
    /// Resolve the configured strategy, validating the locale name.
    pub fn from_config(config: &AggregationConfig) -> Result<Self> {
        match config.bucketing {
            BucketingKind::MonthName => {
                let locale = Locale::try_from(config.locale.as_str())
                    .map_err(|_| anyhow!("Unknown locale: {}", config.locale))?;
                Ok(Bucketing::MonthName(locale))
            }
            BucketingKind::YearMonth => Ok(Bucketing::YearMonth),
        }
    }
}

impl Default for Bucketing {
    fn default() -> Self {
        Bucketing::MonthName(Locale::en_US)
    }
}

impl BucketKey for Bucketing {
    fn key(&self, timestamp: &DateTime<Utc>) -> String {
        match self {
            Bucketing::MonthName(locale) => timestamp.format_localized("%B", *locale).to_string(),
            Bucketing::YearMonth => timestamp.format("%Y-%m").to_string(),
        }
    }
}
