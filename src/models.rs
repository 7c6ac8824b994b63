//! Data models for the metrics aggregator.
//!
//! This module contains the core data structures shared by the
//! normalizer, the aggregators, the orchestrator and the report writer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar that is either a computed value or explicitly unavailable.
///
/// Unavailable is distinct from zero: it means the source could not be
/// read, returned nothing usable, or had nothing to average.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// A finite computed value.
    Available(f64),
    /// No value could be produced. Serialized as `null`.
    #[default]
    Unavailable,
}

impl Scalar {
    /// Returns the inner value, if any.
    pub fn value(&self) -> Option<f64> {
        match self {
            Scalar::Available(v) => Some(*v),
            Scalar::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Scalar::Available(_))
    }

    /// Formats the value with a fixed number of decimals, or `N/A`.
    pub fn display(&self, decimals: usize) -> String {
        match self.value() {
            Some(v) => format!("{:.*}", decimals, v),
            None => "N/A".to_string(),
        }
    }
}

impl From<Option<f64>> for Scalar {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => Scalar::Available(v),
            _ => Scalar::Unavailable,
        }
    }
}

/// Lifecycle state of one aggregation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Reads are still in flight.
    Loading,
    /// All reads settled and the session history was usable.
    Ready,
    /// The session history read failed.
    Error,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Loading => write!(f, "loading"),
            RunStatus::Ready => write!(f, "ready"),
            RunStatus::Error => write!(f, "error"),
        }
    }
}

impl RunStatus {
    /// Returns true once the run can no longer change.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Loading)
    }
}

/// One validated self-assessment submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// When the assessment was last updated.
    pub updated_at: DateTime<Utc>,
    /// Stress management score (first answer).
    pub stress: f64,
    /// Focus score (second answer).
    pub focus: f64,
    /// Impulse control score (third answer).
    pub control: f64,
}

/// Per-bucket means of the three skill dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyAggregate {
    /// Bucket label (a month name by default).
    pub month: String,
    pub stress_mean: f64,
    pub focus_mean: f64,
    pub control_mean: f64,
}

/// The four independent summary values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalScalars {
    /// Overall performance, passed through from its source.
    pub performance_global: Scalar,
    /// Mean of the focus values.
    pub focus_value: Scalar,
    /// Mean of the stress values.
    pub stress_value: Scalar,
    /// Mean of the control values.
    pub control_value: Scalar,
}

/// The complete output of one orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    /// Where the run is in its lifecycle.
    pub status: RunStatus,
    /// Summary scalars.
    pub global_scalars: GlobalScalars,
    /// Month series in first-seen bucket order.
    pub monthly_series: Vec<MonthlyAggregate>,
    /// Session records dropped by the normalizer.
    pub excluded_records: usize,
}

impl AggregationResult {
    /// A fresh result in the loading state with every value unavailable.
    pub fn loading() -> Self {
        Self {
            status: RunStatus::Loading,
            global_scalars: GlobalScalars::default(),
            monthly_series: Vec::new(),
            excluded_records: 0,
        }
    }
}

impl Default for AggregationResult {
    fn default() -> Self {
        Self::loading()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_display() {
        assert_eq!(Scalar::Available(72.456).display(2), "72.46");
        assert_eq!(Scalar::Available(3.0).display(0), "3");
        assert_eq!(Scalar::Unavailable.display(2), "N/A");
    }

    #[test]
    fn test_scalar_from_option_rejects_non_finite() {
        assert_eq!(Scalar::from(Some(1.5)), Scalar::Available(1.5));
        assert_eq!(Scalar::from(Some(f64::NAN)), Scalar::Unavailable);
        assert_eq!(Scalar::from(Some(f64::INFINITY)), Scalar::Unavailable);
        assert_eq!(Scalar::from(None), Scalar::Unavailable);
    }

    #[test]
    fn test_scalar_zero_is_available() {
        let zero = Scalar::Available(0.0);
        assert!(zero.is_available());
        assert_eq!(zero.value(), Some(0.0));
    }

    #[test]
    fn test_scalar_serializes_unavailable_as_null() {
        let scalars = GlobalScalars {
            performance_global: Scalar::Available(80.0),
            ..GlobalScalars::default()
        };
        let json = serde_json::to_value(scalars).unwrap();
        assert_eq!(json["performanceGlobal"], serde_json::json!(80.0));
        assert!(json["focusValue"].is_null());
    }

    #[test]
    fn test_status_terminal() {
        assert!(!RunStatus::Loading.is_terminal());
        assert!(RunStatus::Ready.is_terminal());
        assert!(RunStatus::Error.is_terminal());
        assert_eq!(RunStatus::Error.to_string(), "error");
    }

    #[test]
    fn test_loading_result_is_empty() {
        let result = AggregationResult::loading();
        assert_eq!(result.status, RunStatus::Loading);
        assert!(result.monthly_series.is_empty());
        assert!(!result.global_scalars.focus_value.is_available());
    }
}
