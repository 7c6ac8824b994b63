//! Degrade policy: turns the five settled reads into one result.
//!
//! Each field is decided independently. A failed or unusable read only
//! makes its own field unavailable; a failed session history additionally
//! marks the run as `error`.

use crate::analysis::{aggregate, averager, normalize_all, BucketKey};
use crate::models::{AggregationResult, GlobalScalars, RunStatus, Scalar};
use crate::source::{payload, Endpoint, ReadError};
use serde_json::Value;
use tracing::warn;

/// Outcome of every read of one run.
#[derive(Debug, Clone)]
pub struct SettledReads {
    pub performance: Result<Value, ReadError>,
    pub sessions: Result<Value, ReadError>,
    pub focus: Result<Value, ReadError>,
    pub stress: Result<Value, ReadError>,
    pub control: Result<Value, ReadError>,
}

/// Build the final result from settled reads.
pub fn merge<K>(reads: &SettledReads, bucket_key: &K) -> AggregationResult
where
    K: BucketKey + ?Sized,
{
    let global_scalars = resolve_scalars(reads);

    let raw_records = reads
        .sessions
        .as_ref()
        .map_err(Clone::clone)
        .and_then(payload::session_records);

    match raw_records {
        Ok(raw) => {
            let normalized = normalize_all(raw);
            AggregationResult {
                status: RunStatus::Ready,
                global_scalars,
                monthly_series: aggregate(&normalized.records, bucket_key),
                excluded_records: normalized.excluded,
            }
        }
        Err(e) => {
            warn!("Session history unavailable, monthly series is empty: {}", e);
            AggregationResult {
                status: RunStatus::Error,
                global_scalars,
                monthly_series: Vec::new(),
                excluded_records: 0,
            }
        }
    }
}

/// Decide each of the four scalars.
pub fn resolve_scalars(reads: &SettledReads) -> GlobalScalars {
    GlobalScalars {
        performance_global: resolve(&reads.performance, |body| {
            payload::performance_global(body).map(averager::pass_through)
        }),
        focus_value: resolve_average(Endpoint::FocusValues, &reads.focus),
        stress_value: resolve_average(Endpoint::StressValues, &reads.stress),
        control_value: resolve_average(Endpoint::ControlValues, &reads.control),
    }
}

fn resolve_average(endpoint: Endpoint, read: &Result<Value, ReadError>) -> Scalar {
    resolve(read, |body| {
        payload::metric_values(endpoint, body).map(|values| averager::average(&values))
    })
}

fn resolve<F>(read: &Result<Value, ReadError>, decode: F) -> Scalar
where
    F: FnOnce(&Value) -> Result<Scalar, ReadError>,
{
    // Network failures were already logged where the read happened.
    let body = match read {
        Ok(body) => body,
        Err(_) => return Scalar::Unavailable,
    };

    match decode(body) {
        Ok(scalar) => scalar,
        Err(e) => {
            warn!("{} unusable, reporting N/A: {}", e.endpoint(), e);
            Scalar::Unavailable
        }
    }
}
