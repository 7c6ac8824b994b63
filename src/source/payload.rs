//! Decoding of endpoint bodies into the values the pipeline consumes.

use super::{Endpoint, ReadError};
use serde_json::Value;

/// Field holding the performance score.
pub const PERFORMANCE_FIELD: &str = "PerformanceGlobal";

/// Name of the array field carried by a per-skill endpoint.
pub fn values_field(endpoint: Endpoint) -> Option<&'static str> {
    match endpoint {
        Endpoint::FocusValues => Some("focus_values"),
        Endpoint::StressValues => Some("stress_values"),
        Endpoint::ControlValues => Some("control_values"),
        Endpoint::GlobalPerformance | Endpoint::SessionHistory => None,
    }
}

/// Extract the performance score. It must be present and a finite number.
pub fn performance_global(body: &Value) -> Result<f64, ReadError> {
    let endpoint = Endpoint::GlobalPerformance;
    let object = body
        .as_object()
        .ok_or_else(|| ReadError::malformed(endpoint, "expected a JSON object"))?;

    let value = object
        .get(PERFORMANCE_FIELD)
        .ok_or_else(|| ReadError::malformed(endpoint, format!("missing `{}`", PERFORMANCE_FIELD)))?;

    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            ReadError::malformed(endpoint, format!("`{}` is not a number", PERFORMANCE_FIELD))
        })
}

/// Extract the numeric array of a per-skill endpoint.
///
/// A single non-numeric entry rejects the whole array.
pub fn metric_values(endpoint: Endpoint, body: &Value) -> Result<Vec<f64>, ReadError> {
    let field = values_field(endpoint)
        .ok_or_else(|| ReadError::malformed(endpoint, "endpoint carries no value array"))?;

    let array = body
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| ReadError::malformed(endpoint, format!("missing array `{}`", field)))?;

    array
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_f64().filter(|n| n.is_finite()).ok_or_else(|| {
                ReadError::malformed(endpoint, format!("`{}[{}]` is not a number", field, i))
            })
        })
        .collect()
}

/// Raw session records from the history payload.
///
/// The payload is an object whose values are the records; a plain array
/// of records is accepted too.
pub fn session_records(body: &Value) -> Result<Vec<&Value>, ReadError> {
    match body {
        Value::Object(map) => Ok(map.values().collect()),
        Value::Array(items) => Ok(items.iter().collect()),
        _ => Err(ReadError::malformed(
            Endpoint::SessionHistory,
            "expected an object or array of records",
        )),
    }
}
