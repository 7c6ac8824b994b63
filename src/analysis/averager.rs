//! Global scalar averages.

use super::aggregator::mean;
use crate::models::Scalar;

/// Mean of a flat sequence; unavailable when the sequence is empty.
pub fn average(values: &[f64]) -> Scalar {
    Scalar::from(mean(values))
}

/// Pass a single score through, rejecting non-finite values.
pub fn pass_through(value: f64) -> Scalar {
    Scalar::from(Some(value))
}
