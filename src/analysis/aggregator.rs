//! Monthly aggregation of session records.
//!
//! Records are grouped by bucket label in one pass, then each bucket's
//! three dimensions are averaged. Buckets come out in the order their
//! first record was seen.

use super::bucketing::BucketKey;
use crate::models::{MonthlyAggregate, SessionRecord};
use std::collections::HashMap;

/// Values collected for one bucket, one vector per dimension.
#[derive(Debug, Default)]
struct Bucket {
    stress: Vec<f64>,
    focus: Vec<f64>,
    control: Vec<f64>,
}

/// Group records into buckets and average each dimension.
pub fn aggregate<K>(records: &[SessionRecord], bucket_key: &K) -> Vec<MonthlyAggregate>
where
    K: BucketKey + ?Sized,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<(String, Bucket)> = Vec::new();

    for record in records {
        let label = bucket_key.key(&record.updated_at);
        let slot = *index.entry(label.clone()).or_insert_with(|| {
            buckets.push((label, Bucket::default()));
            buckets.len() - 1
        });

        let bucket = &mut buckets[slot].1;
        bucket.stress.push(record.stress);
        bucket.focus.push(record.focus);
        bucket.control.push(record.control);
    }

    buckets
        .into_iter()
        .filter_map(|(month, bucket)| {
            Some(MonthlyAggregate {
                month,
                stress_mean: mean(&bucket.stress)?,
                focus_mean: mean(&bucket.focus)?,
                control_mean: mean(&bucket.control)?,
            })
        })
        .collect()
}

/// Arithmetic mean, `None` for an empty slice or a non-finite result.
///
/// A bucket with any `None` mean is dropped from the series.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    mean.is_finite().then_some(mean)
}
