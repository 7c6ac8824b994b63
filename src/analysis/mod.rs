//! Analysis modules.
//!
//! Normalization of raw session records, monthly grouping, and the
//! global scalar averages.

pub mod aggregator;
pub mod averager;
pub mod bucketing;
pub mod normalizer;

pub use aggregator::aggregate;
pub use bucketing::{BucketKey, Bucketing, BucketingKind};
pub use normalizer::normalize_all;
