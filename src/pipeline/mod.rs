//! Aggregation pipeline.
//!
//! This module provides the fetch orchestrator and the merge step that
//! applies the per-field degrade policy.

pub mod merge;
pub mod orchestrator;

pub use orchestrator::{Orchestrator, OrchestratorConfig};
