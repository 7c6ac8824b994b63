//! Remote data source access.
//!
//! This module defines the endpoints the aggregator reads, the typed
//! read error, and the `MetricsSource` seam the orchestrator depends on.

pub mod http;
pub mod payload;

#[cfg(test)]
pub mod fake;

pub use http::HttpSource;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// The five reads performed by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    GlobalPerformance,
    SessionHistory,
    FocusValues,
    StressValues,
    ControlValues,
}

impl Endpoint {
    /// All endpoints in the order a run reads them.
    pub const ALL: [Endpoint; 5] = [
        Endpoint::GlobalPerformance,
        Endpoint::SessionHistory,
        Endpoint::FocusValues,
        Endpoint::StressValues,
        Endpoint::ControlValues,
    ];

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::GlobalPerformance => "global-performance",
            Endpoint::SessionHistory => "session-history",
            Endpoint::FocusValues => "focus-values",
            Endpoint::StressValues => "stress-values",
            Endpoint::ControlValues => "control-values",
        }
    }

    /// Path on the remote service when none is configured.
    pub fn default_path(&self) -> &'static str {
        match self {
            Endpoint::GlobalPerformance => "/api/global-performance",
            Endpoint::SessionHistory => "/api/sessionQuestionary",
            Endpoint::FocusValues => "/api/focus-value",
            Endpoint::StressValues => "/api/stress-value",
            Endpoint::ControlValues => "/api/control-value",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Why a single read did not produce usable data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReadError {
    /// The request did not complete.
    #[error("network failure on {endpoint}: {message}")]
    Network { endpoint: Endpoint, message: String },

    /// The service answered with a non-success status.
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: Endpoint, status: u16 },

    /// The read exceeded its time budget.
    #[error("{endpoint} timed out after {millis}ms")]
    Timeout { endpoint: Endpoint, millis: u64 },

    /// The body was not JSON, or an expected field was absent or mistyped.
    #[error("malformed payload from {endpoint}: {message}")]
    Malformed { endpoint: Endpoint, message: String },
}

impl ReadError {
    pub fn malformed(endpoint: Endpoint, message: impl Into<String>) -> Self {
        ReadError::Malformed {
            endpoint,
            message: message.into(),
        }
    }

    /// The endpoint whose read failed.
    pub fn endpoint(&self) -> Endpoint {
        match self {
            ReadError::Network { endpoint, .. }
            | ReadError::Status { endpoint, .. }
            | ReadError::Timeout { endpoint, .. }
            | ReadError::Malformed { endpoint, .. } => *endpoint,
        }
    }

    /// True for failures where the read never produced a body.
    pub fn is_network_failure(&self) -> bool {
        !matches!(self, ReadError::Malformed { .. })
    }
}

/// A source of raw JSON documents, one per endpoint.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Short tag identifying the backend in logs.
    fn backend_tag(&self) -> &'static str;

    /// Read one endpoint and return its parsed JSON body.
    async fn fetch(&self, endpoint: Endpoint) -> Result<Value, ReadError>;
}
