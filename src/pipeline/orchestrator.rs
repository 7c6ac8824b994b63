//! Fetch orchestration for one aggregation run.
//!
//! A run reads the global performance and the session history one after
//! the other, then the three per-skill arrays concurrently. Every read is
//! bounded by a timeout and settles into a `Result`; nothing short-circuits.
//! The merged result is published to subscribers only once all five reads
//! have settled.

use super::merge::{merge, SettledReads};
use crate::analysis::{BucketKey, Bucketing};
use crate::models::{AggregationResult, RunStatus};
use crate::source::{Endpoint, MetricsSource, ReadError};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound for a single read.
    pub read_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(10),
        }
    }
}

/// Runs the pipeline against a metrics source.
///
/// Runs are serialized: a `run()` issued while another is in flight waits
/// for it to finish before starting from scratch.
pub struct Orchestrator {
    source: Arc<dyn MetricsSource>,
    bucket_key: Box<dyn BucketKey + Send + Sync>,
    config: OrchestratorConfig,
    run_lock: Mutex<()>,
    state: watch::Sender<AggregationResult>,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn MetricsSource>,
        bucketing: Bucketing,
        config: OrchestratorConfig,
    ) -> Self {
        Self::with_bucket_key(source, Box::new(bucketing), config)
    }

    /// Build an orchestrator with a custom bucket key.
    pub fn with_bucket_key(
        source: Arc<dyn MetricsSource>,
        bucket_key: Box<dyn BucketKey + Send + Sync>,
        config: OrchestratorConfig,
    ) -> Self {
        info!(
            "Initializing orchestrator on {} source (read timeout {:?})",
            source.backend_tag(),
            config.read_timeout
        );

        let (state, _) = watch::channel(AggregationResult::loading());

        Self {
            source,
            bucket_key,
            config,
            run_lock: Mutex::new(()),
            state,
        }
    }

    /// Observe status changes and published results.
    pub fn subscribe(&self) -> watch::Receiver<AggregationResult> {
        self.state.subscribe()
    }

    /// Perform one full run and return its result.
    pub async fn run(&self) -> AggregationResult {
        let _serialized = self.run_lock.lock().await;
        let started = Instant::now();
        let loading = LoadingGuard::acquire(&self.state);

        let performance = self.read(Endpoint::GlobalPerformance).await;
        let sessions = self.read(Endpoint::SessionHistory).await;

        let (focus, stress, control) = futures::future::join3(
            self.read(Endpoint::FocusValues),
            self.read(Endpoint::StressValues),
            self.read(Endpoint::ControlValues),
        )
        .await;

        let reads = SettledReads {
            performance,
            sessions,
            focus,
            stress,
            control,
        };
        let result = merge(&reads, &*self.bucket_key);

        info!(
            "Run finished as {} in {:.0?}: {} month buckets, {} excluded records",
            result.status,
            started.elapsed(),
            result.monthly_series.len(),
            result.excluded_records
        );

        loading.release(result.clone());
        result
    }

    /// One bounded read. Failures are logged here and returned as values.
    async fn read(&self, endpoint: Endpoint) -> Result<Value, ReadError> {
        debug!("Reading {}", endpoint);

        let outcome = tokio::time::timeout(self.config.read_timeout, self.source.fetch(endpoint))
            .await
            .unwrap_or_else(|_| {
                Err(ReadError::Timeout {
                    endpoint,
                    millis: self.config.read_timeout.as_millis() as u64,
                })
            });

        if let Err(ref e) = outcome {
            let kind = if e.is_network_failure() { "network" } else { "payload" };
            warn!("Read failed ({}): {}", kind, e);
        }
        outcome
    }
}

/// Holds the published state in `loading` for the lifetime of a run.
///
/// Dropping the guard without releasing it (a cancelled run) publishes
/// an `error` result so observers never stay stuck in `loading`.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<AggregationResult>,
    released: bool,
}

impl<'a> LoadingGuard<'a> {
    fn acquire(state: &'a watch::Sender<AggregationResult>) -> Self {
        state.send_replace(AggregationResult::loading());
        Self {
            state,
            released: false,
        }
    }

    fn release(mut self, result: AggregationResult) {
        self.released = true;
        self.state.send_replace(result);
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            warn!("Run abandoned before all reads settled");
            let mut abandoned = AggregationResult::loading();
            abandoned.status = RunStatus::Error;
            self.state.send_replace(abandoned);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GlobalScalars, MonthlyAggregate, Scalar};
    use crate::report::generate_text_report;
    use crate::source::fake::FakeSource;
    use serde_json::json;
    use std::sync::atomic::Ordering;

    fn healthy_source() -> FakeSource {
        FakeSource::new()
            .with_body(
                Endpoint::GlobalPerformance,
                json!({ "PerformanceGlobal": 74.0 }),
            )
            .with_body(
                Endpoint::SessionHistory,
                json!({
                    "-Nx1": { "updatedAt": "2024-03-02T14:00:00Z", "formAnswer": [2, 4, 6] },
                    "-Nx2": { "updatedAt": "2024-03-28T09:30:00Z", "formAnswer": [4, 6, 8] }
                }),
            )
            .with_body(Endpoint::FocusValues, json!({ "focus_values": [70, 80] }))
            .with_body(Endpoint::StressValues, json!({ "stress_values": [40, 50, 60] }))
            .with_body(Endpoint::ControlValues, json!({ "control_values": [88] }))
    }

    fn orchestrator(source: Arc<FakeSource>) -> Orchestrator {
        Orchestrator::new(source, Bucketing::default(), OrchestratorConfig::default())
    }

    #[tokio::test]
    async fn test_run_averages_march_sessions() {
        let result = orchestrator(Arc::new(healthy_source())).run().await;

        assert_eq!(result.status, RunStatus::Ready);
        assert_eq!(
            result.monthly_series,
            vec![MonthlyAggregate {
                month: "March".to_string(),
                stress_mean: 3.0,
                focus_mean: 5.0,
                control_mean: 7.0,
            }]
        );
        assert_eq!(result.global_scalars.performance_global, Scalar::Available(74.0));
        assert_eq!(result.global_scalars.focus_value, Scalar::Available(75.0));
        assert_eq!(result.global_scalars.stress_value, Scalar::Available(50.0));
        assert_eq!(result.global_scalars.control_value, Scalar::Available(88.0));
    }

    #[tokio::test]
    async fn test_empty_focus_renders_na_only_for_focus() {
        let source =
            healthy_source().with_body(Endpoint::FocusValues, json!({ "focus_values": [] }));
        let result = orchestrator(Arc::new(source)).run().await;

        assert_eq!(result.status, RunStatus::Ready);
        assert_eq!(result.global_scalars.focus_value, Scalar::Unavailable);
        assert!(result.global_scalars.stress_value.is_available());
        assert!(result.global_scalars.control_value.is_available());
        assert!(result.global_scalars.performance_global.is_available());

        let text = generate_text_report(&result, 2);
        assert!(text.contains("Focus: N/A"));
        assert_eq!(text.matches("N/A").count(), 1);
    }

    #[tokio::test]
    async fn test_session_failure_still_reads_scalars() {
        let source = Arc::new(healthy_source().with_error(
            Endpoint::SessionHistory,
            ReadError::Network {
                endpoint: Endpoint::SessionHistory,
                message: "connection reset".to_string(),
            },
        ));
        let result = orchestrator(source.clone()).run().await;

        assert_eq!(result.status, RunStatus::Error);
        assert!(result.monthly_series.is_empty());
        assert_eq!(result.global_scalars.focus_value, Scalar::Available(75.0));
        assert_eq!(source.calls(), 5);
    }

    #[tokio::test]
    async fn test_every_read_failing_still_completes() {
        let source = Arc::new(FakeSource::new());
        let result = orchestrator(source.clone()).run().await;

        assert_eq!(result.status, RunStatus::Error);
        assert_eq!(result.global_scalars, GlobalScalars::default());
        assert_eq!(source.calls(), 5);
    }

    #[tokio::test]
    async fn test_slow_read_times_out_and_degrades() {
        let source = healthy_source().with_delay(Endpoint::StressValues, Duration::from_millis(500));
        let config = OrchestratorConfig {
            read_timeout: Duration::from_millis(50),
        };
        let result = Orchestrator::new(Arc::new(source), Bucketing::default(), config)
            .run()
            .await;

        assert_eq!(result.status, RunStatus::Ready);
        assert_eq!(result.global_scalars.stress_value, Scalar::Unavailable);
        assert!(result.global_scalars.focus_value.is_available());
    }

    #[tokio::test]
    async fn test_skill_reads_run_concurrently() {
        let delay = Duration::from_millis(40);
        let source = Arc::new(
            healthy_source()
                .with_delay(Endpoint::FocusValues, delay)
                .with_delay(Endpoint::StressValues, delay)
                .with_delay(Endpoint::ControlValues, delay),
        );
        orchestrator(source.clone()).run().await;

        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_overlapping_runs_are_serialized() {
        let delay = Duration::from_millis(30);
        let source = Arc::new(
            healthy_source()
                .with_delay(Endpoint::SessionHistory, delay)
                .with_delay(Endpoint::FocusValues, delay)
                .with_delay(Endpoint::StressValues, delay)
                .with_delay(Endpoint::ControlValues, delay),
        );
        let orchestrator = orchestrator(source.clone());

        let (first, second) = tokio::join!(orchestrator.run(), orchestrator.run());

        assert_eq!(first, second);
        assert_eq!(source.calls(), 10);
        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_runs_are_idempotent() {
        let orchestrator = orchestrator(Arc::new(healthy_source()));
        let first = orchestrator.run().await;
        let second = orchestrator.run().await;

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_subscribers_see_loading_then_ready() {
        let source = healthy_source().with_delay(Endpoint::SessionHistory, Duration::from_millis(100));
        let orchestrator = Arc::new(orchestrator(Arc::new(source)));
        let mut rx = orchestrator.subscribe();

        let runner = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.run().await })
        };

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().status, RunStatus::Loading);

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().status, RunStatus::Ready);

        let result = runner.await.unwrap();
        assert_eq!(*rx.borrow(), result);
    }

    #[tokio::test]
    async fn test_cancelled_run_publishes_error() {
        let source = healthy_source().with_delay(Endpoint::SessionHistory, Duration::from_secs(5));
        let orchestrator = orchestrator(Arc::new(source));
        let rx = orchestrator.subscribe();

        let cancelled = tokio::time::timeout(Duration::from_millis(30), orchestrator.run()).await;

        assert!(cancelled.is_err());
        assert_eq!(rx.borrow().status, RunStatus::Error);
    }
}
