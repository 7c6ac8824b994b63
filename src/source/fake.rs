//! In-memory metrics source for orchestrator tests.

use super::{Endpoint, MetricsSource, ReadError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Default)]
pub struct FakeSource {
    pub responses: HashMap<Endpoint, Result<Value, ReadError>>,
    pub delays: HashMap<Endpoint, Duration>,
    pub fetch_calls: AtomicU64,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, endpoint: Endpoint, body: Value) -> Self {
        self.responses.insert(endpoint, Ok(body));
        self
    }

    pub fn with_error(mut self, endpoint: Endpoint, error: ReadError) -> Self {
        self.responses.insert(endpoint, Err(error));
        self
    }

    pub fn with_delay(mut self, endpoint: Endpoint, delay: Duration) -> Self {
        self.delays.insert(endpoint, delay);
        self
    }

    pub fn calls(&self) -> u64 {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricsSource for FakeSource {
    fn backend_tag(&self) -> &'static str {
        "fake"
    }

    async fn fetch(&self, endpoint: Endpoint) -> Result<Value, ReadError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(&endpoint) {
            tokio::time::sleep(*delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.responses
            .get(&endpoint)
            .cloned()
            .unwrap_or_else(|| {
                Err(ReadError::Status {
                    endpoint,
                    status: 404,
                })
            })
    }
}
