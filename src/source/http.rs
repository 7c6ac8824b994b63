//! HTTP implementation of the metrics source.

use super::{Endpoint, MetricsSource, ReadError};
use crate::config::SourceConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Reads the endpoints of a remote JSON service with `reqwest`.
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
    config: SourceConfig,
}

impl HttpSource {
    /// Build a client for the configured service.
    pub fn new(config: SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            config,
        })
    }

    /// Full URL for an endpoint.
    pub fn url_for(&self, endpoint: Endpoint) -> String {
        let path = self.config.path_for(endpoint);
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl MetricsSource for HttpSource {
    fn backend_tag(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, endpoint: Endpoint) -> Result<Value, ReadError> {
        let url = self.url_for(endpoint);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ReadError::Timeout {
                    endpoint,
                    millis: self.config.timeout_seconds * 1000,
                }
            } else if e.is_connect() {
                ReadError::Network {
                    endpoint,
                    message: format!("cannot connect to {}", self.base_url),
                }
            } else {
                ReadError::Network {
                    endpoint,
                    message: e.to_string(),
                }
            }
        })?;

        if !response.status().is_success() {
            return Err(ReadError::Status {
                endpoint,
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| ReadError::Network {
            endpoint,
            message: format!("failed to read body: {}", e),
        })?;

        debug!("{} answered with {} bytes", endpoint, body.len());

        serde_json::from_str(&body)
            .map_err(|e| ReadError::malformed(endpoint, format!("invalid JSON: {}", e)))
    }
}
