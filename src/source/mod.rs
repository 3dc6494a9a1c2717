//! Polling of the storage node's endpoints.
//!
//! This module provides the [`Transport`] abstraction used to fetch raw
//! payloads, the [`RefreshScheduler`] deciding when each endpoint is due,
//! and the [`Poller`] that ties them to the shared dashboard state.

mod http;
mod poller;
mod scheduler;

pub use http::HttpTransport;
pub use poller::{Endpoints, Poller};
pub use scheduler::RefreshScheduler;

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// The endpoints polled by the dashboard, each on its own schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SourceId {
    /// Prometheus text exposition (`/metrics`).
    Telemetry,
    /// JSON health RPC (`/v1/health`).
    Health,
}

impl SourceId {
    pub const ALL: [SourceId; 2] = [SourceId::Telemetry, SourceId::Health];

    /// Returns the display label for this source.
    pub fn label(&self) -> &'static str {
        match self {
            SourceId::Telemetry => "metrics",
            SourceId::Health => "health",
        }
    }
}

/// Errors that can occur while fetching from an endpoint.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No response within the request timeout.
    #[error("request timed out")]
    Timeout,

    /// Could not connect to the endpoint.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The endpoint answered with a non-success status.
    #[error("endpoint returned status {0}")]
    Status(u16),

    /// Any other HTTP-level failure.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The response body could not be read or parsed.
    #[error("failed to read response body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connection(err.to_string())
        } else if err.is_decode() || err.is_body() {
            TransportError::Body(err.to_string())
        } else {
            TransportError::Http(err.to_string())
        }
    }
}

/// Fetches raw payloads from the node.
///
/// Implementations must respect `timeout`; the poller never waits on a
/// fetch beyond it.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Fetch a plain text document.
    async fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String, TransportError>;

    /// Fetch and parse a JSON document.
    async fn fetch_json(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<serde_json::Value, TransportError>;
}
