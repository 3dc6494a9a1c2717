//! HTTP transport built on reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{Transport, TransportError};

/// Fetches endpoint payloads over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport. With `accept_invalid_certs`, TLS certificates are
    /// not verified (storage nodes commonly serve self-signed certificates).
    pub fn new(accept_invalid_certs: bool) -> Result<Self, TransportError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str, timeout: Duration) -> Result<reqwest::Response, TransportError> {
        debug!(url, "requesting");
        let response = self.client.get(url).timeout(timeout).send().await?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status().as_u16()));
        }

        Ok(response)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String, TransportError> {
        let response = self.get(url, timeout).await?;
        response.text().await.map_err(TransportError::from)
    }

    async fn fetch_json(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<serde_json::Value, TransportError> {
        let response = self.get(url, timeout).await?;
        response
            .json()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))
    }
}
