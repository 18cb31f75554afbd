//! HTTP client for the device ping endpoint.
//!
//! A [`PingClient`] is built once from [`ProbeConfig`] and reused for every
//! check. [`reqwest::Client`] holds its connection pool behind an `Arc`, so
//! sharing one across `serve` requests needs no extra synchronisation.

use std::time::Duration;

use anyhow::Context;
use reqwest::Client;

use crate::{config::ProbeConfig, error::ProbeError};

/// Status line and body of a completed probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingResponse {
    pub status: u16,
    pub body: String,
}

/// Sends a single bounded `GET` to a device's ping endpoint.
pub struct PingClient {
    client: Client,
    port: u16,
    path: String,
    timeout_ms: u64,
}

impl PingClient {
    /// Construct a client for the given probe config.
    ///
    /// The timeout applies to the whole exchange: connect, headers and body.
    pub fn new(cfg: &ProbeConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .context("building reqwest client")?;

        Ok(Self {
            client,
            port: cfg.port,
            path: cfg.path.clone(),
            timeout_ms: cfg.timeout_ms,
        })
    }

    /// `http://<address>:<port><path>`, bracketing bare IPv6 literals.
    pub fn url_for(&self, address: &str) -> String {
        let address = address.trim();
        if address.contains(':') && !address.starts_with('[') {
            format!("http://[{address}]:{}{}", self.port, self.path)
        } else {
            format!("http://{address}:{}{}", self.port, self.path)
        }
    }

    /// Probe `address` once. No retries.
    ///
    /// Any status code counts as a completed probe; judging it is the
    /// caller's job.
    ///
    /// # Errors
    /// Returns [`ProbeError`] when no complete response arrived: the
    /// timeout elapsed, the connection could not be made or was dropped
    /// before the response head, or the request failed some other way.
    pub async fn ping(&self, address: &str) -> Result<PingResponse, ProbeError> {
        let url = self.url_for(address);
        if address.trim().is_empty() {
            return Err(ProbeError::Unreachable {
                url,
                reason: "no host address in settings record".into(),
            });
        }

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProbeError::classify(&url, self.timeout_ms, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ProbeError::classify(&url, self.timeout_ms, e))?;

        Ok(PingResponse { status, body })
    }
}
