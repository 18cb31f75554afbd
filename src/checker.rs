//! The liveness check: look a device up, probe it once, classify the result.
//!
//! Nothing here returns an error. Every failure, from a broken settings store
//! to a device that never answers, becomes a [`CheckOutcome`] and from there a
//! [`CheckResult`] with a status code and JSON body.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn, Instrument as _};

use crate::{
    config::ProbeConfig,
    error::ProbeError,
    probe::PingClient,
    settings::SettingsStore,
};

/// Typed result of one check, before it is rendered as a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// No settings record for the identifier; no probe was sent.
    NotFound,
    /// The device answered with its expected status; carries the response text.
    Success { body: String },
    /// The device answered, but with a different status.
    UnexpectedStatus(u16),
    /// The device did not answer within the probe timeout.
    Timeout,
    /// No response head arrived: the connection was refused, unreachable, or
    /// dropped by the device before it answered.
    ConnectionRefused,
    /// Anything else: settings store failure, malformed URL, body read error.
    InternalError,
}

impl CheckOutcome {
    pub fn into_result(self) -> CheckResult {
        match self {
            Self::NotFound => CheckResult::new(
                404,
                json!({ "status": "not found", "message": "Settings not found" }),
            ),
            Self::Success { body } => {
                CheckResult::new(200, json!({ "status": "online", "details": body }))
            }
            Self::UnexpectedStatus(code) => CheckResult::new(
                code,
                json!({ "status": "error", "message": "unexpected status code" }),
            ),
            Self::Timeout => {
                CheckResult::new(408, json!({ "status": "offline", "reason": "timeout" }))
            }
            Self::ConnectionRefused => CheckResult::new(
                503,
                json!({ "status": "offline", "reason": "connection_refused" }),
            ),
            Self::InternalError => {
                CheckResult::new(500, json!({ "error": "internal_server_error" }))
            }
        }
    }
}

/// Status code and structured body of one check.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub status_code: u16,
    pub body: Value,
}

impl CheckResult {
    fn new(status_code: u16, body: Value) -> Self {
        Self { status_code, body }
    }

    /// Render as the `{statusCode, body}` envelope with `body` as a JSON string.
    pub fn into_response(self) -> InvocationResponse {
        InvocationResponse {
            status_code: self.status_code,
            body: self.body.to_string(),
        }
    }
}

/// Wire shape returned to the invoker.
///
/// ```json
/// { "statusCode": 200, "body": "{\"status\":\"online\",\"details\":\"pong\"}" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

/// Checks devices registered in a [`SettingsStore`].
pub struct HealthChecker<S> {
    store: S,
    client: PingClient,
}

impl<S: SettingsStore> HealthChecker<S> {
    pub fn new(store: S, probe: &ProbeConfig) -> anyhow::Result<Self> {
        Ok(Self {
            store,
            client: PingClient::new(probe)?,
        })
    }

    /// Run one liveness check for `device_id`.
    pub async fn check(&self, device_id: &str) -> CheckResult {
        let span = tracing::info_span!("liveness_check", device_id = %device_id);
        self.outcome(device_id).instrument(span).await.into_result()
    }

    /// Look up, probe and classify, logging exactly once per outcome.
    pub async fn outcome(&self, device_id: &str) -> CheckOutcome {
        if device_id.trim().is_empty() {
            error!("no device identifier supplied");
            return CheckOutcome::NotFound;
        }

        let records = match self.store.query(device_id).await {
            Ok(records) => records,
            Err(e) => {
                error!(error = %format!("{e:#}"), "settings lookup failed");
                return CheckOutcome::InternalError;
            }
        };

        let Some(record) = records.first() else {
            error!("no settings found for device");
            return CheckOutcome::NotFound;
        };
        if records.len() > 1 {
            warn!(records = records.len(), "multiple settings records, using the first");
        }

        let host = record.address();
        let expected = record.expected_status();
        debug!(host, url = %self.client.url_for(host), "starting liveness probe");

        match self.client.ping(host).await {
            Ok(resp) if resp.status == expected => {
                info!(host, status = resp.status, "device is online");
                CheckOutcome::Success { body: resp.body }
            }
            Ok(resp) => {
                warn!(
                    host,
                    status = resp.status,
                    expected,
                    "device responded with unexpected status code"
                );
                CheckOutcome::UnexpectedStatus(resp.status)
            }
            Err(ProbeError::Timeout { timeout_ms, .. }) => {
                error!(host, timeout_ms, "device did not respond before the timeout");
                CheckOutcome::Timeout
            }
            Err(e @ ProbeError::Unreachable { .. }) => {
                error!(host, error = %e, "device is unreachable or refused the connection");
                CheckOutcome::ConnectionRefused
            }
            Err(e @ ProbeError::Request { .. }) => {
                error!(host, error = %e, "probe failed unexpectedly");
                CheckOutcome::InternalError
            }
        }
    }
}
