//! Typed failures of the outbound device probe.
//!
//! [`ProbeError`] is what [`crate::probe::PingClient::ping`] returns when no
//! status line came back. The checker matches on the variant to pick the
//! response category, so classification happens exactly once, here, at the
//! point where the `reqwest` error is still inspectable.

/// Why a probe produced no HTTP response.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The request did not finish within the configured ceiling.
    #[error("no response from {url} within {timeout_ms} ms")]
    Timeout { url: String, timeout_ms: u64 },

    /// The transport failed before a status line arrived: refused,
    /// unroutable, unresolvable, reset or closed by the device mid-request,
    /// or no address to connect to at all.
    #[error("{url} is unreachable: {reason}")]
    Unreachable { url: String, reason: String },

    /// Any other client-side failure (invalid URL, body read or decode,
    /// redirect loop).
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ProbeError {
    /// Classify a `reqwest` error raised while probing `url`.
    ///
    /// Timeout is checked first: a connect attempt that runs out the clock
    /// reports both `is_connect` and `is_timeout`, and it belongs in the
    /// timeout bucket.
    ///
    /// `is_request` is the kind `send` reports when hyper gives up on the
    /// connection after it was opened (reset, closed before the response
    /// head). Invalid URLs are `is_builder`, and failures while reading the
    /// body are `is_body`/`is_decode`, so neither lands here.
    pub fn classify(url: &str, timeout_ms: u64, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
                timeout_ms,
            }
        } else if err.is_connect() || err.is_request() {
            Self::Unreachable {
                url: url.to_string(),
                reason: root_cause(&err),
            }
        } else {
            Self::Request {
                url: url.to_string(),
                source: err,
            }
        }
    }
}

/// Innermost message of an error chain; `reqwest` wraps the useful OS error
/// ("Connection refused") a few levels down.
fn root_cause(err: &(dyn std::error::Error + 'static)) -> String {
    let mut current = err;
    while let Some(next) = current.source() {
        current = next;
    }
    current.to_string()
}
