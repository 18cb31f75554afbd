//! Invocation ID middleware.
//!
//! Every inbound request is assigned a unique `X-Request-ID`. The ID is:
//!
//! - Accepted from the caller if they already provide `X-Request-ID`
//! - Freshly generated (UUID v4) otherwise
//! - Stored as an axum [`Extension`] so handlers can read it
//! - Echoed back in the `X-Request-ID` response header
//! - Wrapped in an `invocation` span, so the check's log lines carry it
//!
//! One-shot runs from `main` open the same span with a generated ID, so log
//! lines look alike regardless of how the check was triggered.
//!
//! [`Extension`]: axum::Extension

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Instrument as _;
use uuid::Uuid;

pub const HEADER: &str = "x-request-id";

/// Newtype wrapper carrying the assigned invocation ID.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvocationId(pub String);

impl InvocationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Span every log line of one invocation is recorded under.
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!("invocation", id = %self.0)
    }
}

/// Axum middleware that assigns an [`InvocationId`] to every request.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| InvocationId(v.to_string()))
        .unwrap_or_else(InvocationId::generate);

    req.extensions_mut().insert(id.clone());

    let span = id.span();
    let mut response = next.run(req).instrument(span).await;

    if let Ok(header_value) = HeaderValue::from_str(&id.0) {
        response.headers_mut().insert(HEADER, header_value);
    }

    response
}
