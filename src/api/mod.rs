//! HTTP invocation surface for `serve` mode.
//!
//! This is intentionally a thin layer: all checking logic lives in
//! [`crate::checker`]. Handlers translate HTTP requests into checks and
//! check results back into HTTP responses.

pub mod health;
pub mod invoke;
pub mod request_id;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::{checker::HealthChecker, config::SettingsConfig, settings::SettingsStore};

/// Shared, immutable state behind every route.
pub struct AppState<S> {
    pub checker: HealthChecker<S>,
    pub settings: SettingsConfig,
}

/// Build the axum router.
pub fn router<S>(state: Arc<AppState<S>>) -> Router
where
    S: SettingsStore + 'static,
{
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/invoke", post(invoke::invoke::<S>))
        .route("/check/{device_id}", get(invoke::check_device::<S>))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .with_state(state)
}
