//! Check-triggering routes.
//!
//! `POST /invoke` mirrors a one-shot run: it checks the device named by the
//! configured environment variable and returns the `{statusCode, body}`
//! envelope with HTTP 200. `GET /check/{device_id}` checks any registered
//! device and maps the check result onto the HTTP response directly.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::AppState;
use crate::settings::SettingsStore;

/// `POST /invoke` — run the check for the environment-selected device.
///
/// The request body, if any, is ignored.
pub async fn invoke<S>(State(state): State<Arc<AppState<S>>>) -> impl IntoResponse
where
    S: SettingsStore + 'static,
{
    let device_id = state.settings.device_id().unwrap_or_default();
    let result = state.checker.check(&device_id).await;
    Json(result.into_response())
}

/// `GET /check/{device_id}` — run the check for `device_id`.
///
/// Responds with the check's status code and its structured body as JSON.
/// Device statuses that cannot carry a body are reported as 502; see
/// [`http_status`].
pub async fn check_device<S>(
    State(state): State<Arc<AppState<S>>>,
    Path(device_id): Path<String>,
) -> impl IntoResponse
where
    S: SettingsStore + 'static,
{
    let result = state.checker.check(&device_id).await;
    (http_status(result.status_code), Json(result.body))
}

/// HTTP status for a check result's status code.
///
/// A device answering with an informational or bodiless status (1xx, 204,
/// 205, 304) is passed through as `502 Bad Gateway`, so the JSON body is
/// still delivered.
pub fn http_status(code: u16) -> StatusCode {
    match StatusCode::from_u16(code) {
        Ok(status)
            if status.is_informational()
                || matches!(
                    status,
                    StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT | StatusCode::NOT_MODIFIED
                ) =>
        {
            StatusCode::BAD_GATEWAY
        }
        Ok(status) => status,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt; // oneshot
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::http_status;
    use crate::{
        api::{router, AppState},
        checker::{HealthChecker, InvocationResponse},
        config::{ProbeConfig, SettingsConfig},
        settings::{MemorySettingsStore, SettingsRecord},
    };

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// State with `dev1` registered against the mock server, reading the
    /// device ID from `env_var`.
    fn state_for(server: &MockServer, env_var: &str) -> Arc<AppState<MemorySettingsStore>> {
        let store =
            MemorySettingsStore::new().with_device("dev1", SettingsRecord::new("127.0.0.1", 200));
        let probe = ProbeConfig {
            port: server.address().port(),
            path: "/ping".into(),
            timeout_ms: 2_000,
        };
        Arc::new(AppState {
            checker: HealthChecker::new(store, &probe).unwrap(),
            settings: SettingsConfig {
                device_id_env: env_var.into(),
                ..SettingsConfig::default()
            },
        })
    }

    async fn pong_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
            .mount(&server)
            .await;
        server
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // -----------------------------------------------------------------------
    // POST /invoke
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn invoke_returns_envelope_for_env_selected_device() {
        let var = "DL_TEST_INVOKE_DEVICE_501";
        // SAFETY: unique var name; no other test reads it.
        unsafe { std::env::set_var(var, "dev1") };
        let server = pong_server().await;
        let app = router(state_for(&server, var));

        let req = Request::builder()
            .method("POST")
            .uri("/invoke")
            .body(Body::from("{}"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        unsafe { std::env::remove_var(var) };

        assert_eq!(resp.status(), StatusCode::OK);
        let envelope: InvocationResponse = serde_json::from_value(body_json(resp).await).unwrap();
        assert_eq!(envelope.status_code, 200);
        let body: Value = serde_json::from_str(&envelope.body).unwrap();
        assert_eq!(body, json!({ "status": "online", "details": "pong" }));
    }

    #[tokio::test]
    async fn invoke_without_device_env_returns_404_envelope() {
        let server = pong_server().await;
        let app = router(state_for(&server, "DL_TEST_INVOKE_UNSET_502"));

        let req = Request::builder()
            .method("POST")
            .uri("/invoke")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["statusCode"], 404);
    }

    // -----------------------------------------------------------------------
    // GET /check/{device_id}
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn check_maps_online_device_to_200() {
        let server = pong_server().await;
        let app = router(state_for(&server, "DL_TEST_CHECK_UNUSED_503"));

        let req = Request::builder()
            .uri("/check/dev1")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("x-request-id"));
        assert_eq!(body_json(resp).await["status"], "online");
    }

    #[tokio::test]
    async fn check_maps_unknown_device_to_404() {
        let server = pong_server().await;
        let app = router(state_for(&server, "DL_TEST_CHECK_UNUSED_504"));

        let req = Request::builder()
            .uri("/check/dev2")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["status"], "not found");
    }

    #[tokio::test]
    async fn check_passes_through_unexpected_device_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(418))
            .mount(&server)
            .await;
        let app = router(state_for(&server, "DL_TEST_CHECK_UNUSED_505"));

        let req = Request::builder()
            .uri("/check/dev1")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(body_json(resp).await["status"], "error");
    }

    #[tokio::test]
    async fn check_reports_bodiless_device_status_as_502_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        let app = router(state_for(&server, "DL_TEST_CHECK_UNUSED_507"));

        let req = Request::builder()
            .uri("/check/dev1")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(resp).await["status"], "error");
    }

    #[test]
    fn http_status_keeps_final_codes_and_remaps_bodiless_ones() {
        assert_eq!(http_status(200), StatusCode::OK);
        assert_eq!(http_status(408), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(http_status(503), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(http_status(101), StatusCode::BAD_GATEWAY);
        assert_eq!(http_status(204), StatusCode::BAD_GATEWAY);
        assert_eq!(http_status(304), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn healthz_is_routed() {
        let server = pong_server().await;
        let app = router(state_for(&server, "DL_TEST_CHECK_UNUSED_506"));

        let req = Request::builder()
            .uri("/healthz")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
