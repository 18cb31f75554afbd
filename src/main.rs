use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::signal;
use tracing::{info, Instrument as _};

mod api;
mod checker;
mod config;
mod error;
mod logging;
mod probe;
mod settings;

use checker::HealthChecker;
use config::Config;
use settings::{FileSettingsStore, SettingsStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::discover()?;
    logging::init(&config.logging)?;

    let store = FileSettingsStore::new(&config.settings.path);
    info!(
        settings = %store.path().display(),
        probe_port = config.probe.port,
        timeout_ms = config.probe.timeout_ms,
        "device-liveness starting"
    );
    let checker = HealthChecker::new(store, &config.probe)?;

    match std::env::args().nth(1).as_deref() {
        None => invoke_once(&checker, &config).await,
        Some("serve") => serve(checker, config).await,
        Some(other) => anyhow::bail!("unknown command `{other}`; expected no argument or `serve`"),
    }
}

/// Check the environment-selected device once and print the response
/// envelope on stdout.
async fn invoke_once<S: SettingsStore>(
    checker: &HealthChecker<S>,
    config: &Config,
) -> anyhow::Result<()> {
    let device_id = config.settings.device_id().unwrap_or_default();
    let span = api::request_id::InvocationId::generate().span();
    let response = checker.check(&device_id).instrument(span).await.into_response();

    println!(
        "{}",
        serde_json::to_string(&response).context("serializing invocation response")?
    );
    Ok(())
}

/// Serve checks over HTTP until Ctrl+C or SIGTERM.
async fn serve<S: SettingsStore + 'static>(
    checker: HealthChecker<S>,
    config: Config,
) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", config.server.port).parse()?;
    let state = Arc::new(api::AppState {
        checker,
        settings: config.settings,
    });

    let app = api::router(state).layer(
        tower_http::trace::TraceLayer::new_for_http()
            .make_span_with(tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO))
            .on_response(tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO)),
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "invocation API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("invocation API server error")?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
