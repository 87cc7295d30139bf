use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod config;
mod handlers;
mod metrics;
mod middleware;
mod server;
mod typesense_client;

use config::{Cli, Config};
use metrics::Collector;
use typesense_client::TypesenseClient;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
///
/// Read-only after startup; concurrent scrapes share it without locking.
pub struct AppState {
    /// Fetch-and-translate pipeline, run once per scrape.
    pub collector: Collector<TypesenseClient>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // ── 1. Logging ───────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("typesense_exporter=info")),
        )
        .init();

    // ── 2. Configuration ─────────────────────────────────────────
    let config = match Config::try_from(Cli::parse()) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    if config.api_key.is_empty() {
        tracing::warn!("no Typesense API key configured; upstream requests will likely be rejected");
    }
    if !config.verify_tls {
        tracing::info!("upstream TLS certificate verification is disabled");
    }

    // ── 3. Upstream client ───────────────────────────────────────
    let client = match TypesenseClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "failed to build HTTP client");
            return ExitCode::FAILURE;
        }
    };

    let nodes: Vec<String> = config.nodes.iter().map(ToString::to_string).collect();
    tracing::info!(?nodes, targets = config.targets.len(), "initialized Typesense collector");

    // ── 4. Build shared state & router ───────────────────────────
    let listen = config.listen;
    let state = Arc::new(AppState {
        collector: Collector::new(client, config),
    });
    let app = server::create_router(state);

    // ── 5. Bind & serve ──────────────────────────────────────────
    let listener = match tokio::net::TcpListener::bind(listen).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%listen, error = %e, "failed to bind listener");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("serving metrics on http://{listen}/metrics");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server exited with error");
        return ExitCode::FAILURE;
    }

    tracing::info!("shut down");
    ExitCode::SUCCESS
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
