//! Feedback Hub Server: realtime support-ticket notifications
//!
//! Main entry point that wires the crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use feedback_api::{AppState, build_app};
use feedback_core::config::AppConfig;
use feedback_core::AppResult;
use feedback_core::error::AppError;
use feedback_realtime::RealtimeEngine;
use feedback_realtime::notification::StaticOperators;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from `config/` and the environment.
fn load_configuration() -> AppResult<AppConfig> {
    let env = std::env::var("FEEDBACK_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> AppResult<()> {
    tracing::info!("Starting Feedback Hub v{}", env!("CARGO_PKG_VERSION"));

    let operators = Arc::new(StaticOperators::new(config.operators.ids.iter().copied()));
    let engine = RealtimeEngine::start(&config.realtime, operators);

    let addr = config.server.bind_address();
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let app = build_app(AppState::new(Arc::new(config), engine.clone()));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("Feedback Hub listening on {}", addr);

    let shutdown_engine = engine.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            // Upgraded sockets are not drained by axum; close them here.
            shutdown_engine.shutdown().await;
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    if tokio::time::timeout(grace, engine.shutdown()).await.is_err() {
        tracing::warn!("Realtime shutdown timed out after {:?}", grace);
    }

    tracing::info!("Feedback Hub shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
