//! devrpg-mcp - Dev-RPG analysis backend
//!
//! Serves one analysis kind, chosen with `--kind`, behind `POST /analyze`.

use anyhow::Result;
use clap::Parser;
use devrpg_common::config::load_toml_config;
use tokio::signal;
use tracing::{info, warn};

use devrpg_mcp::{build_router, Args, McpConfig, McpState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting Dev-RPG analysis backend (devrpg-mcp) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let toml_config = load_toml_config(args.config.as_deref())?;
    let config = McpConfig::resolve(args, &toml_config);

    let state = McpState::from_config(&config)?;
    info!(service = %config.service.service_name(), "Backend configured");

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!("devrpg-mcp listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
