//! devrpg-gateway - Dev-RPG analysis gateway
//!
//! Accepts analysis requests, fans them out to the analysis backends, scores
//! the combined result and records it with the experience and badges earned.

use anyhow::Result;
use clap::Parser;
use devrpg_common::config::load_toml_config;
use tokio::signal;
use tracing::{error, info, warn};

use devrpg_gateway::{build_router, db, AppState, Args, GatewayConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting Dev-RPG gateway (devrpg-gateway) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let toml_config = load_toml_config(args.config.as_deref())?;
    let config = GatewayConfig::resolve(args, &toml_config);

    for (service, url) in &config.services {
        info!(service = %service, url = %url, "Analysis backend configured");
    }

    // Analysis keeps working without a database; persistence endpoints answer 503
    let pool = match db::init_database(&config.database_url, &config.pool).await {
        Ok(pool) => Some(pool),
        Err(e) => {
            error!(error = %e, "Database unavailable, continuing without persistence");
            None
        }
    };

    let bind = config.bind.clone();
    let state = AppState::new(pool.clone(), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("devrpg-gateway listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        pool.close().await;
        info!("Database pool closed");
    }

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
