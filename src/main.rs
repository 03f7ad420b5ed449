use anyhow::{bail, Result};
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tracing::{error, info, warn};

use videotube_backend::{
    config::Config, create_database, create_media_host, create_router,
    observability::init_logging, AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env_and_file()?;

    init_logging(&config.logging)?;
    info!("Starting VideoTube backend v{}", env!("CARGO_PKG_VERSION"));

    let database = create_database(&config.database).await?;

    // Refuse to serve traffic against an unreachable database
    let health = database.health_check().await?;
    if !health.connected {
        error!("Database health check failed: {}", health.status);
        bail!("Database not ready");
    }
    info!(
        "Database {} ready ({}ms)",
        health.database_type, health.response_time_ms
    );

    let media = create_media_host(&config.media)?;
    info!("Media host: {}", media.provider());

    let address = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, Arc::from(database), media)?;
    let app = create_router(state);

    let listener = TcpListener::bind(&address).await?;
    info!("Server listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
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
