use kiosk_heatmap::{AnalyticsLogger, AppState, LoggerOptions, ServerConfig, Store, router};
use std::{net::SocketAddr, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = ServerConfig::from_env()?;
    let store = Store::open(config.data_path.clone())
        .await
        .map_err(|err| err.message)?;

    let logger = Arc::new(AnalyticsLogger::new(
        store.clone(),
        LoggerOptions {
            heartbeat: config.heartbeat,
            move_sample_rate: config.move_sample_rate,
        },
    ));
    logger.start().await.map_err(|err| err.message)?;

    let app = router(AppState::new(store, Arc::clone(&logger), config.heatmap));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(err) = logger.stop().await {
        error!("failed to close analytics session: {}", err.message);
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
