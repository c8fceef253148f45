use calorie_counter::{load_documents, sync_router, KvState, SyncServerConfig, SystemClock};
use std::{net::SocketAddr, sync::Arc};
use tokio::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = SyncServerConfig::from_env();
    if let Some(parent) = config.data_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let documents = load_documents(&config.data_path).await;
    info!(devices = documents.len(), "loaded sync store");
    let state = KvState::new(Some(config.data_path), documents, Arc::new(SystemClock));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("sync service listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, sync_router(state)).await?;

    Ok(())
}
