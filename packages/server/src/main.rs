use std::sync::Arc;

use tracing::{Level, info};

use sharebox::config::AppConfig;
use sharebox::state::AppState;
use sharebox::store::{MemoryStore, SeaOrmStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;
    let blobs = common::storage::open_blob_store(&config.storage).await?;

    let state = if config.database.is_memory() {
        tracing::warn!("Using in-memory structured store; records will not survive a restart");
        AppState::new(config.clone(), Arc::new(MemoryStore::new()), blobs)
    } else {
        let db = sharebox::database::init_db(&config.database).await?;
        AppState::new(config.clone(), Arc::new(SeaOrmStore::new(db)), blobs)
    };

    let app = sharebox::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
