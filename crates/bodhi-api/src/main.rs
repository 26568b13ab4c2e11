//! bodhi-api - HTTP API server for the Bodhi interactor

use std::sync::Arc;

use tracing::{info, warn};

use bodhi_api::{build_router, telemetry, AppState, BackendKind, ServerConfig};
use bodhi_chain::{ChainGate, JsonRpcBalanceReader};
use bodhi_core::defaults::BODHI_TABLES;
use bodhi_core::RowStore;
use bodhi_db::{
    create_pool_with_config, MemoryRowStore, PgRowStore, PoolConfig, RestConfig, RestRowStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env()?;

    let _log_guard = telemetry::init_tracing(&config.log);

    info!(
        log_format = config.log.format.as_str(),
        log_file = config.log.file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    // Backend
    let store: Arc<dyn RowStore> = match &config.backend {
        BackendKind::Postgres {
            database_url,
            max_connections,
        } => {
            let pool = create_pool_with_config(
                database_url,
                PoolConfig::default().max_connections(*max_connections),
            )
            .await?;
            Arc::new(PgRowStore::new(pool))
        }
        BackendKind::PostgRest { url, service_key } => Arc::new(RestRowStore::new(
            RestConfig::new(url.clone(), service_key.clone()),
        )?),
        BackendKind::Memory => {
            warn!(
                subsystem = "api",
                backend = "memory",
                "In-memory backend: Bodhi tables start empty and nothing is persisted"
            );
            Arc::new(MemoryRowStore::with_empty_tables(&BODHI_TABLES))
        }
    };
    info!(
        subsystem = "api",
        backend = store.backend_name(),
        admin_key_configured = config.admin_key.is_some(),
        "Backend ready"
    );

    // Chain gate (fixed network, contract, and asset)
    let gate = ChainGate::bodhi(Arc::new(JsonRpcBalanceReader::bodhi()?));

    let state = AppState::new(store, gate, config.admin_key.clone());
    let app = build_router(state, &config.allowed_origins);

    // Start server
    let addr = config.bind_addr()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
