//! Cost Estimate Service - HTTP API for member cost-sharing estimates
//!
//! This is the main entry point for the cost estimate service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cost_estimate_service::{create_router, AppState, ServiceConfig, StoreBackend};
use cost_estimate_store::{AccumulatorStore, MemoryStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cost_estimate=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Cost Estimate Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env()?;

    tracing::info!(
        listen_addr = %config.listen_addr,
        store_backend = config.store_backend.as_str(),
        data_dir = %config.data_dir,
        commit_max_retries = config.commit_max_retries,
        "Service configuration loaded"
    );

    let store = open_store(&config)?;

    // Build app state
    let state = AppState::new(store, config.clone());

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn open_store(
    config: &ServiceConfig,
) -> Result<Arc<dyn AccumulatorStore>, Box<dyn std::error::Error>> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; balances are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        #[cfg(feature = "rocksdb-backend")]
        StoreBackend::RocksDb => {
            tracing::info!(path = %config.data_dir, "Opening RocksDB store");
            Ok(Arc::new(cost_estimate_store::RocksStore::open(
                &config.data_dir,
            )?))
        }
        #[cfg(not(feature = "rocksdb-backend"))]
        StoreBackend::RocksDb => {
            Err("STORE_BACKEND=rocksdb requires the rocksdb-backend feature".into())
        }
    }
}
