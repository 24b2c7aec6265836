//! Application setup and initialization
//!
//! Wiring kept out of main.rs so tests can build the same router.

pub mod routes;
pub mod server;
pub mod storage;
pub mod validation;

use crate::state::AppState;
use anyhow::{Context, Result};
use guestdrop_core::Config;
use guestdrop_db::EventRepository;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry(config.is_production())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    // Fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let storage = storage::setup_storage(&config).await?;

    tokio::fs::create_dir_all(config.staging_dir())
        .await
        .with_context(|| {
            format!(
                "Failed to create staging directory {}",
                config.staging_dir().display()
            )
        })?;

    let events = EventRepository::new(config.events_file().clone());
    tracing::info!(path = %events.path().display(), "Event registry ready");

    let state = Arc::new(AppState::new(config.clone(), storage, events));

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
