use anyhow::{Context, Result};
use facegif_core::EchoSwapProcessor;
use facegif_media::{catalog, Catalog, CatalogSearch};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod config;
mod dbus_interface;
mod engine;

use config::Config;
use dbus_interface::{StudioService, BUS_NAME, OBJECT_PATH};
use engine::Timeouts;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();
    tracing::info!(?config, "facegifd starting");

    let catalog = match &config.catalog_path {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("loading catalog {}", path.display()))?,
        None => catalog::demo_catalog().clone(),
    };
    tracing::info!(targets = catalog.len(), "target catalog loaded");

    let engine = engine::spawn_engine(
        Arc::new(CatalogSearch::new(catalog)),
        Arc::new(EchoSwapProcessor::new(
            config.process_delay(),
            config.process_jitter(),
        )),
        Timeouts {
            search: Duration::from_secs(config.search_timeout_secs),
            process: Duration::from_secs(config.process_timeout_secs),
        },
    )?;

    let service = StudioService::new(engine, config.download_dir.clone());
    let _conn = zbus::connection::Builder::session()?
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, service)?
        .build()
        .await
        .context("registering on the session bus")?;

    tracing::info!(bus = BUS_NAME, path = OBJECT_PATH, "facegifd ready");

    // Keep running until signaled
    tokio::signal::ctrl_c().await?;
    tracing::info!("facegifd shutting down");

    Ok(())
}
