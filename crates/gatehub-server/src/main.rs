//! gatehub server binary.
//!
//! Wires the pieces together: opens the card registry (fatal on failure),
//! starts the combined HTTP/WebSocket listener (fatal on bind failure), and
//! spawns the serial bridge and the admin console as long-lived tasks. A
//! serial connect failure is logged but does not stop the server: the
//! dashboards and console keep working, and the bridge can be restarted by
//! restarting the process.

mod config;
mod console;
mod routes;

use config::ServerConfig;
use gatehub_realtime::{ClientHub, HubState};
use gatehub_registry::{AccessEvaluator, CardRegistry, Database, DatabaseConfig, SqliteCardRegistry};
use gatehub_serial::SerialBridge;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    info!(
        http_addr = %config.http_addr,
        serial_port = %config.serial.port,
        database = %config.database_path,
        "Starting gatehub server"
    );

    let db = Database::new(DatabaseConfig::new(&config.database_path)).await?;
    let registry = SqliteCardRegistry::new(db.pool().clone(), &config.media_dir);
    let evaluator = AccessEvaluator::new(registry.clone(), config.media_base_url.clone());
    let hub = Arc::new(ClientHub::new());

    let cards = registry.list().await?;
    info!(count = cards.len(), "Card registry loaded");

    let bridge = SerialBridge::new(config.serial.clone(), evaluator.clone(), Arc::clone(&hub));
    tokio::spawn(async move {
        if let Err(e) = bridge.run().await {
            error!(error = %e, "Serial bridge exited");
        }
    });

    tokio::spawn(console::run(registry.clone()));

    let state = HubState { hub, evaluator };
    let app = routes::router(state, &config.media_dir, &config.static_dir);

    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    info!(addr = %config.http_addr, "HTTP/WebSocket server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
