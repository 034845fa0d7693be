//! Server configuration from environment variables.
//!
//! Every setting has a default suited to a single-board deployment next to
//! the reader; set the `GATEHUB_*` variables to override.

use anyhow::Context;
use gatehub_serial::SerialBridgeConfig;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the combined HTTP/WebSocket listener binds to.
    pub http_addr: SocketAddr,

    /// SQLite database file path.
    pub database_path: String,

    /// Directory uploaded card images are written to and served from.
    pub media_dir: PathBuf,

    /// Directory of dashboard assets served at the root.
    pub static_dir: PathBuf,

    /// URL prefix dashboards fetch card images from.
    pub media_base_url: String,

    /// Serial connection to the reader.
    pub serial: SerialBridgeConfig,
}

impl ServerConfig {
    /// Read configuration from the environment, falling back to defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let http_addr: SocketAddr = env_or("GATEHUB_HTTP_ADDR", "0.0.0.0:8080")
            .parse()
            .context("GATEHUB_HTTP_ADDR is not a valid socket address")?;

        let baud_rate: u32 = env_or("GATEHUB_BAUD_RATE", "115200")
            .parse()
            .context("GATEHUB_BAUD_RATE is not a number")?;

        let media_base_url = std::env::var("GATEHUB_MEDIA_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}/media", http_addr.port()));

        Ok(Self {
            http_addr,
            database_path: env_or("GATEHUB_DB", "gatehub.db"),
            media_dir: PathBuf::from(env_or("GATEHUB_MEDIA_DIR", "media")),
            static_dir: PathBuf::from(env_or("GATEHUB_STATIC_DIR", "static")),
            media_base_url,
            serial: SerialBridgeConfig {
                port: env_or("GATEHUB_SERIAL_PORT", "/dev/ttyACM0"),
                baud_rate,
            },
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
