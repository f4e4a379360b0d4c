mod config;
mod metrics;
mod reputation;
mod web;

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{Config, LogConfig};
use crate::web::server::WebServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load config (first so the log format can be chosen from it)
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "agent-trust.toml".to_string());

    let loaded = Config::load_if_present(&config_path)?;
    let from_file = loaded.is_some();
    let config = loaded.unwrap_or_default();

    init_tracing(&config.log);

    info!("🤝 agent-trust v{} starting...", env!("CARGO_PKG_VERSION"));
    if from_file {
        info!("Config loaded from {}", config_path);
    } else {
        warn!("Config file '{}' not found, using defaults", config_path);
    }

    let server = WebServer::new(Arc::new(config))?;
    server.run().await
}

fn init_tracing(log: &LogConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "agent_trust=info".into());

    if log.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
