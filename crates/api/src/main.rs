//! Robot Storefront - API Server Entry Point

use anyhow::Context;
use api::{init_logging, init_metrics, run_server, ApiConfig, AppState};
use std::path::PathBuf;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var_os("STOREFRONT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("storefront.toml"));
    let config = ApiConfig::load(Some(&config_path)).context("loading configuration")?;
    init_logging(&config.log_level);

    info!("=== Robot Storefront API v{} ===", env!("CARGO_PKG_VERSION"));
    if config.jwt_secret == ApiConfig::default().jwt_secret {
        warn!("Using the built-in JWT secret; set STOREFRONT__JWT_SECRET");
    }

    let mut state = AppState::new(config.clone());
    if state.oauth.is_none() {
        info!("Google sign-in disabled");
    }
    if config.metrics_enabled {
        if let Some(handle) = init_metrics() {
            state = state.with_metrics(handle);
        }
    }

    if let Some(path) = &config.catalog_path {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading catalog {}", path))?;
        let count = state.repository.seed_robots_from_json(&json)?;
        info!("Catalog ready with {} robots", count);
    }

    run_server(state).await
}
