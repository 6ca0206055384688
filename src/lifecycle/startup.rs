//! Startup orchestration.
//!
//! Fail fast: any startup error is fatal. Order is config → logging →
//! metrics → listener, so traffic is only accepted once everything is ready.

use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{load_config, ConfigError, RelayConfig};
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("Failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Load the config file when given, defaults otherwise.
pub fn resolve_config(path: Option<&Path>) -> Result<RelayConfig, StartupError> {
    match path {
        Some(path) => Ok(load_config(path)?),
        None => Ok(RelayConfig::default()),
    }
}

/// Start the metrics exporter when enabled.
pub fn start_metrics(config: &RelayConfig) {
    if !config.observability.metrics_enabled {
        return;
    }
    match config.observability.metrics_address.parse::<SocketAddr>() {
        Ok(addr) => metrics::init_metrics(addr),
        Err(e) => tracing::error!(
            metrics_address = %config.observability.metrics_address,
            error = %e,
            "Failed to parse metrics address"
        ),
    }
}

/// Bind the relay listener.
pub async fn bind(config: &RelayConfig) -> Result<TcpListener, StartupError> {
    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;
    Ok(listener)
}
