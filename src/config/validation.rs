//! Configuration validation.
//!
//! Serde handles syntax; this checks value ranges and formats. All errors
//! are collected, not just the first.

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::RelayConfig;

/// Upper bound for `downloads.max_concurrent`.
pub const MAX_CONCURRENT_DOWNLOADS: usize = 64;

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    for (field, value) in [
        ("timeouts.connect_secs", config.timeouts.connect_secs),
        ("timeouts.upstream_secs", config.timeouts.upstream_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("downloads.item_timeout_secs", config.downloads.item_timeout_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }

    let max = config.downloads.max_concurrent;
    if max == 0 || max > MAX_CONCURRENT_DOWNLOADS {
        errors.push(ValidationError::new(
            "downloads.max_concurrent",
            format!("must be between 1 and {MAX_CONCURRENT_DOWNLOADS}, got {max}"),
        ));
    }

    if config.downloads.max_item_bytes == 0 {
        errors.push(ValidationError::new(
            "downloads.max_item_bytes",
            "must be greater than zero",
        ));
    }

    if !config.downloads.archive_name.ends_with(".zip") {
        errors.push(ValidationError::new("downloads.archive_name", "must end with .zip"));
    }

    if !matches!(config.downloads.default_extension.as_str(), "twb" | "twbx") {
        errors.push(ValidationError::new(
            "downloads.default_extension",
            "must be 'twb' or 'twbx'",
        ));
    }

    if !matches!(config.tableau.scheme.as_str(), "http" | "https") {
        errors.push(ValidationError::new("tableau.scheme", "must be 'http' or 'https'"));
    }

    if config.tableau.api_version.trim().is_empty() {
        errors.push(ValidationError::new("tableau.api_version", "must not be empty"));
    }

    if config.tableau.page_size == 0 {
        errors.push(ValidationError::new("tableau.page_size", "must be greater than zero"));
    }

    match url::Url::parse(&config.generation.endpoint) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => errors.push(ValidationError::new(
            "generation.endpoint",
            format!("'{}' is not an absolute http(s) URL", config.generation.endpoint),
        )),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
