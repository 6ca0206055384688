//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Archive assembly limits.
    pub downloads: DownloadConfig,

    /// Outbound HTTP client settings.
    pub upstream: UpstreamConfig,

    /// Upstream Tableau REST API settings.
    pub tableau: TableauConfig,

    /// Text-generation forwarding settings.
    pub generation: GenerationConfig,

    /// Cross-origin policy.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:4000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:4000".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Deadline for a single upstream call (sign-in, listing, generation).
    pub upstream_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            upstream_secs: 60,
            request_secs: 300,
        }
    }
}

/// Limits applied while bundling workbooks into an archive.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Maximum simultaneous workbook downloads per request.
    pub max_concurrent: usize,

    /// Deadline for a single workbook download in seconds.
    pub item_timeout_secs: u64,

    /// Largest workbook body accepted, in bytes.
    pub max_item_bytes: u64,

    /// File name announced in `Content-Disposition`.
    pub archive_name: String,

    /// Extension appended to entry names lacking `.twb`/`.twbx`.
    pub default_extension: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 8,
            item_timeout_secs: 120,
            max_item_bytes: 512 * 1024 * 1024, // 512MB
            archive_name: "workbooks.zip".to_string(),
            default_extension: "twbx".to_string(),
        }
    }
}

/// Outbound HTTP client settings shared by every upstream call.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Honor `HTTP_PROXY`/`HTTPS_PROXY` from the environment.
    pub system_proxy: bool,

    /// `User-Agent` sent upstream.
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            system_proxy: true,
            user_agent: concat!("tableau-relay/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Upstream Tableau REST API settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TableauConfig {
    /// URL scheme used to reach the caller-supplied instance.
    pub scheme: String,

    /// REST API version segment (e.g., "3.24").
    pub api_version: String,

    /// `pageSize` sent with the project and workbook listings.
    pub page_size: u32,
}

impl Default for TableauConfig {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            api_version: "3.24".to_string(),
            page_size: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Text-generation endpoint that receives forwarded payloads.
    pub endpoint: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://gwcteq-partner.domo.com/api/ai/v1/text/generation".to_string(),
        }
    }
}

/// Cross-origin response headers applied to every route.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origin: String,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: "*".to_string(),
            allowed_methods: ["GET", "POST", "OPTIONS", "PUT", "DELETE"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}
