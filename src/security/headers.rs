//! Cross-origin response headers.
//!
//! The relay is called directly from a browser page on another origin, so
//! every route answers preflights and carries `Access-Control-Allow-*`.

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::CorsConfig;

/// Build the CORS layer from configuration. Unparseable entries are
/// skipped with a warning.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allowed_origin == "*" {
        AllowOrigin::from(Any)
    } else {
        match HeaderValue::from_str(&config.allowed_origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                tracing::warn!(origin = %config.allowed_origin, "Invalid CORS origin, allowing any");
                AllowOrigin::from(Any)
            }
        }
    };

    let methods: Vec<Method> = config
        .allowed_methods
        .iter()
        .filter_map(|m| match m.parse() {
            Ok(method) => Some(method),
            Err(_) => {
                tracing::warn!(method = %m, "Ignoring invalid CORS method");
                None
            }
        })
        .collect();

    let headers: Vec<HeaderName> = config
        .allowed_headers
        .iter()
        .filter_map(|h| match HeaderName::try_from(h.as_str()) {
            Ok(name) => Some(name),
            Err(_) => {
                tracing::warn!(header = %h, "Ignoring invalid CORS header");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(methods)
        .allow_headers(headers)
}
