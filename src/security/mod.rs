//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (CORS preflight / response headers)
//!     → body size limit (axum `DefaultBodyLimit`, `security.max_body_size`)
//!     → Pass to handlers
//! ```
//!
//! Credentials are validated and XML-escaped in `tableau::types` before
//! they leave the process.

pub mod headers;

pub use headers::cors_layer;
