//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers and upstream clients produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout log aggregation
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID (`x-request-id`) is attached to every request span
//! - Secrets (passwords, session tokens) never reach a log line

pub mod logging;
pub mod metrics;
