//! Tableau workbook relay library.
//!
//! Signs in to a Tableau Server/Online instance on behalf of a browser
//! client, lists projects with their workbooks, bundles selected workbooks
//! into a zip archive, and forwards text-generation payloads.

pub mod api;
pub mod archive;
pub mod config;
pub mod generation;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod tableau;

pub use config::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
