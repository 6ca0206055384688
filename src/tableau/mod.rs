//! Tableau upstream integration subsystem.
//!
//! # Data Flow
//! ```text
//! Credentials (per request, never stored)
//!     → types.rs (validation, typed sign-in XML)
//!     → client.rs (sign-in → Session, listings, content downloads)
//! ```
//!
//! # Security Constraints
//! - Never log passwords or session tokens
//! - Session tokens are only sent to the instance they were issued by

pub mod client;
pub mod types;

pub use client::TableauClient;
pub use types::{Credentials, Project, Session, TableauError, TableauResult, Workbook};
