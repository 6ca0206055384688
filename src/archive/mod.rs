//! Workbook archive assembly subsystem.
//!
//! # Data Flow
//! ```text
//! client project tree
//!     → selection.rs (shape validation, flatten to download items)
//!     → fetch.rs (bounded concurrent downloads, per-item deadline)
//!     → naming.rs (sanitized, unique entry names)
//!     → builder.rs (deflate zip in memory)
//! ```
//!
//! Each archive belongs to exactly one response and is dropped after it
//! is sent.

pub mod builder;
pub mod fetch;
pub mod naming;
pub mod selection;

pub use builder::{ArchiveBuilder, ArchiveError, ArchiveResult};
pub use fetch::{fetch_all, BatchOutcome, FetchLimits};
pub use naming::entry_name;
pub use selection::{flatten, parse_selection, DownloadItem, SelectionError};

/// Pack every fetched workbook into one zip. Returns the archive bytes and
/// the entry names used.
pub fn build_archive(
    outcome: &BatchOutcome,
    default_extension: &str,
) -> ArchiveResult<(Vec<u8>, Vec<String>)> {
    let mut builder = ArchiveBuilder::new(default_extension);
    for workbook in &outcome.fetched {
        builder.add(&workbook.item.name, &workbook.content)?;
    }
    let entries = builder.entries().to_vec();
    Ok((builder.finish()?, entries))
}
