//! In-memory zip assembly.

use std::io::{Cursor, Write};

use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::archive::naming::{entry_name, EntryNames};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Builds one archive for one response.
pub struct ArchiveBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    names: EntryNames,
    default_extension: String,
    entries: Vec<String>,
}

impl ArchiveBuilder {
    pub fn new(default_extension: &str) -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            names: EntryNames::new(),
            default_extension: default_extension.to_string(),
            entries: Vec::new(),
        }
    }

    /// Add a workbook under a sanitized, unique entry name. Returns the
    /// name actually used.
    pub fn add(&mut self, display_name: &str, content: &[u8]) -> ArchiveResult<String> {
        let name = self
            .names
            .reserve(entry_name(display_name, &self.default_extension));

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(content.len() as u64 >= u32::MAX as u64);

        self.writer.start_file(name.as_str(), options)?;
        self.writer.write_all(content)?;
        self.entries.push(name.clone());
        Ok(name)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Finalize the central directory and return the archive bytes.
    pub fn finish(self) -> ArchiveResult<Vec<u8>> {
        Ok(self.writer.finish()?.into_inner())
    }
}
