//! Archive entry naming.

use std::collections::HashSet;

/// Extensions Tableau uses for workbooks.
const WORKBOOK_EXTENSIONS: [&str; 2] = [".twb", ".twbx"];

/// Turn a workbook display name into a safe archive entry name.
///
/// Names already ending in `.twb`/`.twbx` keep their extension, anything
/// else gets `.{default_extension}` appended. Characters that are illegal in
/// file names (`<>:"/\|?*` and control characters) become `_`.
pub fn entry_name(name: &str, default_extension: &str) -> String {
    let with_extension = if WORKBOOK_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
        name.to_string()
    } else {
        format!("{name}.{default_extension}")
    };

    with_extension
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Hands out entry names that are unique within one archive.
#[derive(Debug, Default)]
pub struct EntryNames {
    used: HashSet<String>,
}

impl EntryNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `candidate`, suffixing ` (2)`, ` (3)`, ... before the
    /// extension when it is already taken.
    pub fn reserve(&mut self, candidate: String) -> String {
        if self.used.insert(candidate.clone()) {
            return candidate;
        }

        let (stem, extension) = WORKBOOK_EXTENSIONS
            .iter()
            .find_map(|ext| Some((candidate.strip_suffix(ext)?, *ext)))
            .unwrap_or((candidate.as_str(), ""));

        let mut counter = 2;
        loop {
            let name = format!("{stem} ({counter}){extension}");
            if self.used.insert(name.clone()) {
                return name;
            }
            counter += 1;
        }
    }
}
