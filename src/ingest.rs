//! Plain-text document ingestion.
//!
//! Richer formats (PDF, EPUB) are extracted by an upstream tool; this crate
//! only reads `.txt`.

use std::path::Path;

use crate::{Error, Result};

/// Read a document and split it into lines.
pub fn read_document(path: &Path) -> Result<Vec<String>> {
    let is_text = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"));
    if !is_text {
        return Err(Error::UnsupportedFormat(path.to_path_buf()));
    }

    let text = std::fs::read_to_string(path)?;
    Ok(text.trim().lines().map(str::to_string).collect())
}
