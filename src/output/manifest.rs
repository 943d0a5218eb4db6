//! Metadata manifest: one CSV row per scanned file.
//!
//! # Columns
//!
//! - `Full Path`: absolute path
//! - `File Name`: name including extension
//! - `Size (Bytes)`: size in bytes
//! - `Date Created` / `Date Modified`: local time, `%Y-%m-%d %H:%M:%S`
//!
//! Files that could not be fingerprinted still appear here; files removed
//! by the extension filters never reach the walker output and so never do.

use std::io;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use serde::Serialize;
use thiserror::Error;

use crate::scanner::FileRecord;

/// Column names, in order.
pub const MANIFEST_HEADERS: [&str; 5] = [
    "Full Path",
    "File Name",
    "Size (Bytes)",
    "Date Created",
    "Date Modified",
];

/// Timestamp format used by the manifest.
pub const MANIFEST_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors that can occur while writing the manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct ManifestRow<'a> {
    #[serde(rename = "Full Path")]
    path: String,
    #[serde(rename = "File Name")]
    name: &'a str,
    #[serde(rename = "Size (Bytes)")]
    size: u64,
    #[serde(rename = "Date Created")]
    created: String,
    #[serde(rename = "Date Modified")]
    modified: String,
}

/// Metadata manifest writer.
pub struct ManifestOutput<'a> {
    files: &'a [FileRecord],
}

impl<'a> ManifestOutput<'a> {
    /// Create a manifest over the walked records.
    #[must_use]
    pub fn new(files: &'a [FileRecord]) -> Self {
        Self { files }
    }

    /// Write the manifest to the given writer.
    ///
    /// The header row is always written, even when no file was walked.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), ManifestError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        csv_writer.write_record(MANIFEST_HEADERS)?;

        for file in self.files {
            csv_writer.serialize(ManifestRow {
                path: file.path.to_string_lossy().into_owned(),
                name: &file.name,
                size: file.size,
                created: format_local(file.created),
                modified: format_local(file.modified),
            })?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate the manifest as a string.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError` if serialization fails.
    pub fn to_csv_string(&self) -> Result<String, ManifestError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Format a timestamp as local time for human review.
#[must_use]
pub fn format_local(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format(MANIFEST_TIME_FORMAT)
        .to_string()
}
