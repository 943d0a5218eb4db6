//! Durable move log enabling undo.
//!
//! The log is a CSV file colocated with the quarantine root
//! (`moved_duplicates_log.csv`). Each row records one successful relocation:
//!
//! ```text
//! Original Path,Moved To,Size,Date Modified,Date Created,Moved At
//! ```
//!
//! Timestamps are RFC 3339 in local time. The file is append-only: a second
//! run against the same quarantine adds rows below the existing ones without
//! repeating the header.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scanner::FileRecord;

/// File name of the move log inside the quarantine root.
pub const LOG_FILE_NAME: &str = "moved_duplicates_log.csv";

/// Error type for move log operations.
#[derive(Debug, Error)]
pub enum MoveLogError {
    /// Reading, writing or removing the log file failed.
    #[error("move log I/O error for {path}: {source}")]
    Io {
        /// Log file path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The log content could not be encoded or parsed.
    #[error("malformed move log {path}: {source}")]
    Csv {
        /// Log file path
        path: PathBuf,
        /// The underlying CSV error
        #[source]
        source: csv::Error,
    },

    /// The log exists but holds no entries.
    #[error("move log has no entries: {0}")]
    Empty(PathBuf),
}

/// One successful relocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveLogEntry {
    /// Where the file lived before quarantine
    #[serde(rename = "Original Path")]
    pub source: PathBuf,
    /// Where the file lives in quarantine
    #[serde(rename = "Moved To")]
    pub destination: PathBuf,
    /// Size in bytes at scan time
    #[serde(rename = "Size")]
    pub size: u64,
    /// Modification time at scan time
    #[serde(rename = "Date Modified")]
    pub modified: DateTime<Local>,
    /// Creation time at scan time
    #[serde(rename = "Date Created")]
    pub created: DateTime<Local>,
    /// When the move happened (or was planned, for dry runs)
    #[serde(rename = "Moved At")]
    pub moved_at: DateTime<Local>,
}

impl MoveLogEntry {
    /// Build an entry for `record` relocated to `destination` at `moved_at`.
    #[must_use]
    pub fn from_record(record: &FileRecord, destination: PathBuf, moved_at: DateTime<Local>) -> Self {
        Self {
            source: record.path.clone(),
            destination,
            size: record.size,
            modified: DateTime::<Local>::from(record.modified),
            created: DateTime::<Local>::from(record.created),
            moved_at,
        }
    }
}

/// Handle to a move log file.
#[derive(Debug, Clone)]
pub struct MoveLog {
    path: PathBuf,
}

impl MoveLog {
    /// Log stored at an explicit path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Log colocated with `quarantine_root`.
    #[must_use]
    pub fn in_quarantine(quarantine_root: &Path) -> Self {
        Self::new(quarantine_root.join(LOG_FILE_NAME))
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the log file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Append entries, writing the header only when the file is new.
    ///
    /// An empty slice is a no-op and never creates the file.
    ///
    /// # Errors
    ///
    /// Returns [`MoveLogError`] if the file cannot be opened or written.
    pub fn append(&self, entries: &[MoveLogEntry]) -> Result<usize, MoveLogError> {
        if entries.is_empty() {
            return Ok(0);
        }

        let needs_header = fs::metadata(&self.path).map_or(true, |m| m.len() == 0);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        for entry in entries {
            writer.serialize(entry).map_err(|e| self.csv_error(e))?;
        }
        writer.flush().map_err(|e| self.io_error(e))?;

        log::debug!("Appended {} entries to {}", entries.len(), self.path.display());
        Ok(entries.len())
    }

    /// Read every entry in file order.
    ///
    /// # Errors
    ///
    /// Returns [`MoveLogError::Io`] when the file cannot be opened,
    /// [`MoveLogError::Csv`] for malformed rows and [`MoveLogError::Empty`]
    /// when there are no rows.
    pub fn read(&self) -> Result<Vec<MoveLogEntry>, MoveLogError> {
        let file = fs::File::open(&self.path).map_err(|e| self.io_error(e))?;
        let mut reader = csv::Reader::from_reader(file);
        let entries = reader
            .deserialize()
            .collect::<Result<Vec<MoveLogEntry>, _>>()
            .map_err(|e| self.csv_error(e))?;

        if entries.is_empty() {
            return Err(MoveLogError::Empty(self.path.clone()));
        }
        Ok(entries)
    }

    /// Replace the log content with `entries`.
    ///
    /// The new content is written next to the log and renamed over it, so a
    /// crash never leaves a half-written log. An empty slice removes the file.
    ///
    /// # Errors
    ///
    /// Returns [`MoveLogError`] if the replacement cannot be written.
    pub fn rewrite(&self, entries: &[MoveLogEntry]) -> Result<usize, MoveLogError> {
        if entries.is_empty() {
            return if self.exists() { self.remove().map(|()| 0) } else { Ok(0) };
        }

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let file = fs::File::create(&tmp_path).map_err(|e| self.io_error(e))?;
        let mut writer = csv::Writer::from_writer(file);
        for entry in entries {
            writer.serialize(entry).map_err(|e| self.csv_error(e))?;
        }
        writer.flush().map_err(|e| self.io_error(e))?;
        drop(writer);

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            self.io_error(e)
        })?;

        log::debug!("Rewrote {} with {} entries", self.path.display(), entries.len());
        Ok(entries.len())
    }

    /// Delete the log file (consume it).
    ///
    /// # Errors
    ///
    /// Returns [`MoveLogError::Io`] if removal fails.
    pub fn remove(&self) -> Result<(), MoveLogError> {
        fs::remove_file(&self.path).map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: std::io::Error) -> MoveLogError {
        MoveLogError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn csv_error(&self, source: csv::Error) -> MoveLogError {
        MoveLogError::Csv {
            path: self.path.clone(),
            source,
        }
    }
}
