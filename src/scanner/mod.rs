//! Scanner module for directory traversal and file fingerprint inputs.
//!
//! This module provides functionality for:
//! - Single-threaded, deterministic directory walking using walkdir
//! - Streamed SHA-256 content hashing
//! - Copy-marker name normalization (`" - Copy"`, `" (2)"`)
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and [`FileRecord`] discovery
//! - [`hasher`]: SHA-256 file hashing in fixed-size chunks
//! - [`normalize`]: Presumed-original base name for heuristic matching
//!
//! # Example
//!
//! ```no_run
//! use dupedoctor::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig::default().with_exclude_extensions(["py", "pyc"]);
//!
//! let walker = Walker::new(Path::new("."), config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod normalize;
pub mod walker;

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::error::{Diagnostic, DiagnosticKind};

// Re-export main types
pub use hasher::{hash_to_hex, Hash, Hasher, HASH_CHUNK_SIZE};
pub use normalize::normalize_name;
pub use walker::Walker;

/// Extensions treated as images by the `--images-only` preset.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp", "heic", "raw",
];

/// Immutable snapshot of a file taken at scan time.
///
/// Staleness (the file changing between scan and move) is an accepted race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File name including extension
    pub name: String,
    /// Lowercased extension with leading dot, or empty
    pub extension: String,
    /// File size in bytes
    pub size: u64,
    /// Creation time (falls back to modification time where unsupported)
    pub created: SystemTime,
    /// Last modification time
    pub modified: SystemTime,
}

impl FileRecord {
    /// Create a new record, deriving `name` and `extension` from the path.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, created: SystemTime, modified: SystemTime) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        Self {
            path,
            name,
            extension,
            size,
            created,
            modified,
        }
    }

    /// Build a record from already-fetched (non-following) metadata.
    #[must_use]
    pub fn from_metadata(path: PathBuf, metadata: &Metadata) -> Self {
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let created = metadata.created().unwrap_or(modified);
        Self::new(path, metadata.len(), created, modified)
    }

    /// File name without its final extension.
    #[must_use]
    pub fn stem(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) if idx > 0 && !self.extension.is_empty() => &self.name[..idx],
            _ => &self.name,
        }
    }

    /// Character count of the file name, used by canonical selection.
    #[must_use]
    pub fn name_len(&self) -> usize {
        self.name.chars().count()
    }
}

/// Normalize a user-supplied extension: trimmed, lowercased, no leading dot.
///
/// ```
/// use dupedoctor::scanner::normalize_extension;
///
/// assert_eq!(normalize_extension(" .JPG "), "jpg");
/// assert_eq!(normalize_extension("py"), "py");
/// ```
#[must_use]
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Subtrees never descended into (the quarantine directory).
    pub excluded_dirs: Vec<PathBuf>,

    /// Extensions (lowercase, no dot) whose files are skipped.
    pub exclude_extensions: Vec<String>,

    /// When non-empty, only files with these extensions are yielded.
    pub include_extensions: Vec<String>,

    /// Stop after yielding this many records.
    pub max_files: Option<usize>,
}

impl WalkerConfig {
    /// Add a subtree to skip.
    #[must_use]
    pub fn with_excluded_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.excluded_dirs.push(dir.into());
        self
    }

    /// Set extensions to skip (case-insensitive, leading dot optional).
    #[must_use]
    pub fn with_exclude_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude_extensions = normalize_extension_list(exts);
        self
    }

    /// Restrict the walk to these extensions.
    #[must_use]
    pub fn with_include_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.include_extensions = normalize_extension_list(exts);
        self
    }

    /// Cap the number of yielded records.
    #[must_use]
    pub fn with_max_files(mut self, max: usize) -> Self {
        self.max_files = Some(max);
        self
    }

    /// Check whether a file with this extension (no dot, any case) passes the filters.
    #[must_use]
    pub fn extension_allowed(&self, ext: &str) -> bool {
        let ext = ext.to_lowercase();
        if self.exclude_extensions.iter().any(|e| *e == ext) {
            return false;
        }
        self.include_extensions.is_empty() || self.include_extensions.iter().any(|e| *e == ext)
    }
}

fn normalize_extension_list<I, S>(exts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    exts.into_iter()
        .map(|e| normalize_extension(e.as_ref()))
        .filter(|e| !e.is_empty())
        .collect()
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Content hashing failed; the file is excluded from grouping.
    #[error(transparent)]
    HashError(#[from] HashError),
}

impl ScanError {
    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) | Self::NotADirectory(p) => p,
            Self::Io { path, .. } => path,
            Self::HashError(e) => e.path(),
        }
    }

    /// Convert into the per-run diagnostic record.
    #[must_use]
    pub fn to_diagnostic(&self) -> Diagnostic {
        let kind = match self {
            Self::PermissionDenied(_) | Self::HashError(HashError::PermissionDenied(_)) => {
                DiagnosticKind::AccessDenied
            }
            _ => DiagnosticKind::NotReadable,
        };
        Diagnostic::new(self.path(), kind, self.to_string())
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error raised while reading `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) => p,
            Self::Io { path, .. } => path,
        }
    }
}
