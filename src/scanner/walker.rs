//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing a directory
//! tree and collecting [`FileRecord`] snapshots for duplicate detection.
//!
//! # Features
//!
//! - Deterministic order (entries sorted by file name per directory)
//! - Symlinks are never followed, so cycles and escapes outside the root
//!   are impossible
//! - Excluded subtrees (the quarantine directory) are pruned, not filtered
//! - Metadata comes from `lstat`, which does not materialize cloud-backed
//!   placeholder files
//! - Per-entry failures are yielded as [`ScanError`] values; iteration
//!   always continues
//!
//! # Example
//!
//! ```no_run
//! use dupedoctor::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Pictures"), WalkerConfig::default());
//! let (files, errors): (Vec<_>, Vec<_>) = walker.walk().partition(Result::is_ok);
//! println!("{} files, {} skipped", files.len(), errors.len());
//! ```

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use super::{FileRecord, ScanError, WalkerConfig};

/// Directory walker for file discovery.
///
/// A walk is not restartable; calling [`Walker::walk`] again re-reads the tree.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk (absolute)
    root: PathBuf,
    /// Walker configuration, excluded dirs made absolute
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// Relative roots and excluded directories are resolved against the
    /// current directory so every yielded path is absolute.
    #[must_use]
    pub fn new(path: &Path, mut config: WalkerConfig) -> Self {
        config.excluded_dirs = config
            .excluded_dirs
            .iter()
            .map(|dir| absolute(dir))
            .collect();
        Self {
            root: absolute(path),
            config,
        }
    }

    /// Root directory being walked.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_excluded_dir(&self, entry: &DirEntry) -> bool {
        entry.file_type().is_dir()
            && self
                .config
                .excluded_dirs
                .iter()
                .any(|dir| entry.path() == dir.as_path())
    }

    /// Walk the directory tree, yielding file records.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping iteration.
    /// A root that is a file yields a single [`ScanError::NotADirectory`].
    pub fn walk(&self) -> impl Iterator<Item = Result<FileRecord, ScanError>> + '_ {
        let limit = self.config.max_files.unwrap_or(usize::MAX);
        let mut yielded = 0usize;

        let root_is_file = std::fs::metadata(&self.root).is_ok_and(|m| !m.is_dir());
        let root_error = root_is_file.then(|| {
            log::warn!("Walk root is not a directory: {}", self.root.display());
            Err(ScanError::NotADirectory(self.root.clone()))
        });

        let entries = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| {
                if self.is_excluded_dir(entry) {
                    log::debug!("Skipping excluded directory: {}", entry.path().display());
                    return false;
                }
                true
            })
            .filter(move |_| !root_is_file)
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => self.process_entry(&entry),
                Err(e) => Some(Err(self.handle_walkdir_error(e))),
            })
            .take_while(move |item| {
                if item.is_ok() {
                    if yielded >= limit {
                        log::debug!("Walker: file limit {} reached", limit);
                        return false;
                    }
                    yielded += 1;
                }
                true
            });

        root_error.into_iter().chain(entries)
    }

    /// Turn a directory entry into a record, or skip it.
    fn process_entry(&self, entry: &DirEntry) -> Option<Result<FileRecord, ScanError>> {
        let file_type = entry.file_type();

        if file_type.is_dir() {
            return None;
        }

        if file_type.is_symlink() {
            log::trace!("Skipping symlink: {}", entry.path().display());
            return None;
        }

        let ext = entry
            .path()
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !self.config.extension_allowed(&ext) {
            log::trace!("Skipping file due to extension filter: {}", entry.path().display());
            return None;
        }

        // follow_links(false) makes this an lstat
        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => return Some(Err(self.handle_walkdir_error(e))),
        };

        if !metadata.is_file() {
            return None;
        }

        Some(Ok(FileRecord::from_metadata(
            entry.path().to_path_buf(),
            &metadata,
        )))
    }

    /// Convert a walkdir error into a [`ScanError`].
    fn handle_walkdir_error(&self, error: walkdir::Error) -> ScanError {
        use std::io::ErrorKind;

        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);

        match error.io_error().map(std::io::Error::kind) {
            Some(ErrorKind::PermissionDenied) => {
                log::warn!("Permission denied: {}", path.display());
                ScanError::PermissionDenied(path)
            }
            Some(ErrorKind::NotFound) => {
                log::debug!("File not found (may have been deleted): {}", path.display());
                ScanError::NotFound(path)
            }
            _ => {
                log::warn!("Walker error for {}: {}", path.display(), error);
                let source = error
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
                ScanError::Io { path, source }
            }
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
