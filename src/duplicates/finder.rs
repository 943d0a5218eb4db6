//! Duplicate finder orchestrating walk, fingerprint and grouping.
//!
//! # Overview
//!
//! [`DuplicateFinder::find_duplicates`] runs the detection pipeline:
//! 1. **Walk** - collect [`FileRecord`]s with the [`Walker`]; per-entry
//!    failures become diagnostics and the walk continues
//! 2. **Fingerprint + group** - compute each record's key with the configured
//!    strategy and group them with [`group_by_fingerprint`]
//! 3. **Canonical selection** - done by [`DuplicateGroup::new`] for each group
//!
//! Both phases poll the optional [`CancelToken`] between files.
//!
//! # Example
//!
//! ```no_run
//! use dupedoctor::duplicates::{DuplicateFinder, FinderConfig, SizeExtension};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let config = FinderConfig::default().with_strategy(Arc::new(SizeExtension));
//! let finder = DuplicateFinder::new(config);
//!
//! let report = finder.find_duplicates(Path::new("/some/path")).unwrap();
//! println!("Found {} duplicate groups", report.summary.duplicate_groups);
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;

use super::fingerprint::{ContentHash, Fingerprint};
use super::groups::{group_by_fingerprint, DuplicateGroup};
use crate::error::Diagnostic;
use crate::progress::ProgressCallback;
use crate::scanner::{FileRecord, Walker, WalkerConfig};
use crate::signal::CancelToken;

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Fingerprint strategy used for grouping.
    pub strategy: Arc<dyn Fingerprint>,
    /// Optional cancellation token.
    pub cancel: Option<CancelToken>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("walker_config", &self.walker_config)
            .field("strategy", &self.strategy.name())
            .field("cancel", &self.cancel)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            walker_config: WalkerConfig::default(),
            strategy: Arc::new(ContentHash::new()),
            cancel: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the fingerprint strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Arc<dyn Fingerprint>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the cancellation token.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Name of the fingerprint strategy used
    pub strategy: String,
    /// Total number of files walked
    pub total_files: usize,
    /// Total size of all walked files in bytes
    pub total_size: u64,
    /// Files excluded from grouping because no key could be computed
    pub unfingerprinted: usize,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Number of non-canonical files across all groups
    pub duplicate_files: usize,
    /// Bytes held by non-canonical files
    pub reclaimable_space: u64,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Per-file problems recovered during the scan
    pub diagnostics: Vec<Diagnostic>,
}

impl ScanSummary {
    /// Percentage of scanned bytes held by duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Reclaimable space as a human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize(self.reclaimable_space).to_string()
    }

    /// Total size as a human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize(self.total_size).to_string()
    }

    /// Whether any per-file problem was recorded.
    #[must_use]
    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Result of a scan: every walked record, the duplicate groups and the summary.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Root that was scanned (absolute)
    pub root: PathBuf,
    /// All walked records in walk order (manifest input)
    pub files: Vec<FileRecord>,
    /// Duplicate groups in first-seen order
    pub groups: Vec<DuplicateGroup>,
    /// Scan statistics
    pub summary: ScanSummary,
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The configuration cannot produce a valid scan.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The scan was cancelled (Ctrl+C or an explicit cancel).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while validating the root.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Duplicate finder running walk, fingerprint and grouping for one root.
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a finder with the default content-hash strategy.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find all duplicate files under `path`.
    ///
    /// An empty tree, or a tree without duplicates, is a successful scan with
    /// zero groups.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - The path does not exist or is not a directory
    /// - The scan is cancelled through the configured token
    pub fn find_duplicates(&self, path: &Path) -> Result<ScanReport, FinderError> {
        let start_time = Instant::now();

        let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FinderError::PathNotFound(path.to_path_buf()),
            _ => FinderError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        if !metadata.is_dir() {
            return Err(FinderError::NotADirectory(path.to_path_buf()));
        }

        let strategy = self.config.strategy.as_ref();
        log::info!(
            "Starting duplicate scan of {} ({})",
            path.display(),
            strategy.name()
        );

        if self.config.is_cancelled() {
            return Err(FinderError::Interrupted);
        }

        // Walk
        let callback = self.config.progress_callback.as_deref();
        if let Some(cb) = callback {
            cb.on_phase_start("walking", 0);
        }

        let walker = Walker::new(path, self.config.walker_config.clone());
        let mut files = Vec::new();
        let mut diagnostics = Vec::new();

        for result in walker.walk() {
            if self.config.is_cancelled() {
                if let Some(cb) = callback {
                    cb.on_phase_end("walking");
                }
                return Err(FinderError::Interrupted);
            }
            match result {
                Ok(record) => {
                    if let Some(cb) = callback {
                        cb.on_progress(files.len() + 1, &record.path.to_string_lossy());
                    }
                    files.push(record);
                }
                Err(e) => diagnostics.push(e.to_diagnostic()),
            }
        }

        if let Some(cb) = callback {
            cb.on_phase_end("walking");
        }

        let total_size: u64 = files.iter().map(|f| f.size).sum();
        log::info!(
            "Found {} files ({})",
            files.len(),
            ByteSize(total_size)
        );

        // Fingerprint + group
        if let Some(cb) = callback {
            cb.on_phase_start("fingerprinting", files.len());
        }

        let cancel = self.config.cancel.clone();
        let records = files.iter().cloned().enumerate().map_while(|(i, record)| {
            if cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                return None;
            }
            if let Some(cb) = callback {
                cb.on_progress(i + 1, &record.path.to_string_lossy());
            }
            Some(record)
        });
        let grouping = group_by_fingerprint(records, strategy);

        if let Some(cb) = callback {
            cb.on_phase_end("fingerprinting");
        }

        if self.config.is_cancelled() {
            return Err(FinderError::Interrupted);
        }

        diagnostics.extend(grouping.diagnostics);

        let summary = ScanSummary {
            strategy: strategy.name().to_string(),
            total_files: files.len(),
            total_size,
            unfingerprinted: grouping.stats.unfingerprinted,
            duplicate_groups: grouping.groups.len(),
            duplicate_files: grouping.groups.iter().map(DuplicateGroup::duplicate_count).sum(),
            reclaimable_space: grouping.groups.iter().map(DuplicateGroup::wasted_space).sum(),
            scan_duration: start_time.elapsed(),
            diagnostics,
        };

        log::info!(
            "Scan complete: {} duplicate groups, {} duplicate files, {} reclaimable",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display()
        );

        Ok(ScanReport {
            root: walker.root().to_path_buf(),
            files,
            groups: grouping.groups,
            summary,
        })
    }
}
