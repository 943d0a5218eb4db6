//! Quarantine mover.
//!
//! # Overview
//!
//! Relocates every non-canonical member of each [`DuplicateGroup`] to
//! `quarantine_root / relative_path(source_root, candidate)`, mirroring the
//! original tree. The default quarantine root is
//! `<source_root>/_quarantine_<root folder name>`, which the walker must
//! exclude from later scans.
//!
//! # Guarantees
//!
//! - Files are processed sequentially in group-then-member order
//! - A failure on one file becomes a [`Diagnostic`] and the batch continues
//! - Cancellation is polled between files; a file in flight always
//!   completes or fails cleanly first
//! - Existing files in the quarantine are never overwritten
//! - Successful entries are appended to the move log after the run; nothing
//!   is written when no file moved
//! - Dry runs compute the plan and touch nothing
//!
//! # Example
//!
//! ```no_run
//! use dupedoctor::actions::quarantine::{MoveMode, QuarantineConfig, QuarantineMover};
//! use dupedoctor::duplicates::DuplicateFinder;
//! use std::path::Path;
//!
//! let root = Path::new("/home/user/Pictures");
//! let report = DuplicateFinder::with_defaults().find_duplicates(root).unwrap();
//!
//! let mover = QuarantineMover::new(root, QuarantineConfig::new(MoveMode::Move));
//! let summary = mover.run(&report.groups, None);
//! println!("{}", summary.summary());
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

use bytesize::ByteSize;
use chrono::Local;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::movelog::{MoveLog, MoveLogEntry};
use super::transfer;
use crate::duplicates::DuplicateGroup;
use crate::error::{Diagnostic, DiagnosticKind};
use crate::scanner::FileRecord;
use crate::signal::CancelToken;

/// Prefix of the default quarantine directory name.
pub const QUARANTINE_PREFIX: &str = "_quarantine_";

/// Error type for quarantine operations.
#[derive(Debug, Error)]
pub enum MoveError {
    /// Creating a destination directory failed.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        /// Directory that could not be created
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Moving a file failed.
    #[error("failed to move {path} to {destination}: {source}")]
    Move {
        /// Source file
        path: PathBuf,
        /// Intended destination
        destination: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Copying a file failed.
    #[error("failed to copy {path} to {destination}: {source}")]
    Copy {
        /// Source file
        path: PathBuf,
        /// Intended destination
        destination: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A file already occupies the destination.
    #[error("destination already exists: {0}")]
    DestinationExists(PathBuf),

    /// The candidate does not live under the scanned root.
    #[error("{path} is outside the source root {root}")]
    OutsideRoot {
        /// Candidate path
        path: PathBuf,
        /// Source root
        root: PathBuf,
    },

    /// Persisting the move log failed.
    #[error("failed to write move log: {0}")]
    LogWrite(#[from] super::movelog::MoveLogError),

    /// The background worker could not be started.
    #[error("failed to start quarantine worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// The background worker panicked.
    #[error("quarantine worker panicked")]
    WorkerPanicked,
}

impl MoveError {
    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::CreateDir { path, .. }
            | Self::Move { path, .. }
            | Self::Copy { path, .. }
            | Self::OutsideRoot { path, .. } => Some(path),
            Self::DestinationExists(p) => Some(p),
            Self::LogWrite(_) | Self::WorkerSpawn(_) | Self::WorkerPanicked => None,
        }
    }
}

/// How candidates are relocated. One mode per run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MoveMode {
    /// Compute and report the plan without touching the filesystem
    #[default]
    DryRun,
    /// Copy into quarantine, leaving the source in place
    Copy,
    /// Move into quarantine, removing the source
    Move,
}

impl fmt::Display for MoveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DryRun => write!(f, "dry-run"),
            Self::Copy => write!(f, "copy"),
            Self::Move => write!(f, "move"),
        }
    }
}

/// Source root and quarantine root of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuarantineLayout {
    source_root: PathBuf,
    quarantine_root: PathBuf,
}

impl QuarantineLayout {
    /// Default layout: `<root>/_quarantine_<root folder name>`.
    ///
    /// ```
    /// use dupedoctor::actions::quarantine::QuarantineLayout;
    /// use std::path::Path;
    ///
    /// let layout = QuarantineLayout::for_root(Path::new("/data/photos"));
    /// assert_eq!(layout.quarantine_root(), Path::new("/data/photos/_quarantine_photos"));
    /// ```
    #[must_use]
    pub fn for_root(root: &Path) -> Self {
        let source_root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        let folder = source_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "root".to_string());
        let quarantine_root = source_root.join(format!("{QUARANTINE_PREFIX}{folder}"));
        Self {
            source_root,
            quarantine_root,
        }
    }

    /// Override the quarantine root.
    #[must_use]
    pub fn with_quarantine_root(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.quarantine_root = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
        self
    }

    /// Scanned root.
    #[must_use]
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Quarantine root.
    #[must_use]
    pub fn quarantine_root(&self) -> &Path {
        &self.quarantine_root
    }

    /// Move log location for this layout.
    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        MoveLog::in_quarantine(&self.quarantine_root).path().to_path_buf()
    }

    /// Quarantine destination mirroring `path`'s position under the source root.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::OutsideRoot`] if `path` is not under the source root.
    pub fn destination_for(&self, path: &Path) -> Result<PathBuf, MoveError> {
        let relative = path
            .strip_prefix(&self.source_root)
            .ok()
            .filter(|rel| !rel.as_os_str().is_empty())
            .ok_or_else(|| MoveError::OutsideRoot {
                path: path.to_path_buf(),
                root: self.source_root.clone(),
            })?;
        Ok(self.quarantine_root.join(relative))
    }
}

/// Quarantine settings passed at call time.
#[derive(Debug, Clone, Default)]
pub struct QuarantineConfig {
    /// Relocation mode.
    pub mode: MoveMode,
    /// Override for the default quarantine root.
    pub quarantine_dir: Option<PathBuf>,
    /// Optional cancellation token.
    pub cancel: Option<CancelToken>,
}

impl QuarantineConfig {
    /// Config with the given mode and the default quarantine root.
    #[must_use]
    pub fn new(mode: MoveMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Use `dir` as the quarantine root.
    #[must_use]
    pub fn with_quarantine_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.quarantine_dir = Some(dir.into());
        self
    }

    /// Set the cancellation token.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Resolve the layout for a scanned root.
    #[must_use]
    pub fn layout_for(&self, root: &Path) -> QuarantineLayout {
        let layout = QuarantineLayout::for_root(root);
        match &self.quarantine_dir {
            Some(dir) => layout.with_quarantine_root(dir),
            None => layout,
        }
    }
}

/// A candidate with its computed destination.
#[derive(Debug, Clone)]
pub struct PlannedMove {
    /// File to relocate
    pub record: FileRecord,
    /// Destination inside the quarantine root
    pub destination: PathBuf,
}

/// Ordered list of relocations for a set of groups.
#[derive(Debug, Clone, Default)]
pub struct MovePlan {
    /// Relocations in group-then-member order
    pub moves: Vec<PlannedMove>,
    /// Candidates that could not be planned
    pub rejected: Vec<Diagnostic>,
}

impl MovePlan {
    /// Total bytes of the planned moves.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.moves.iter().map(|m| m.record.size).sum()
    }
}

/// Outcome of a quarantine run.
#[derive(Debug, Clone, Default)]
pub struct MoveSummary {
    /// Mode the run used
    pub mode: MoveMode,
    /// Completed (or, for dry runs, planned) relocations
    pub entries: Vec<MoveLogEntry>,
    /// Files that failed
    pub failed: usize,
    /// Files not attempted because the run was cancelled
    pub skipped: usize,
    /// Whether cancellation stopped the run early
    pub cancelled: bool,
    /// Bytes relocated (or planned)
    pub bytes: u64,
    /// Per-file problems
    pub diagnostics: Vec<Diagnostic>,
    /// Move log written by this run, if any
    pub log_path: Option<PathBuf>,
}

impl MoveSummary {
    /// Number of successful (or planned) relocations.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.entries.len()
    }

    /// Whether every attempted file succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0 && self.diagnostics.is_empty()
    }

    /// Human-readable summary of the run.
    #[must_use]
    pub fn summary(&self) -> String {
        let verb = match self.mode {
            MoveMode::DryRun => "Would move",
            MoveMode::Copy => "Copied",
            MoveMode::Move => "Moved",
        };
        let mut text = format!(
            "{} {} file(s) ({})",
            verb,
            self.success_count(),
            ByteSize(self.bytes)
        );
        if self.failed > 0 {
            text.push_str(&format!(", {} failed", self.failed));
        }
        if self.cancelled {
            text.push_str(&format!(", cancelled with {} skipped", self.skipped));
        }
        text
    }
}

/// Callback trait for quarantine progress reporting.
pub trait MoveProgressCallback: Send + Sync {
    /// Called before each file is relocated.
    fn on_before_move(&self, path: &Path, index: usize, total: usize);

    /// Called after a successful relocation.
    fn on_move_success(&self, path: &Path, size: u64);

    /// Called after a failed relocation.
    fn on_move_failure(&self, path: &Path, error: &str);

    /// Called when the run completes (also after cancellation).
    fn on_complete(&self, summary: &MoveSummary);
}

/// Relocates non-canonical duplicates into the quarantine.
#[derive(Debug, Clone)]
pub struct QuarantineMover {
    layout: QuarantineLayout,
    mode: MoveMode,
    cancel: Option<CancelToken>,
}

impl QuarantineMover {
    /// Create a mover for groups found under `root`.
    #[must_use]
    pub fn new(root: &Path, config: QuarantineConfig) -> Self {
        Self {
            layout: config.layout_for(root),
            mode: config.mode,
            cancel: config.cancel,
        }
    }

    /// Layout in use.
    #[must_use]
    pub fn layout(&self) -> &QuarantineLayout {
        &self.layout
    }

    /// Mode in use.
    #[must_use]
    pub fn mode(&self) -> MoveMode {
        self.mode
    }

    /// Compute destinations for every candidate, in group-then-member order.
    #[must_use]
    pub fn plan(&self, groups: &[DuplicateGroup]) -> MovePlan {
        let mut plan = MovePlan::default();
        for group in groups {
            for record in group.candidates() {
                match self.layout.destination_for(&record.path) {
                    Ok(destination) => plan.moves.push(PlannedMove {
                        record: record.clone(),
                        destination,
                    }),
                    Err(e) => {
                        log::warn!("Not planning {}: {}", record.path.display(), e);
                        plan.rejected.push(Diagnostic::new(
                            &record.path,
                            DiagnosticKind::WriteFailure,
                            e.to_string(),
                        ));
                    }
                }
            }
        }
        plan
    }

    /// Run the quarantine over `groups` on the calling thread.
    pub fn run(
        &self,
        groups: &[DuplicateGroup],
        callback: Option<&dyn MoveProgressCallback>,
    ) -> MoveSummary {
        let plan = self.plan(groups);
        let mut summary = MoveSummary {
            mode: self.mode,
            failed: plan.rejected.len(),
            diagnostics: plan.rejected.clone(),
            ..MoveSummary::default()
        };
        let total = plan.moves.len();

        if self.mode == MoveMode::DryRun {
            let now = Local::now();
            summary.bytes = plan.total_bytes();
            for planned in &plan.moves {
                log::info!(
                    "Would move: {} -> {}",
                    planned.record.path.display(),
                    planned.destination.display()
                );
                summary.entries.push(MoveLogEntry::from_record(
                    &planned.record,
                    planned.destination.clone(),
                    now,
                ));
            }
            if let Some(cb) = callback {
                cb.on_complete(&summary);
            }
            return summary;
        }

        log::info!(
            "Quarantining {} file(s), {}, into {} ({})",
            total,
            ByteSize(plan.total_bytes()),
            self.layout.quarantine_root().display(),
            self.mode
        );

        for (index, planned) in plan.moves.iter().enumerate() {
            if self.is_cancelled() {
                summary.cancelled = true;
                summary.skipped = total - index;
                log::info!("Quarantine cancelled, {} file(s) left untouched", summary.skipped);
                break;
            }

            let path = &planned.record.path;
            if let Some(cb) = callback {
                cb.on_before_move(path, index, total);
            }

            match self.relocate(planned) {
                Ok(()) => {
                    log::info!(
                        "{}: {} -> {}",
                        self.mode,
                        path.display(),
                        planned.destination.display()
                    );
                    summary.bytes += planned.record.size;
                    summary.entries.push(MoveLogEntry::from_record(
                        &planned.record,
                        planned.destination.clone(),
                        Local::now(),
                    ));
                    if let Some(cb) = callback {
                        cb.on_move_success(path, planned.record.size);
                    }
                }
                Err(e) => {
                    let message = e.to_string();
                    log::warn!("{}", message);
                    summary.failed += 1;
                    summary.diagnostics.push(Diagnostic::new(
                        path,
                        DiagnosticKind::WriteFailure,
                        message.clone(),
                    ));
                    if let Some(cb) = callback {
                        cb.on_move_failure(path, &message);
                    }
                }
            }
        }

        match self.persist_log(&summary.entries) {
            Ok(log_path) => summary.log_path = log_path,
            Err(e) => {
                log::error!("{}", e);
                summary.diagnostics.push(Diagnostic::new(
                    &self.layout.log_path(),
                    DiagnosticKind::WriteFailure,
                    e.to_string(),
                ));
            }
        }

        if let Some(cb) = callback {
            cb.on_complete(&summary);
        }
        log::info!("{}", summary.summary());
        summary
    }

    /// Run the quarantine on a dedicated background thread.
    ///
    /// The returned handle can cancel the run and wait for its summary.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::WorkerSpawn`] if the thread cannot be started.
    pub fn spawn(
        mut self,
        groups: Vec<DuplicateGroup>,
        callback: Option<Arc<dyn MoveProgressCallback>>,
    ) -> Result<MoveHandle, MoveError> {
        let cancel = self.cancel.get_or_insert_with(CancelToken::new).clone();
        let join = std::thread::Builder::new()
            .name("quarantine-mover".to_string())
            .spawn(move || self.run(&groups, callback.as_deref()))
            .map_err(MoveError::WorkerSpawn)?;
        Ok(MoveHandle { cancel, join })
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    fn relocate(&self, planned: &PlannedMove) -> Result<(), MoveError> {
        let source = &planned.record.path;
        let destination = &planned.destination;

        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent).map_err(|e| MoveError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        if destination.symlink_metadata().is_ok() {
            return Err(MoveError::DestinationExists(destination.clone()));
        }

        match self.mode {
            MoveMode::Move => {
                transfer::move_file(source, destination).map_err(|e| MoveError::Move {
                    path: source.clone(),
                    destination: destination.clone(),
                    source: e,
                })
            }
            MoveMode::Copy => transfer::copy_preserving_mtime(source, destination)
                .map(|_| ())
                .map_err(|e| MoveError::Copy {
                    path: source.clone(),
                    destination: destination.clone(),
                    source: e,
                }),
            MoveMode::DryRun => Ok(()),
        }
    }

    fn persist_log(&self, entries: &[MoveLogEntry]) -> Result<Option<PathBuf>, MoveError> {
        if entries.is_empty() {
            return Ok(None);
        }
        std::fs::create_dir_all(self.layout.quarantine_root()).map_err(|e| {
            MoveError::CreateDir {
                path: self.layout.quarantine_root().to_path_buf(),
                source: e,
            }
        })?;
        let log = MoveLog::in_quarantine(self.layout.quarantine_root());
        log.append(entries)?;
        Ok(Some(log.path().to_path_buf()))
    }
}

/// Handle to a quarantine run on a background thread.
#[derive(Debug)]
pub struct MoveHandle {
    cancel: CancelToken,
    join: JoinHandle<MoveSummary>,
}

impl MoveHandle {
    /// Request cancellation; the worker stops before its next file.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the worker has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the worker and return its summary.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::WorkerPanicked`] if the worker panicked.
    pub fn join(self) -> Result<MoveSummary, MoveError> {
        self.join.join().map_err(|_| MoveError::WorkerPanicked)
    }
}
