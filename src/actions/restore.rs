//! Undo: restore quarantined files to their original locations.
//!
//! Two modes are supported:
//!
//! - [`restore_from_log`] replays the move log entry by entry, moving each
//!   quarantined file back to its recorded source path.
//! - [`mirror_restore`] copies the whole quarantine tree onto a target root,
//!   the structural equivalent of a newer-excluded mirror copy.
//!
//! Both share one policy: a file at the destination that is newer than the
//! quarantined copy is never overwritten; it is reported as skipped. Per-file
//! failures are collected and never abort the batch.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;
use walkdir::WalkDir;

use super::movelog::{MoveLog, MoveLogError, LOG_FILE_NAME};
use super::transfer;
use crate::error::{Diagnostic, DiagnosticKind};

/// Error type for restore operations that cannot start.
#[derive(Debug, Error)]
pub enum RestoreError {
    /// No move log exists at the expected location.
    #[error("no move log found at {0}")]
    LogNotFound(PathBuf),

    /// The quarantine path is not a directory.
    #[error("not a quarantine directory: {0}")]
    NotADirectory(PathBuf),

    /// The move log could not be read.
    #[error(transparent)]
    Log(#[from] MoveLogError),
}

/// Why a file was not restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The quarantined copy no longer exists.
    MissingInQuarantine,
    /// The destination holds a newer file.
    DestinationNewer,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingInQuarantine => write!(f, "missing from quarantine"),
            Self::DestinationNewer => write!(f, "destination is newer"),
        }
    }
}

/// Options for log replay.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestoreOptions {
    /// Keep the log even after a fully successful replay.
    pub keep_log: bool,
}

/// Outcome of a restore run.
#[derive(Debug, Clone, Default)]
pub struct RestoreSummary {
    /// Files written back to their original location
    pub restored: Vec<PathBuf>,
    /// Files left alone, with the reason
    pub skipped: Vec<(PathBuf, SkipReason)>,
    /// Files that failed
    pub failed: Vec<Diagnostic>,
    /// Whether the move log was deleted after the replay
    pub log_consumed: bool,
}

impl RestoreSummary {
    /// Number of restored files.
    #[must_use]
    pub fn restored_count(&self) -> usize {
        self.restored.len()
    }

    /// Number of skipped files.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Number of failed files.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// True when nothing was skipped and nothing failed.
    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }

    /// Human-readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Restored {} file(s), skipped {}, failed {}",
            self.restored_count(),
            self.skipped_count(),
            self.failed_count()
        )
    }
}

/// Replay the log at `log_path`, moving each quarantined file back.
///
/// On complete success the log is deleted unless `options.keep_log` is set.
/// Otherwise it is rewritten to hold only the entries that were not restored,
/// so a retry picks up exactly the remaining files.
///
/// # Errors
///
/// Returns [`RestoreError`] if the log is missing, unreadable or empty.
/// Per-file problems are reported in the summary instead.
pub fn restore_from_log(
    log_path: &Path,
    options: RestoreOptions,
) -> Result<RestoreSummary, RestoreError> {
    let log = MoveLog::new(log_path);
    if !log.exists() {
        return Err(RestoreError::LogNotFound(log_path.to_path_buf()));
    }
    let entries = log.read()?;
    log::info!("Replaying {} entries from {}", entries.len(), log_path.display());

    let mut summary = RestoreSummary::default();
    let mut remaining = Vec::new();
    for entry in entries {
        if !restore_one(&entry.destination, &entry.source, Transfer::Move, &mut summary) {
            remaining.push(entry);
        }
    }

    if summary.is_complete_success() {
        if !options.keep_log {
            match log.remove() {
                Ok(()) => summary.log_consumed = true,
                Err(e) => log::warn!("Could not remove consumed log: {}", e),
            }
        }
    } else if summary.restored_count() > 0 {
        // Keep only the entries that were not restored.
        match log.rewrite(&remaining) {
            Ok(n) => log::info!("{} entries left in {}", n, log_path.display()),
            Err(e) => log::warn!("Could not trim move log: {}", e),
        }
    }

    log::info!("{}", summary.summary());
    Ok(summary)
}

/// Replay the move log stored inside `quarantine_root`.
///
/// # Errors
///
/// See [`restore_from_log`].
pub fn restore_quarantine(
    quarantine_root: &Path,
    options: RestoreOptions,
) -> Result<RestoreSummary, RestoreError> {
    if !quarantine_root.is_dir() {
        return Err(RestoreError::NotADirectory(quarantine_root.to_path_buf()));
    }
    restore_from_log(&quarantine_root.join(LOG_FILE_NAME), options)
}

/// Copy every file under `quarantine_root` to the same relative path under
/// `target_root`, skipping destinations newer than the quarantined copy.
///
/// The move log itself is never copied and is left in place.
///
/// # Errors
///
/// Returns [`RestoreError::NotADirectory`] if `quarantine_root` is not a directory.
pub fn mirror_restore(
    quarantine_root: &Path,
    target_root: &Path,
) -> Result<RestoreSummary, RestoreError> {
    if !quarantine_root.is_dir() {
        return Err(RestoreError::NotADirectory(quarantine_root.to_path_buf()));
    }
    log::info!(
        "Mirror restore {} -> {}",
        quarantine_root.display(),
        target_root.display()
    );

    let log_file = quarantine_root.join(LOG_FILE_NAME);
    let mut summary = RestoreSummary::default();

    let walker = WalkDir::new(quarantine_root)
        .follow_links(false)
        .sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let path = e
                    .path()
                    .map_or_else(|| quarantine_root.to_path_buf(), Path::to_path_buf);
                let kind = match e.io_error().map(std::io::Error::kind) {
                    Some(std::io::ErrorKind::PermissionDenied) => DiagnosticKind::AccessDenied,
                    _ => DiagnosticKind::NotReadable,
                };
                log::warn!("Cannot read {}: {}", path.display(), e);
                summary.failed.push(Diagnostic::new(&path, kind, e.to_string()));
                continue;
            }
        };

        if !entry.file_type().is_file() || entry.path() == log_file {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(quarantine_root) else {
            continue;
        };
        let target = target_root.join(relative);
        restore_one(entry.path(), &target, Transfer::Copy, &mut summary);
    }

    log::info!("{}", summary.summary());
    Ok(summary)
}

#[derive(Debug, Clone, Copy)]
enum Transfer {
    Move,
    Copy,
}

/// Restore one file, recording the outcome. Returns whether it was restored.
fn restore_one(
    quarantined: &Path,
    target: &Path,
    mode: Transfer,
    summary: &mut RestoreSummary,
) -> bool {
    let quarantined_mtime = match modified(quarantined) {
        Some(t) => t,
        None => {
            log::warn!("Not in quarantine anymore: {}", quarantined.display());
            summary
                .skipped
                .push((target.to_path_buf(), SkipReason::MissingInQuarantine));
            return false;
        }
    };

    if let Some(target_mtime) = modified(target) {
        if target_mtime > quarantined_mtime {
            log::info!("Skipping newer destination: {}", target.display());
            summary
                .skipped
                .push((target.to_path_buf(), SkipReason::DestinationNewer));
            return false;
        }
    }

    let result = transfer::ensure_parent(target).and_then(|()| match mode {
        Transfer::Move => transfer::move_file(quarantined, target),
        Transfer::Copy => transfer::copy_preserving_mtime(quarantined, target).map(|_| ()),
    });

    match result {
        Ok(()) => {
            log::info!("Restored {}", target.display());
            summary.restored.push(target.to_path_buf());
            true
        }
        Err(e) => {
            log::warn!("Failed to restore {}: {}", target.display(), e);
            let kind = if e.kind() == std::io::ErrorKind::PermissionDenied {
                DiagnosticKind::AccessDenied
            } else {
                DiagnosticKind::WriteFailure
            };
            summary.failed.push(Diagnostic::new(
                target,
                kind,
                format!("restore from {} failed: {}", quarantined.display(), e),
            ));
            false
        }
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::symlink_metadata(path).ok()?.modified().ok()
}
