//! File actions module.
//!
//! This module provides functionality for:
//! - Quarantining duplicates (dry run, copy or move) into a mirrored tree
//! - Recording every relocation in a durable move log
//! - Undoing a quarantine from its log, or by mirror-restoring the tree
//!
//! # Quarantine
//!
//! ```no_run
//! use dupedoctor::actions::{MoveMode, QuarantineConfig, QuarantineMover};
//! use dupedoctor::duplicates::DuplicateFinder;
//! use std::path::Path;
//!
//! let root = Path::new("/data");
//! let report = DuplicateFinder::with_defaults().find_duplicates(root).unwrap();
//! let summary = QuarantineMover::new(root, QuarantineConfig::new(MoveMode::Copy))
//!     .run(&report.groups, None);
//! println!("{}", summary.summary());
//! ```
//!
//! # Undo
//!
//! ```no_run
//! use dupedoctor::actions::{restore_quarantine, RestoreOptions};
//! use std::path::Path;
//!
//! let summary = restore_quarantine(Path::new("/data/_quarantine_data"), RestoreOptions::default())
//!     .unwrap();
//! println!("{}", summary.summary());
//! ```

pub mod movelog;
pub mod quarantine;
pub mod restore;
mod transfer;

// Re-export commonly used types
pub use movelog::{MoveLog, MoveLogEntry, MoveLogError, LOG_FILE_NAME};
pub use quarantine::{
    MoveError, MoveHandle, MoveMode, MovePlan, MoveProgressCallback, MoveSummary, PlannedMove,
    QuarantineConfig, QuarantineLayout, QuarantineMover, QUARANTINE_PREFIX,
};
pub use restore::{
    mirror_restore, restore_from_log, restore_quarantine, RestoreError, RestoreOptions,
    RestoreSummary, SkipReason,
};
