//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Fingerprint strategies (content hash, size + extension, composite metadata)
//! - Single-pass grouping by fingerprint key
//! - Canonical (keep) selection within each group
//! - The [`DuplicateFinder`] pipeline tying walk and grouping together

pub mod canonical;
pub mod finder;
pub mod fingerprint;
pub mod groups;

pub use canonical::select_canonical;
pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanReport, ScanSummary};
pub use fingerprint::{
    Composite, ContentHash, CriteriaSet, Criterion, Fingerprint, FingerprintKey, MetadataKey,
    SizeExtension, StrategyKind,
};
pub use groups::{group_by_fingerprint, DuplicateGroup, Grouping, GroupingStats};
