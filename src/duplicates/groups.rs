//! Duplicate grouping by fingerprint.
//!
//! # Overview
//!
//! [`group_by_fingerprint`] makes a single pass over the walked records,
//! building a map from [`FingerprintKey`] to the records that produced it.
//! Insertion order is preserved per key (walk order), and groups are emitted
//! in the order their key was first seen. Keys with a single member are
//! dropped and never surfaced.
//!
//! # Example
//!
//! ```
//! use dupedoctor::duplicates::{group_by_fingerprint, SizeExtension};
//! use dupedoctor::scanner::FileRecord;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let now = SystemTime::now();
//! let files = vec![
//!     FileRecord::new(PathBuf::from("/file1.txt"), 1024, now, now),
//!     FileRecord::new(PathBuf::from("/file2.txt"), 1024, now, now),
//!     FileRecord::new(PathBuf::from("/file3.txt"), 2048, now, now),
//! ];
//!
//! let grouping = group_by_fingerprint(files, &SizeExtension);
//!
//! assert_eq!(grouping.stats.total_files, 3);
//! assert_eq!(grouping.groups.len(), 1);
//! assert_eq!(grouping.groups[0].len(), 2);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::canonical::select_canonical;
use super::fingerprint::{Fingerprint, FingerprintKey};
use crate::error::Diagnostic;
use crate::scanner::{FileRecord, ScanError};

/// Files sharing one fingerprint key. Always has at least two members.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    key: FingerprintKey,
    files: Vec<FileRecord>,
    canonical: usize,
}

impl DuplicateGroup {
    /// Create a group; returns `None` for fewer than two files.
    #[must_use]
    pub fn new(key: FingerprintKey, files: Vec<FileRecord>) -> Option<Self> {
        if files.len() < 2 {
            return None;
        }
        let canonical = select_canonical(&files)?;
        Some(Self {
            key,
            files,
            canonical,
        })
    }

    /// Shared fingerprint key.
    #[must_use]
    pub fn key(&self) -> &FingerprintKey {
        &self.key
    }

    /// Members in walk order.
    #[must_use]
    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Always false; kept for the `len` convention.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The file to keep.
    #[must_use]
    pub fn canonical(&self) -> &FileRecord {
        &self.files[self.canonical]
    }

    /// Every non-canonical member, in walk order.
    pub fn candidates(&self) -> impl Iterator<Item = &FileRecord> + '_ {
        self.files
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != self.canonical)
            .map(|(_, f)| f)
    }

    /// Whether `path` is the canonical member.
    #[must_use]
    pub fn is_canonical(&self, path: &Path) -> bool {
        self.canonical().path == path
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Bytes held by the non-canonical members.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.candidates().map(|f| f.size).sum()
    }

    /// Number of duplicate copies (total - 1 kept).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len() - 1
    }

    /// Get just the paths of files in this group.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

/// Statistics from the grouping pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of records offered
    pub total_files: usize,
    /// Records the strategy could not fingerprint
    pub unfingerprinted: usize,
    /// Number of distinct keys
    pub unique_keys: usize,
    /// Groups with two or more members
    pub duplicate_groups: usize,
    /// Records inside duplicate groups
    pub grouped_files: usize,
}

/// Output of [`group_by_fingerprint`].
#[derive(Debug, Default)]
pub struct Grouping {
    /// Duplicate groups in first-seen key order
    pub groups: Vec<DuplicateGroup>,
    /// Pass statistics
    pub stats: GroupingStats,
    /// Files excluded because no key could be computed
    pub diagnostics: Vec<Diagnostic>,
}

/// Group records by their fingerprint in a single pass.
pub fn group_by_fingerprint<I>(records: I, strategy: &dyn Fingerprint) -> Grouping
where
    I: IntoIterator<Item = FileRecord>,
{
    let mut index: HashMap<FingerprintKey, usize> = HashMap::new();
    let mut buckets: Vec<(FingerprintKey, Vec<FileRecord>)> = Vec::new();
    let mut stats = GroupingStats::default();
    let mut diagnostics = Vec::new();

    for record in records {
        stats.total_files += 1;
        let key = match strategy.try_key(&record) {
            Ok(key) => key,
            Err(e) => {
                log::warn!("Excluded from grouping: {}", e);
                stats.unfingerprinted += 1;
                diagnostics.push(ScanError::from(e).to_diagnostic());
                continue;
            }
        };

        match index.get(&key) {
            Some(&slot) => buckets[slot].1.push(record),
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push((key, vec![record]));
            }
        }
    }

    stats.unique_keys = buckets.len();

    let groups: Vec<DuplicateGroup> = buckets
        .into_iter()
        .filter_map(|(key, files)| DuplicateGroup::new(key, files))
        .collect();

    stats.duplicate_groups = groups.len();
    stats.grouped_files = groups.iter().map(DuplicateGroup::len).sum();

    log::debug!(
        "Grouping ({}): {} files, {} keys, {} duplicate groups",
        strategy.name(),
        stats.total_files,
        stats.unique_keys,
        stats.duplicate_groups
    );

    Grouping {
        groups,
        stats,
        diagnostics,
    }
}
