//! Canonical file selection.
//!
//! Given the members of a duplicate group, picks the single file to keep.
//! The policy is total and stable:
//!
//! 1. shortest file name (by character count)
//! 2. earliest creation time
//! 3. first encountered during the walk

use crate::scanner::FileRecord;

/// Index of the file to keep, or `None` for an empty slice.
///
/// ```
/// use dupedoctor::duplicates::select_canonical;
/// use dupedoctor::scanner::FileRecord;
/// use std::path::PathBuf;
/// use std::time::SystemTime;
///
/// let now = SystemTime::now();
/// let files = vec![
///     FileRecord::new(PathBuf::from("/p/a - Copy.txt"), 1, now, now),
///     FileRecord::new(PathBuf::from("/p/a.txt"), 1, now, now),
/// ];
/// assert_eq!(select_canonical(&files), Some(1));
/// ```
#[must_use]
pub fn select_canonical(files: &[FileRecord]) -> Option<usize> {
    files
        .iter()
        .enumerate()
        .min_by_key(|(index, file)| (file.name_len(), file.created, *index))
        .map(|(index, _)| index)
}
