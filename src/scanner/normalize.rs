//! Copy-marker stripping for name-based matching.
//!
//! Operating systems and sync clients name accidental copies
//! `"photo - Copy.jpg"`, `"photo - Copy (2).jpg"` or `"photo (1).jpg"`.
//! [`normalize_name`] maps those stems back to the presumed original
//! (`"photo"`) so the composite strategy can group them.
//!
//! This is a heuristic. Two unrelated files whose names legitimately end in
//! a parenthesised number (`"Track (1)"` and `"Track"`) are unified too, and
//! that is a known source of false positives for name-based grouping.

use std::sync::LazyLock;

use regex::Regex;

static COPY_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" - Copy( \(\d+\))?$").expect("static pattern"));

static NUMBER_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" \(\d+\)$").expect("static pattern"));

/// Strip trailing copy markers from a file stem, then trim whitespace.
///
/// Markers are stripped repeatedly until none remain, so the function is
/// idempotent. A stem that would normalize to nothing keeps its last
/// non-empty (trimmed) form.
///
/// ```
/// use dupedoctor::scanner::normalize_name;
///
/// assert_eq!(normalize_name("photo - Copy (2)"), "photo");
/// assert_eq!(normalize_name("report (1)"), "report");
/// assert_eq!(normalize_name("report"), "report");
/// ```
#[must_use]
pub fn normalize_name(stem: &str) -> String {
    let mut current = stem.to_string();
    loop {
        let stripped = COPY_SUFFIX.replace(&current, "");
        let stripped = NUMBER_SUFFIX.replace(&stripped, "");
        let next = stripped.trim().to_string();
        if next == current {
            break;
        }
        if next.is_empty() {
            let trimmed = current.trim();
            if trimmed == current {
                break;
            }
            current = trimmed.to_string();
            continue;
        }
        current = next;
    }
    current
}
