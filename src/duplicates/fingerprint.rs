//! Fingerprint strategies.
//!
//! A fingerprint is the comparison key for a file. Two [`FileRecord`]s are
//! duplicates under a strategy iff their [`FingerprintKey`]s are equal; keys
//! use exact equality, there is no tolerance or fuzzy matching.
//!
//! Strategies:
//! - [`ContentHash`]: SHA-256 of the file bytes. Equal keys mean equal content.
//! - [`SizeExtension`]: stat-only pre-filter. Different files that happen to
//!   share size and extension are grouped too; that is expected in this mode.
//! - [`Composite`]: any non-empty subset of name, size, extension, created
//!   and modified. Names are compared after [`normalize_name`], so
//!   `"a - Copy.txt"` and `"a (1).txt"` match `"a.txt"`.
//!
//! # Example
//!
//! ```
//! use dupedoctor::duplicates::{Composite, CriteriaSet, Criterion, Fingerprint};
//! use dupedoctor::scanner::FileRecord;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let now = SystemTime::now();
//! let a = FileRecord::new(PathBuf::from("/p/a.txt"), 3, now, now);
//! let b = FileRecord::new(PathBuf::from("/p/a - Copy.txt"), 3, now, now);
//!
//! let criteria = CriteriaSet::from_criteria([Criterion::Name, Criterion::Size]);
//! let strategy = Composite::new(criteria).unwrap();
//! assert_eq!(strategy.key(&a), strategy.key(&b));
//! ```

use std::fmt;
use std::time::SystemTime;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::FinderError;
use crate::scanner::{hash_to_hex, normalize_name, FileRecord, Hash, HashError, Hasher};

/// Metadata field selectable for composite fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    /// Normalized base name (copy markers stripped)
    Name,
    /// Size in bytes
    Size,
    /// Lowercased extension
    #[value(alias = "ext")]
    #[serde(alias = "ext")]
    Extension,
    /// Creation time
    Created,
    /// Modification time
    Modified,
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Name => "name",
            Self::Size => "size",
            Self::Extension => "extension",
            Self::Created => "created",
            Self::Modified => "modified",
        };
        f.write_str(name)
    }
}

/// Set of active criteria.
///
/// Stored as flags so the order in which criteria were selected never
/// affects the key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CriteriaSet {
    name: bool,
    size: bool,
    extension: bool,
    created: bool,
    modified: bool,
}

impl CriteriaSet {
    /// Build a set from any sequence of criteria (duplicates ignored).
    #[must_use]
    pub fn from_criteria<I: IntoIterator<Item = Criterion>>(criteria: I) -> Self {
        let mut set = Self::default();
        for criterion in criteria {
            match criterion {
                Criterion::Name => set.name = true,
                Criterion::Size => set.size = true,
                Criterion::Extension => set.extension = true,
                Criterion::Created => set.created = true,
                Criterion::Modified => set.modified = true,
            }
        }
        set
    }

    /// The default name + size + extension selection.
    #[must_use]
    pub fn name_size_extension() -> Self {
        Self::from_criteria([Criterion::Name, Criterion::Size, Criterion::Extension])
    }

    /// Whether no criterion is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.name || self.size || self.extension || self.created || self.modified)
    }

    /// Whether `criterion` is selected.
    #[must_use]
    pub fn contains(&self, criterion: Criterion) -> bool {
        match criterion {
            Criterion::Name => self.name,
            Criterion::Size => self.size,
            Criterion::Extension => self.extension,
            Criterion::Created => self.created,
            Criterion::Modified => self.modified,
        }
    }

    /// Selected criteria in canonical order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Criterion> {
        [
            Criterion::Name,
            Criterion::Extension,
            Criterion::Size,
            Criterion::Created,
            Criterion::Modified,
        ]
        .into_iter()
        .filter(|c| self.contains(*c))
        .collect()
    }
}

/// Tuple of selected metadata fields in canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetadataKey {
    /// Normalized base name
    pub name: Option<String>,
    /// Lowercased extension with dot
    pub extension: Option<String>,
    /// Size in bytes
    pub size: Option<u64>,
    /// Creation time
    pub created: Option<SystemTime>,
    /// Modification time
    pub modified: Option<SystemTime>,
}

/// Comparison key produced by a strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FingerprintKey {
    /// SHA-256 content digest
    Content(Hash),
    /// Selected metadata fields
    Metadata(MetadataKey),
}

impl fmt::Display for FingerprintKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content(hash) => write!(f, "sha256:{}", hash_to_hex(hash)),
            Self::Metadata(key) => {
                let mut parts = Vec::new();
                if let Some(name) = &key.name {
                    parts.push(format!("name={name}"));
                }
                if let Some(ext) = &key.extension {
                    parts.push(format!("ext={ext}"));
                }
                if let Some(size) = key.size {
                    parts.push(format!("size={size}"));
                }
                if let Some(created) = key.created {
                    parts.push(format!("created={}", unix_nanos(created)));
                }
                if let Some(modified) = key.modified {
                    parts.push(format!("modified={}", unix_nanos(modified)));
                }
                f.write_str(&parts.join(";"))
            }
        }
    }
}

fn unix_nanos(time: SystemTime) -> i128 {
    match time.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(d) => d.as_nanos() as i128,
        Err(e) => -(e.duration().as_nanos() as i128),
    }
}

/// A fingerprint strategy: `FileRecord -> FingerprintKey`.
pub trait Fingerprint: Send + Sync {
    /// Short strategy name for logs and reports.
    fn name(&self) -> &'static str;

    /// Compute the key, reporting why it could not be computed.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when the file content cannot be read.
    fn try_key(&self, record: &FileRecord) -> Result<FingerprintKey, HashError>;

    /// Compute the key; `None` excludes the file from grouping.
    fn key(&self, record: &FileRecord) -> Option<FingerprintKey> {
        match self.try_key(record) {
            Ok(key) => Some(key),
            Err(e) => {
                log::warn!("No fingerprint for {}: {}", record.path.display(), e);
                None
            }
        }
    }
}

/// Content-hash strategy (streamed SHA-256).
#[derive(Debug, Clone, Default)]
pub struct ContentHash {
    hasher: Hasher,
}

impl ContentHash {
    /// Create the strategy with the default 8 KiB chunked hasher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Fingerprint for ContentHash {
    fn name(&self) -> &'static str {
        "content-hash"
    }

    fn try_key(&self, record: &FileRecord) -> Result<FingerprintKey, HashError> {
        log::trace!("Hashing: {}", record.path.display());
        self.hasher
            .full_hash(&record.path)
            .map(FingerprintKey::Content)
    }
}

/// Size + extension strategy (stat-only).
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeExtension;

impl Fingerprint for SizeExtension {
    fn name(&self) -> &'static str {
        "size-extension"
    }

    fn try_key(&self, record: &FileRecord) -> Result<FingerprintKey, HashError> {
        Ok(FingerprintKey::Metadata(MetadataKey {
            name: None,
            extension: Some(record.extension.clone()),
            size: Some(record.size),
            created: None,
            modified: None,
        }))
    }
}

/// Composite metadata strategy over a user-selected criteria set.
#[derive(Debug, Clone, Copy)]
pub struct Composite {
    criteria: CriteriaSet,
}

impl Composite {
    /// Create the strategy.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::InvalidConfiguration`] for an empty criteria set.
    pub fn new(criteria: CriteriaSet) -> Result<Self, FinderError> {
        if criteria.is_empty() {
            return Err(FinderError::InvalidConfiguration(
                "at least one match criterion must be selected".to_string(),
            ));
        }
        Ok(Self { criteria })
    }

    /// Normalized name + size + extension.
    #[must_use]
    pub fn name_size_extension() -> Self {
        Self {
            criteria: CriteriaSet::name_size_extension(),
        }
    }

    /// Active criteria.
    #[must_use]
    pub fn criteria(&self) -> CriteriaSet {
        self.criteria
    }
}

impl Fingerprint for Composite {
    fn name(&self) -> &'static str {
        "metadata"
    }

    fn try_key(&self, record: &FileRecord) -> Result<FingerprintKey, HashError> {
        let c = &self.criteria;
        Ok(FingerprintKey::Metadata(MetadataKey {
            name: c.name.then(|| normalize_name(record.stem())),
            extension: c.extension.then(|| record.extension.clone()),
            size: c.size.then_some(record.size),
            created: c.created.then_some(record.created),
            modified: c.modified.then_some(record.modified),
        }))
    }
}

/// Strategy selector used by configuration and the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// SHA-256 of the file content
    #[default]
    ContentHash,
    /// Size and extension only
    SizeExtension,
    /// Composite of the selected criteria
    Metadata,
}

impl StrategyKind {
    /// Build the strategy; `criteria` is only used by [`StrategyKind::Metadata`].
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::InvalidConfiguration`] for metadata matching
    /// with an empty criteria set.
    pub fn build(self, criteria: CriteriaSet) -> Result<Box<dyn Fingerprint>, FinderError> {
        Ok(match self {
            Self::ContentHash => Box::new(ContentHash::new()),
            Self::SizeExtension => Box::new(SizeExtension),
            Self::Metadata => Box::new(Composite::new(criteria)?),
        })
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContentHash => write!(f, "content-hash"),
            Self::SizeExtension => write!(f, "size-extension"),
            Self::Metadata => write!(f, "metadata"),
        }
    }
}
