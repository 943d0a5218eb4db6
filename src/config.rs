//! Layered application settings.
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults ([`Settings::default`])
//! 2. A TOML file: `--config <FILE>` or the platform config dir
//!    (`~/.config/dupedoctor/config.toml` on Linux)
//! 3. Environment variables prefixed with `DUPEDOCTOR_`
//! 4. Command-line flags ([`SettingsOverrides`])
//!
//! List settings accept either a TOML array or a comma-separated string, so
//! `DUPEDOCTOR_EXCLUDE_EXTENSIONS=py,pyc` and
//! `DUPEDOCTOR_EXCLUDE_EXTENSIONS="[py, pyc]"` are equivalent.
//!
//! Settings are turned into per-component config values ([`WalkerConfig`],
//! a fingerprint strategy, [`QuarantineConfig`]) that are handed to each
//! component when it is constructed.
//!
//! ```toml
//! strategy = "metadata"
//! criteria = ["name", "size", "extension"]
//! exclude_extensions = ["py", "pyc"]
//! mode = "copy"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::de::{self, DeserializeOwned, Deserializer, IntoDeserializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::{MoveMode, QuarantineConfig};
use crate::duplicates::{CriteriaSet, Criterion, FinderError, Fingerprint, StrategyKind};
use crate::scanner::{normalize_extension, WalkerConfig};

/// Prefix for environment overrides (`DUPEDOCTOR_MODE=copy`).
pub const ENV_PREFIX: &str = "DUPEDOCTOR_";

/// Name of the config file inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors raised while loading or rendering settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A source could not be parsed or has the wrong shape.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// Settings were parsed but cannot be used.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Effective settings could not be rendered as TOML.
    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

/// Effective settings after all layers are merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Fingerprint strategy.
    pub strategy: StrategyKind,
    /// Fields compared by the metadata strategy.
    #[serde(deserialize_with = "list_or_csv")]
    pub criteria: Vec<Criterion>,
    /// Extensions skipped by the walker.
    #[serde(deserialize_with = "list_or_csv")]
    pub exclude_extensions: Vec<String>,
    /// When non-empty, the only extensions walked.
    #[serde(deserialize_with = "list_or_csv")]
    pub include_extensions: Vec<String>,
    /// Quarantine mode.
    pub mode: MoveMode,
    /// Override for `<root>/_quarantine_<name>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarantine_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            criteria: vec![Criterion::Name, Criterion::Size, Criterion::Extension],
            exclude_extensions: Vec::new(),
            include_extensions: Vec::new(),
            mode: MoveMode::default(),
            quarantine_dir: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrCsv<T> {
    List(Vec<T>),
    Csv(String),
}

/// Accept `["a", "b"]` as well as `"a,b"`. Blank items are dropped.
fn list_or_csv<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match ListOrCsv::<T>::deserialize(deserializer)? {
        ListOrCsv::List(items) => Ok(items),
        ListOrCsv::Csv(text) => text
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| {
                T::deserialize(item.into_deserializer())
                    .map_err(|e: de::value::Error| de::Error::custom(format!("{item:?}: {e}")))
            })
            .collect(),
    }
}

/// Values supplied on the command line. `None` leaves lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SettingsOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criteria: Option<Vec<Criterion>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_extensions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_extensions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<MoveMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarantine_dir: Option<PathBuf>,
}

impl Settings {
    /// Platform config file location, if a home directory can be determined.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupedoctor", "dupedoctor")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Defaults, config file and environment, without CLI overrides.
    ///
    /// A missing default config file is ignored; `config_file` must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] for a missing explicit file.
    pub fn figment(config_file: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));

        match config_file {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                log::debug!("Loading config from {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(path) = Self::default_config_path() {
                    log::trace!("Default config path: {}", path.display());
                    figment = figment.merge(Toml::file(path));
                }
            }
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Load and validate settings from every layer.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any source is malformed or the merged
    /// settings are unusable.
    pub fn load(
        config_file: Option<&Path>,
        overrides: &SettingsOverrides,
    ) -> Result<Self, ConfigError> {
        let settings: Settings = Self::figment(config_file)?
            .merge(Serialized::defaults(overrides))
            .extract()?;
        settings.normalized()
    }

    /// Normalize extension lists and reject unusable combinations.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the metadata strategy has no
    /// criteria selected.
    pub fn normalized(mut self) -> Result<Self, ConfigError> {
        self.exclude_extensions = normalize_list(&self.exclude_extensions);
        self.include_extensions = normalize_list(&self.include_extensions);

        if self.strategy == StrategyKind::Metadata && self.criteria.is_empty() {
            return Err(ConfigError::Invalid(
                "metadata strategy requires at least one criterion".to_string(),
            ));
        }
        Ok(self)
    }

    /// Selected criteria as a set.
    #[must_use]
    pub fn criteria_set(&self) -> CriteriaSet {
        CriteriaSet::from_criteria(self.criteria.iter().copied())
    }

    /// Build the configured strategy.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::InvalidConfiguration`] for an empty metadata
    /// criteria set.
    pub fn fingerprint(&self) -> Result<Arc<dyn Fingerprint>, FinderError> {
        self.strategy.build(self.criteria_set()).map(Arc::from)
    }

    /// Walker filters derived from the extension lists.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::default()
            .with_exclude_extensions(&self.exclude_extensions)
            .with_include_extensions(&self.include_extensions)
    }

    /// Quarantine settings derived from mode and directory override.
    #[must_use]
    pub fn quarantine_config(&self) -> QuarantineConfig {
        let config = QuarantineConfig::new(self.mode);
        match &self.quarantine_dir {
            Some(dir) => config.with_quarantine_dir(dir),
            None => config,
        }
    }

    /// Render as TOML, suitable for pasting into a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Render`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn normalize_list(exts: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(exts.len());
    for ext in exts.iter().map(|e| normalize_extension(e)) {
        if !ext.is_empty() && !out.contains(&ext) {
            out.push(ext);
        }
    }
    out
}
