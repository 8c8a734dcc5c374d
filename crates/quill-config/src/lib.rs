//! Configuration management for Quill.
//!
//! Parses `quill.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! Path values support `~` expansion. Programmatic overrides (e.g. from a
//! CLI layer) can be applied during load via [`Overrides`].

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "quill.toml";

/// Error returned when configuration cannot be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Config file is not valid TOML.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: toml::de::Error,
    },
}

/// Settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded
/// config.
#[derive(Debug, Default)]
pub struct Overrides {
    /// Override the wiki data root directory.
    pub data_dir: Option<String>,
    /// Override the default page author.
    pub default_author: Option<String>,
    /// Override the export output directory.
    pub export_dir: Option<String>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Wiki data storage configuration.
    pub data: DataConfig,
    /// Wiki defaults.
    pub wiki: WikiConfig,
    /// Export configuration.
    pub export: ExportConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Wiki data storage configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Root directory holding one subdirectory per wiki.
    pub root_dir: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root_dir: "data".to_owned(),
        }
    }
}

/// Wiki defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WikiConfig {
    /// Author recorded on newly created pages.
    pub default_author: Option<String>,
    /// Theme file applied to newly created wikis.
    pub theme_file: Option<String>,
}

/// Export configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory receiving generated archives.
    pub output_dir: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: "exports".to_owned(),
        }
    }
}

impl Config {
    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read and
    /// [`ConfigError::Parse`] when it is not valid TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Discover and load `quill.toml`, searching `start_dir` and its
    /// parents. Returns the defaults when no config file exists.
    ///
    /// # Errors
    ///
    /// Returns an error only when a discovered file fails to load;
    /// absence is not an error.
    pub fn discover(start_dir: &Path) -> Result<Self, ConfigError> {
        let mut dir = Some(start_dir);
        while let Some(current) = dir {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.is_file() {
                return Self::load(&candidate);
            }
            dir = current.parent();
        }
        Ok(Self::default())
    }

    /// Apply non-None overrides on top of the loaded values.
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(data_dir) = &overrides.data_dir {
            self.data.root_dir.clone_from(data_dir);
        }
        if let Some(author) = &overrides.default_author {
            self.wiki.default_author = Some(author.clone());
        }
        if let Some(export_dir) = &overrides.export_dir {
            self.export.output_dir.clone_from(export_dir);
        }
    }

    /// Wiki data root with `~` expanded.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.data.root_dir).into_owned())
    }

    /// Export output directory with `~` expanded.
    #[must_use]
    pub fn export_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.export.output_dir).into_owned())
    }
}
