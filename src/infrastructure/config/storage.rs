//! Locating, creating and reading `config.toml`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::app_config::AppConfig;

const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors raised while locating or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform exposes no per-user config directory.
    #[error("no per-user configuration directory on this platform")]
    ConfigDirNotFound,
    /// Reading or writing the file failed.
    #[error("config file i/o failed: {0}")]
    Io(#[from] std::io::Error),
    /// Defaults could not be rendered as TOML.
    #[error("could not render default config: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Owns the directory holding `config.toml`.
#[derive(Debug, Clone)]
pub struct StorageManager {
    config_dir: PathBuf,
}

impl StorageManager {
    /// Resolves the per-user config directory (`~/.config/cinevault` on Linux).
    ///
    /// # Errors
    /// Returns `ConfigError::ConfigDirNotFound` when the platform has none.
    pub fn new() -> Result<Self, ConfigError> {
        ProjectDirs::from("app", crate::NAME, crate::NAME)
            .map(|dirs| Self::with_dir(dirs.config_dir().to_path_buf()))
            .ok_or(ConfigError::ConfigDirNotFound)
    }

    /// Uses `config_dir` instead of the platform default.
    #[must_use]
    pub const fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Returns the configuration directory.
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Returns the path of the default config file.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    /// Creates the configuration directory if it is missing.
    ///
    /// # Errors
    /// Returns `ConfigError::Io` if the directory cannot be created.
    pub fn ensure_config_dir(&self) -> Result<(), ConfigError> {
        if !self.config_dir.is_dir() {
            info!(path = %self.config_dir.display(), "Creating configuration directory");
            fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Reads the configuration from `path_override` or the default file.
    ///
    /// On first run the default file is created with default values. An
    /// explicit override must point into an existing directory. A file that
    /// fails to parse is left untouched; a warning is logged and defaults
    /// are used.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or created.
    pub fn load_config(&self, path_override: Option<&Path>) -> Result<AppConfig, ConfigError> {
        let path = path_override.map_or_else(|| self.config_file(), Path::to_path_buf);

        if !path.exists() {
            if path_override.is_none() {
                self.ensure_config_dir()?;
            }
            let defaults = AppConfig::default();
            write_atomically(&path, &toml::to_string_pretty(&defaults)?)?;
            info!(path = %path.display(), "Wrote default configuration");
            return Ok(defaults);
        }

        let content = fs::read_to_string(&path)?;
        let config = toml::from_str(&content).unwrap_or_else(|e| {
            warn!(
                path = %path.display(),
                error = %e,
                "Failed to parse config file, using defaults"
            );
            AppConfig::default()
        });
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}

/// Replaces `path` with `content` through a temp file in the same directory.
fn write_atomically(path: &Path, content: &str) -> Result<(), ConfigError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    staged.write_all(content.as_bytes())?;
    staged.persist(path).map_err(|e| e.error)?;
    Ok(())
}
