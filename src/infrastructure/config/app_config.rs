//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::services::DEFAULT_MAX_CONCURRENT_FETCHES;
use crate::infrastructure::catalog::{
    DEFAULT_API_BASE, DEFAULT_CATALOG_IMAGE_BASE, DEFAULT_TIMEOUT_SECS,
};

use super::args::CliArgs;

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Which handle factory backs the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HandleKind {
    /// Revocable `blob:` URLs over raw bytes.
    #[default]
    Blob,
    /// Eagerly decoded pixel buffers.
    Decoded,
}

/// Application configuration, from `config.toml` with CLI overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Catalog backend origin that relative image paths resolve against.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Image base of the metadata provider.
    #[serde(default = "default_catalog_image_base")]
    pub catalog_image_base: String,

    /// Image fetch settings.
    #[serde(default)]
    pub images: ImagesConfig,
}

/// Image fetch configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagesConfig {
    /// Maximum simultaneously running fetches.
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Handle factory.
    #[serde(default)]
    pub handle_kind: HandleKind,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            handle_kind: HandleKind::default(),
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_catalog_image_base() -> String {
    DEFAULT_CATALOG_IMAGE_BASE.to_string()
}

const fn default_max_concurrent_fetches() -> usize {
    DEFAULT_MAX_CONCURRENT_FETCHES
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(api_base) = &args.api_base {
            self.api_base.clone_from(api_base);
        }
        if let Some(catalog_image_base) = &args.catalog_image_base {
            self.catalog_image_base.clone_from(catalog_image_base);
        }
        if let Some(max) = args.max_concurrent_fetches {
            self.images.max_concurrent_fetches = max;
        }
        if let Some(timeout_secs) = args.timeout_secs {
            self.images.timeout_secs = timeout_secs;
        }
        if let Some(handle_kind) = args.handle_kind {
            self.images.handle_kind = handle_kind;
        }
    }

    /// Returns effective log path. Logging goes to stderr when unset.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config: None,
            log_path: None,
            log_level: LogLevel::Info,
            api_base: default_api_base(),
            catalog_image_base: default_catalog_image_base(),
            images: ImagesConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_partial_config() {
        let toml_content = r#"
            api_base = "https://catalog.example.org"
            log_level = "debug"

            [images]
            max_concurrent_fetches = 8
            handle_kind = "decoded"
        "#;

        let config: AppConfig = toml::from_str(toml_content).expect("Failed to parse config");

        assert_eq!(config.api_base, "https://catalog.example.org");
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.images.max_concurrent_fetches, 8);
        assert_eq!(config.images.handle_kind, HandleKind::Decoded);
        assert_eq!(config.images.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.catalog_image_base, DEFAULT_CATALOG_IMAGE_BASE);
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(
            config.images.max_concurrent_fetches,
            DEFAULT_MAX_CONCURRENT_FETCHES
        );
        assert_eq!(config.images.handle_kind, HandleKind::Blob);
    }

    #[test]
    fn test_args_override_file_values() {
        let mut config = AppConfig::default();
        let args = CliArgs::parse_from([
            "cinevault",
            "--api-base",
            "http://10.0.0.2:8080",
            "--max-concurrent-fetches",
            "2",
            "--handle-kind",
            "decoded",
            "/img/a",
        ]);

        config.merge_with_args(&args);

        assert_eq!(config.api_base, "http://10.0.0.2:8080");
        assert_eq!(config.images.max_concurrent_fetches, 2);
        assert_eq!(config.images.handle_kind, HandleKind::Decoded);
        assert_eq!(config.log_level, LogLevel::Info);
    }
}
