use super::app_config::{HandleKind, LogLevel};
use clap::Parser;
use std::path::PathBuf;

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "cinevault",
    version,
    about = "Fetch and cache catalog posters and artwork",
    long_about = None
)]
pub struct CliArgs {
    /// Image URLs or catalog paths to load.
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// Movie ids whose posters to load.
    #[arg(long = "poster", value_name = "ID")]
    pub posters: Vec<String>,

    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Catalog backend origin.
    #[arg(long, env = "CINEVAULT_API_BASE")]
    pub api_base: Option<String>,

    /// Metadata provider image base.
    #[arg(long)]
    pub catalog_image_base: Option<String>,

    /// Maximum simultaneously running fetches.
    #[arg(long)]
    pub max_concurrent_fetches: Option<usize>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Handle factory to use.
    #[arg(long, value_enum)]
    pub handle_kind: Option<HandleKind>,

    /// Session bearer token.
    #[arg(long, env = "CINEVAULT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Load everything a second time to show cache hits.
    #[arg(long)]
    pub repeat: bool,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}
