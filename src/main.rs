use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use cinevault::application::{DescribeHandle, ImageFetchCache, LoadImagesUseCase, LoadReport};
use cinevault::domain::{AuthToken, HandlePort};
use cinevault::infrastructure::{
    AppConfig, BlobStore, CatalogUrlNormalizer, CliArgs, DecodedImageFactory, HandleKind,
    HttpImageFetcher, LogLevel, StorageManager,
};

fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()))
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = env_filter(config.log_level);

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

/// Loads the config under a stderr subscriber scoped to this call, so its
/// warnings surface before the configured logging exists.
fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(env_filter(args.log_level.unwrap_or_default()))
        .with_writer(std::io::stderr)
        .finish();

    let mut config = tracing::subscriber::with_default(bootstrap, || {
        StorageManager::new()?.load_config(args.config.as_deref())
    })
    .wrap_err("failed to load configuration")?;

    config.merge_with_args(args);
    Ok(config)
}

fn print_reports(reports: &[LoadReport], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
    } else {
        for report in reports {
            println!("{report}");
        }
    }
    Ok(())
}

async fn run<F>(
    config: &AppConfig,
    args: &CliArgs,
    fetcher: Arc<HttpImageFetcher>,
    normalizer: Arc<CatalogUrlNormalizer>,
    handles: Arc<F>,
) -> Result<()>
where
    F: HandlePort + 'static,
    F::Handle: DescribeHandle,
{
    let ceiling = NonZeroUsize::new(config.images.max_concurrent_fetches)
        .ok_or_else(|| eyre!("max_concurrent_fetches must be at least 1"))?;

    let cache = ImageFetchCache::new(fetcher, handles, normalizer, ceiling);
    let use_case = LoadImagesUseCase::new(cache.clone());

    let mut reports = use_case.execute(&args.urls, &args.posters).await;
    if args.repeat {
        reports.extend(use_case.execute(&args.urls, &args.posters).await);
    }

    print_reports(&reports, args.json)?;

    let stats = cache.stats();
    if !args.json {
        println!("{stats}");
    }
    info!(
        hits = stats.hits,
        misses = stats.misses,
        fetches = stats.fetches,
        "Finished loading images"
    );

    let released = cache.invalidate_all();
    info!(released, "Released image handles");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = dotenvy::dotenv();

    let args = CliArgs::parse();
    let config = load_config(&args)?;

    init_logging(&config)?;

    info!(version = cinevault::VERSION, "Starting cinevault");

    if args.urls.is_empty() && args.posters.is_empty() {
        return Err(eyre!("nothing to load: pass image URLs or --poster IDs"));
    }

    let token = args.token.as_deref().and_then(|raw| {
        let token = AuthToken::new(raw);
        if token.is_none() {
            warn!("Ignoring malformed session token");
        }
        token
    });

    let fetcher = Arc::new(HttpImageFetcher::new(
        Duration::from_secs(config.images.timeout_secs),
        token,
    )?);
    let normalizer = Arc::new(
        CatalogUrlNormalizer::new(&config.api_base, &config.catalog_image_base)
            .wrap_err_with(|| format!("invalid api_base {:?}", config.api_base))?,
    );

    match config.images.handle_kind {
        HandleKind::Blob => {
            run(&config, &args, fetcher, normalizer, Arc::new(BlobStore::new())).await
        }
        HandleKind::Decoded => {
            run(
                &config,
                &args,
                fetcher,
                normalizer,
                Arc::new(DecodedImageFactory::new()),
            )
            .await
        }
    }
}
