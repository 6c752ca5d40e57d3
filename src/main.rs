//! vacancy-crawler main entry point
//!
//! This is the command-line interface for the job board crawler and its
//! asset utilities.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use vacancy_crawler::assets::{
    create_page_images, rename_images_and_write_manifest, rename_pdfs_and_write_manifest,
    PdftoppmRasterizer,
};
use vacancy_crawler::config::{load_config_with_hash, Config, VariantConfig};
use vacancy_crawler::crawler::{crawl_variant, StartMode};
use vacancy_crawler::{CrawlOutcome, TodayPattern};

/// vacancy-crawler: daily job board scraper
///
/// Crawls today's public and private sector vacancy posts into JSON
/// collections, resuming interrupted runs, then renumbers downloaded
/// agency icons and writes their manifest.
#[derive(Parser, Debug)]
#[command(name = "vacancy-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A resumable job board crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Start fresh crawls, ignoring previous progress
    #[arg(long)]
    fresh: bool,

    /// Only crawl the named variant
    #[arg(long, value_name = "NAME")]
    variant: Option<String>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Skip the image rename step after crawling
    #[arg(long)]
    skip_images: bool,

    /// Deduplicate and renumber PDFs after crawling
    #[arg(long)]
    rename_pdfs: bool,

    /// Render PDF pages to images after crawling
    #[arg(long)]
    rasterize_pdfs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    let variants = select_variants(&config, cli.variant.as_deref())?;

    if cli.dry_run {
        handle_dry_run(&config, &variants);
        return Ok(());
    }

    let mode = if cli.fresh {
        StartMode::Fresh
    } else {
        StartMode::Resume
    };
    let failed = handle_crawl(&config, &variants, mode).await;

    if !cli.skip_images {
        let collections: Vec<&Path> = config
            .variants
            .iter()
            .map(|v| v.output_path.as_path())
            .collect();
        rename_images_and_write_manifest(&config.assets, &collections)
            .context("Image rename failed")?;
    }

    if cli.rename_pdfs {
        rename_pdfs_and_write_manifest(&config.assets).context("PDF rename failed")?;
    }

    if cli.rasterize_pdfs {
        create_page_images(&config.assets, &PdftoppmRasterizer::default())
            .await
            .context("PDF rasterization failed")?;
    }

    if !failed.is_empty() {
        bail!("Crawl failed for: {}", failed.join(", "));
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("vacancy_crawler=info,warn"),
            1 => EnvFilter::new("vacancy_crawler=debug,info"),
            2 => EnvFilter::new("vacancy_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Resolves `--variant` against the configured variants
fn select_variants<'a>(
    config: &'a Config,
    name: Option<&str>,
) -> anyhow::Result<Vec<&'a VariantConfig>> {
    match name {
        Some(name) => match config.variant(name) {
            Some(variant) => Ok(vec![variant]),
            None => bail!("No variant named '{}' in configuration", name),
        },
        None => Ok(config.variants.iter().collect()),
    }
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config, variants: &[&VariantConfig]) {
    println!("=== vacancy-crawler Dry Run ===\n");

    println!("Site:");
    println!("  Origin: {}", config.site.origin);
    println!("  Home: {}", config.site.home_url);
    println!("  Updates fallback: {}", config.site.updates_url);
    println!("  Menu keyword: {}", config.site.menu_keyword);

    println!("\nBrowser:");
    println!("  Navigation timeout: {}s", config.browser.navigation_timeout_secs);
    println!("  Wait timeout: {}s", config.browser.wait_timeout_secs);
    println!("  Poll interval: {}ms", config.browser.poll_interval_ms);
    println!("  Settle delay: {}s", config.browser.settle_delay_secs);

    let today = TodayPattern::today();
    println!("\nToday matches:");
    println!("  Full date: {}", today.full_date());
    println!("  Day and month: {}", today.day_month());
    println!("  Weekday: {}", today.weekday());

    println!("\nVariants ({}):", variants.len());
    for variant in variants {
        println!("  - {} ({})", variant.name, variant.kind);
        println!("    Output: {}", variant.output_path.display());
        println!("    Progress: {}", variant.progress_path.display());
        println!("    Embedded collection: {}", variant.embeds_collection());
    }

    println!("\nAssets:");
    println!("  Images: {}", config.assets.images_dir.display());
    println!("  PDFs: {}", config.assets.pdfs_dir.display());
    println!(
        "  PDF pages: {} at {} dpi",
        config.assets.pdf_images_dir.display(),
        config.assets.dpi
    );

    println!("\n✓ Configuration is valid");
}

/// Crawls each variant in order, returning the names of those that failed
///
/// A failed variant is logged and does not stop the next one.
async fn handle_crawl(
    config: &Config,
    variants: &[&VariantConfig],
    mode: StartMode,
) -> Vec<String> {
    if mode == StartMode::Fresh {
        tracing::info!("Starting fresh crawl (ignoring previous progress)");
    } else {
        tracing::info!("Starting crawl (will resume if interrupted run exists)");
    }

    let mut failed = Vec::new();
    for variant in variants {
        tracing::info!("Starting {} spider", variant.name);
        match crawl_variant(config, variant, mode).await {
            Ok(CrawlOutcome::Completed {
                targets,
                posts_extracted,
                resumed,
            }) => tracing::info!(
                "{} completed: {} posts extracted for {} targets{}",
                variant.name,
                posts_extracted,
                targets,
                if resumed { " (resumed)" } else { "" }
            ),
            Ok(CrawlOutcome::NoUpdatesToday) => {
                tracing::info!("{} finished, nothing posted today", variant.name)
            }
            Err(e) => {
                tracing::error!("An error occurred while running {}: {}", variant.name, e);
                failed.push(variant.name.clone());
            }
        }
    }
    failed
}
