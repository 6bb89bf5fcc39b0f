//! Shelf-Scraper main entry point
//!
//! This is the command-line interface for the Shelf-Scraper listing harvester.

use anyhow::{Context, Result};
use clap::Parser;
use shelf_scraper::config::{load_config_with_hash, Config};
use shelf_scraper::crawler::{run_scrape, select_categories, RunOptions};
use shelf_scraper::logging::init_logging;
use shelf_scraper::output::print_summary;
use std::path::PathBuf;

/// Shelf-Scraper: a paginated product-listing harvester
///
/// Shelf-Scraper discovers every page of a category listing from its seed
/// page, fetches the pages under a fixed concurrency ceiling and appends the
/// extracted products to resumable CSV files.
#[derive(Parser, Debug)]
#[command(name = "shelf-scraper")]
#[command(version)]
#[command(about = "A paginated product-listing harvester", long_about = None)]
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

    /// Clear endpoint and record files of the selected categories first
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be scraped without fetching
    #[arg(long)]
    dry_run: bool,

    /// Only run the named category (repeatable)
    #[arg(long = "category", value_name = "NAME")]
    categories: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let options = RunOptions {
        fresh: cli.fresh,
        only: cli.categories,
    };

    if cli.dry_run {
        handle_dry_run(&config, &options)
    } else {
        handle_scrape(config, options).await
    }
}

/// Handles the --dry-run mode: validates config and shows what would be scraped
fn handle_dry_run(config: &Config, options: &RunOptions) -> Result<()> {
    let categories = select_categories(config, &options.only)?;

    println!("=== Shelf-Scraper Dry Run ===\n");

    println!("Scraper Configuration:");
    println!("  Run scraper: {}", config.scraper.run_scraper);
    match config.scraper.depth {
        Some(depth) if depth > 0 => println!("  Depth: first {} endpoints", depth),
        _ => println!("  Depth: all endpoints"),
    }
    println!(
        "  Max concurrent fetches: {}",
        config.scraper.max_concurrent_fetches
    );
    println!("  Items per page: {}", config.scraper.items_per_page);
    println!("  Chunk size: {}", config.scraper.chunk_size);
    println!("  Count fields: {}", config.scraper.count_fields.join(", "));

    println!("\nFetcher:");
    println!("  Attempts per page: {}", config.fetcher.retries);
    println!(
        "  Navigation timeout: {}ms",
        config.fetcher.navigation_timeout_ms
    );
    println!("  Settle timeout: {}ms", config.fetcher.settle_timeout_ms);
    println!("  Retry delay: {}ms", config.fetcher.retry_delay_ms);
    println!("  User agent: {}", config.fetcher.user_agent);

    println!("\nCategories ({}):", categories.len());
    for category in &categories {
        let status = if category.should_run(&config.scraper) {
            "run"
        } else {
            "skip"
        };
        println!("  - {} [{}]", category.name, status);
        println!("    * Seed: {}", category.seed_url);
        println!("    * Endpoints: {}", category.endpoints_path);
        println!("    * Records: {}", category.records_path);
        if let Some(depth) = category.depth_limit(&config.scraper) {
            println!("    * Depth: {}", depth);
        }
    }

    if options.fresh {
        println!("\nStored files of these categories would be cleared first.");
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would run {} of {} categories",
        categories
            .iter()
            .filter(|c| c.should_run(&config.scraper))
            .count(),
        categories.len()
    );

    Ok(())
}

/// Handles the main scrape operation
async fn handle_scrape(config: Config, options: RunOptions) -> Result<()> {
    if options.fresh {
        tracing::info!("Starting fresh run (clearing stored endpoints and records)");
    } else {
        tracing::info!("Starting run (appending to stored data)");
    }

    let summary = run_scrape(config, options).await.context("Scrape failed")?;
    print_summary(&summary);

    if summary.is_success() {
        tracing::info!("Scrape completed successfully");
    } else {
        tracing::warn!(
            "Scrape completed with {} failed categories",
            summary.categories_failed
        );
    }

    Ok(())
}
