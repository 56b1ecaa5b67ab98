//! Emblem-Crawl main entry point
//!
//! This is the command-line interface for the Emblem-Crawl match-history crawler.

use anyhow::Context;
use clap::Parser;
use emblem_crawl::config::{load_config_with_hash, Config};
use emblem_crawl::crawler::crawl;
use emblem_crawl::storage::load_results;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Emblem-Crawl: a match-history graph crawler
///
/// Emblem-Crawl starts from accounts known to own a rare collectible, walks
/// the accounts they played with, and records every account that owns the
/// same collectible. Every provider response is cached permanently.
#[derive(Parser, Debug)]
#[command(name = "emblem-crawl")]
#[command(version = "1.0.0")]
#[command(about = "A match-history graph crawler", long_about = None)]
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

    /// Validate config and show the seed list without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the results file and cache, then exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config).await?;
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
            0 => EnvFilter::new("emblem_crawl=info,warn"),
            1 => EnvFilter::new("emblem_crawl=debug,info"),
            2 => EnvFilter::new("emblem_crawl=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows the seed list
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Emblem-Crawl Dry Run ===\n");

    println!("Provider:");
    println!("  Base URL: {}", config.provider.base_url);
    println!("  Title: {}", config.provider.title);
    println!("  Collectible: {}", config.provider.collectible_id);
    println!(
        "  API key: {}",
        if config.provider.api_key.is_empty() {
            "(empty)"
        } else {
            "(set)"
        }
    );
    match config.provider.timeout() {
        Some(timeout) => println!("  Request timeout: {}ms", timeout.as_millis()),
        None => println!("  Request timeout: none"),
    }

    println!("\nWorkers:");
    println!(
        "  Inspect/history workers: {}",
        config.queues.inspect_concurrency
    );
    println!("  Report workers: {}", config.queues.report_concurrency);
    println!("  Status interval: {}ms", config.status.report_interval);

    println!("\nOutput:");
    println!("  Cache: {}", config.output.cache_path);
    println!("  Results: {}", config.output.results_path);

    let seeds = load_results(Path::new(&config.output.results_path))
        .with_context(|| format!("Failed to read {}", config.output.results_path))?;

    println!("\nSeed Accounts ({}):", seeds.len());
    for seed in &seeds {
        println!("  - {} (state {})", seed.account_ref(), seed.collectible_state);
    }

    println!("\n✓ Configuration is valid");
    if seeds.is_empty() {
        println!("✗ No seed accounts; a crawl would have nothing to explore");
    } else {
        println!("✓ Would start crawling from {} seed accounts", seeds.len());
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from the results file and cache
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use emblem_crawl::output::{load_statistics, print_statistics};

    println!("Results: {}", config.output.results_path);
    println!("Cache: {}\n", config.output.cache_path);

    let stats = load_statistics(
        Path::new(&config.output.results_path),
        Path::new(&config.output.cache_path),
    )?;

    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Hunting collectible {} on {}",
        config.provider.collectible_id,
        config.provider.base_url
    );

    match crawl(config).await {
        Ok(()) => {
            tracing::info!("Crawl stopped");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
