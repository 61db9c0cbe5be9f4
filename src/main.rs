//! Pagewalk main entry point
//!
//! This is the command-line interface for the Pagewalk site crawler.

use anyhow::Context;
use clap::Parser;
use pagewalk::config::load_config_with_hash;
use pagewalk::crawler::run_crawl;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Pagewalk: a resumable single-host link crawler
///
/// Pagewalk crawls every internal page reachable from a seed URL,
/// classifies every discovered link, and persists its state as JSON so an
/// interrupted crawl picks up where it left off.
#[derive(Parser, Debug)]
#[command(name = "pagewalk")]
#[command(version = "1.0.0")]
#[command(about = "A resumable single-host link crawler", long_about = None)]
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

    /// Resume an interrupted crawl (default behavior)
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Start a fresh crawl, ignoring previous state
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "report")]
    dry_run: bool,

    /// Print a link-audit report from the persisted state and exit
    #[arg(long, conflicts_with = "dry_run")]
    report: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.report {
        handle_report(&config)?;
    } else {
        handle_crawl(config, cli.fresh).await?;
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
            0 => EnvFilter::new("pagewalk=info,warn"),
            1 => EnvFilter::new("pagewalk=debug,info"),
            2 => EnvFilter::new("pagewalk=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &pagewalk::config::Config) -> anyhow::Result<()> {
    println!("=== Pagewalk Dry Run ===\n");

    println!("Site:");
    println!("  Seed URL: {}", config.site.seed_url);
    for alias in &config.site.alias_urls {
        println!("  Alias: {}", alias);
    }
    if !config.site.include_paths.is_empty() {
        println!("  Include paths:");
        for pattern in &config.site.include_paths {
            println!("    - {}", pattern);
        }
    }
    if !config.site.exclude_paths.is_empty() {
        println!("  Exclude paths:");
        for pattern in &config.site.exclude_paths {
            println!("    - {}", pattern);
        }
    }

    println!("\nCrawler:");
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  Max redirects: {}", config.crawler.max_redirects);
    println!("  Check externals: {}", config.crawler.check_externals);

    println!("\nRetry:");
    println!("  Max attempts: {}", config.retry.max_attempts);
    println!("  Base delay: {}ms", config.retry.base_delay_ms);
    println!("  Backoff factor: {}", config.retry.backoff_factor);

    println!("\nMetadata:");
    println!("  Enabled: {}", config.metadata.enabled);
    if config.metadata.fields.is_empty() {
        println!("  Fields: all");
    } else {
        println!("  Fields: {}", config.metadata.fields.join(", "));
    }

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nOutput:");
    println!("  State: {}", config.output.state_path);
    println!("  Metadata: {}", config.output.metadata_path);

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling from {}", config.site.seed_url);

    Ok(())
}

/// Handles the --report mode: prints a link audit from the persisted state
fn handle_report(config: &pagewalk::config::Config) -> anyhow::Result<()> {
    use pagewalk::output::{audit_links, print_report};
    use pagewalk::storage::{load_metadata, load_snapshot};
    use std::path::Path;

    let snapshot = load_snapshot(Path::new(&config.output.state_path))?
        .with_context(|| format!("No crawl state found at {}", config.output.state_path))?;
    let records = load_metadata(Path::new(&config.output.metadata_path))?.unwrap_or_default();

    let audits = audit_links(&snapshot, &records, config)?;
    print_report(&snapshot, &audits);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: pagewalk::config::Config,
    fresh: bool,
) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring previous state)");
    } else {
        tracing::info!("Starting crawl (will resume if interrupted run exists)");
    }

    tracing::info!(
        "Seed: {}, aliases: {}, include patterns: {}, exclude patterns: {}",
        config.site.seed_url,
        config.site.alias_urls.len(),
        config.site.include_paths.len(),
        config.site.exclude_paths.len()
    );

    // Run the crawler
    match run_crawl(config, fresh).await {
        Ok(()) => {
            tracing::info!("Crawl completed successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
