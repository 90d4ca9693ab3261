//! Spacebar Scraper main entry point
//!
//! Command-line controller: starts one crawl run, prints its events as they
//! arrive, and cancels the run on Ctrl-C.

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use spacebar_scraper::config::{load_config, Config};
use spacebar_scraper::{CrawlEngine, CrawlRequest, CsvSink, Event};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Spacebar Scraper: collect news articles from one category
///
/// Walks the category listing from the start page to the end page (0 means
/// until the category runs out), fetches every article, and saves them as CSV.
#[derive(Parser, Debug)]
#[command(name = "spacebar-scraper")]
#[command(version = "1.0.0")]
#[command(about = "Scrape one news category into a CSV file", long_about = None)]
struct Cli {
    /// Category slug (see --list-categories)
    #[arg(value_name = "CATEGORY", default_value = "politics")]
    category: String,

    /// First listing page
    #[arg(short, long, default_value_t = 1)]
    start: u32,

    /// Last listing page, 0 for no limit
    #[arg(short, long, default_value_t = 1)]
    end: u32,

    /// CSV destination (defaults to output.csv-path from the config)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Print the configured categories and exit
    #[arg(long)]
    list_categories: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?
        }
        None => Config::default(),
    };

    if cli.list_categories {
        print_categories(&config);
        return Ok(());
    }

    if config.category(&cli.category).is_none() {
        tracing::warn!(
            "Category '{}' is not in the configured list; crawling it anyway",
            cli.category
        );
    }

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.csv_path));
    let sink = CsvSink::new(output).with_delimiter(config.output.delimiter);
    let request = CrawlRequest::new(cli.category.clone(), cli.start, cli.end);

    let engine = CrawlEngine::new(config).context("Failed to initialise crawler")?;
    let mut handle = engine
        .start(request, sink)
        .context("Crawl request rejected")?;

    let cancel = handle.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!(">>> Stopping... please wait");
            cancel.cancel();
        }
    });

    let mut success = false;
    while let Some(event) = handle.next_event().await {
        match event {
            Event::Log(line) => {
                if !cli.quiet {
                    println!("[{}] {}", Local::now().format("%H:%M:%S"), line);
                }
            }
            Event::Status(status) => tracing::info!("{}", status),
            Event::Progress { done, total } => match total {
                Some(total) => tracing::info!("Progress: {}/{} pages", done, total),
                None => tracing::debug!("Progress: unbounded run"),
            },
            Event::Done {
                success: ok,
                summary,
            } => {
                success = ok;
                if ok {
                    println!("{}", summary);
                } else {
                    eprintln!("{}", summary);
                }
                break;
            }
        }
    }

    handle.wait().await;

    if !success {
        std::process::exit(1);
    }
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("spacebar_scraper=warn,warn"),
            1 => EnvFilter::new("spacebar_scraper=info,warn"),
            2 => EnvFilter::new("spacebar_scraper=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_categories(config: &Config) {
    println!("Categories ({}):", config.categories.len());
    for entry in &config.categories {
        if entry.label.is_empty() {
            println!("  {}", entry.slug);
        } else {
            println!("  {:<12} {}", entry.slug, entry.label);
        }
    }
}
