//! # Archive Crawler
//!
//! A parallel crawler that walks a news site's paginated archive with
//! headless Chromium and extracts one structured record per article.
//!
//! ## Usage
//!
//! ```sh
//! archive_crawler                       # idnes.cz sport archive, pages 1-17
//! archive_crawler --last-page 3 -o out.json
//! RUST_LOG=archive_crawler=debug archive_crawler -c layout.yaml
//! ```
//!
//! ## Architecture
//!
//! The application runs a two-stage pipeline:
//! 1. **Indexing**: render every archive page and collect article links
//! 2. **Extraction**: render every article page and extract title, content,
//!    category, photo count, date, and comment count
//! 3. **Output**: write all records to one JSON file
//!
//! Both stages share the same bounded worker pool primitive
//! ([`runner::run_all`]); each page gets its own short-lived browser.

use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod browser;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod pipeline;
mod runner;
mod scrapers;
mod utils;

use browser::ChromeFetcher;
use cli::Cli;
use config::{CrawlConfig, archive_urls};
use outputs::json;
use pipeline::Pipeline;
use utils::ensure_output_writable;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("archive_crawler starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Configuration ----
    let mut config = CrawlConfig::load(args.config.as_deref())?;
    if let Some(path) = args.chrome_executable.clone() {
        config.browser.chrome_executable = Some(path);
    }
    let layout = config.layout.compile()?;
    let seeds = archive_urls(&args.archive_url, args.first_page, args.last_page)?;

    if args.concurrency == 0 {
        warn!("Concurrency of 0 requested; running one page at a time");
    }

    // Early check: fail before launching any browser if the output can't be written
    let output = PathBuf::from(&args.output);
    if let Err(e) = ensure_output_writable(&output).await {
        error!(
            path = %output.display(),
            error = %e,
            "Output location is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    info!(
        archive_pages = seeds.len(),
        concurrency = args.concurrency,
        output = %output.display(),
        "Starting crawl"
    );

    // ---- Crawl ----
    let fetcher = ChromeFetcher::new(config.browser.clone(), layout.consent_xpath.clone());
    let pipeline = Pipeline::new(fetcher, layout, args.concurrency);
    let articles = pipeline.run(seeds).await;

    // ---- Output ----
    if let Err(e) = json::write_articles(&output, &articles).await {
        error!(path = %output.display(), error = %e, "Failed to write JSON output");
        return Err(e);
    }

    let elapsed = start_time.elapsed();
    info!(
        articles = articles.len(),
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
