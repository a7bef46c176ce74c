//! # Catalan News Pipeline
//!
//! A small batch pipeline over catalannews.com backed by a Cloudflare D1
//! database reached over its REST query API:
//!
//! 1. **Discovery**: scrape article links from the homepage, derive a
//!    deterministic id per URL, and insert pending records, skipping
//!    duplicates.
//! 2. **Enrichment**: claim one pending record, fetch its article page,
//!    extract title, lead photo, and body text, and write the record back.
//! 3. **Full enrichment**: as above, plus the "First published" date and
//!    rehosting of the lead photo in R2 under a content-addressed key.
//!
//! Each job is invoked separately, runs strictly sequentially, and
//! processes at most one record (enrichment) or one homepage (discovery)
//! per invocation.
//!
//! ## Usage
//!
//! ```sh
//! catalan_news_pipeline discover
//! catalan_news_pipeline enrich
//! catalan_news_pipeline enrich-full
//! ```

use clap::Parser;
use std::error::Error;
use tracing::{debug, info};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod config;
mod db;
mod jobs;
mod models;
mod rehost;
mod scrapers;
mod utils;

use cli::{Cli, Command};
use config::{Config, RehostConfig};
use jobs::enrich::EnrichMode;
use rehost::PhotoStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

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

    let args = Cli::parse();
    let config = Config::from_cli(&args);
    debug!(homepage = %config.homepage_url, "Configuration loaded");

    match args.command {
        Command::Discover => {
            info!("Starting discovery job");
            jobs::discover::run(&config).await?;
        }
        Command::Enrich => {
            info!("Starting enrichment job");
            jobs::enrich::run(&config, EnrichMode::Basic, None).await?;
        }
        Command::EnrichFull(rehost_args) => {
            info!("Starting full enrichment job");
            let store = PhotoStore::connect(RehostConfig::from_args(&rehost_args)).await;
            jobs::enrich::run(&config, EnrichMode::Full, Some(&store)).await?;
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
