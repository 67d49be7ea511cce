//! # Chain News Radar
//!
//! A news aggregation pipeline that pulls RSS/Atom feeds from a fixed set of
//! blockchain news sources, merges them into one deduplicated, categorized,
//! freshness-bounded collection, and emits the collection plus derived
//! static artifacts.
//!
//! ## Usage
//!
//! ```sh
//! chain_news_radar -o ./public
//! ```
//!
//! ## Architecture
//!
//! One run is a straight pipeline:
//! 1. **Collect**: fetch every configured source (bounded concurrency, per
//!    source candidate-URL fallback) and extract raw records
//! 2. **Normalize**: canonicalize, classify, freshness-filter, deduplicate,
//!    slug and cap the records into the authoritative collection
//! 3. **Fall back**: if nothing survived, rebuild from the previous run's
//!    persisted collection so the site never publishes nothing
//! 4. **Emit**: news.json (atomic swap), per-item detail pages, feed.xml,
//!    sitemap.xml, robots.txt

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod collect;
mod config;
mod fallback;
mod feed;
mod fetch;
mod models;
mod normalize;
mod outputs;
mod text;
mod utils;

use cli::Cli;
use outputs::{json, pages, sitemap, syndication};
use utils::ensure_writable_dir;

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
    info!("chain_news_radar starting up");

    let args = Cli::parse();
    debug!(?args.output_dir, ?args.config, "parsed CLI arguments");

    let mut config = config::load(args.config.as_deref())?;
    if let Some(site_url) = args.site_url {
        config.site_url = site_url;
    }
    info!(
        sources = config.sources.len(),
        max_items = config.max_items,
        lookback_days = config.lookback_days,
        "configuration ready"
    );

    // Early check: fail before spending time on the network
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let client = fetch::build_client(&config)?;
    let run_started = Utc::now();

    // ---- Collect and normalize ----
    let records = collect::collect_from_sources(&client, &config).await;
    let mut collection = normalize::normalize(records, &config, run_started);

    if collection.items.is_empty() {
        warn!("no fresh records survived; falling back to the previous collection");
        let snapshot_path = Path::new(&args.output_dir).join(json::COLLECTION_FILE);
        collection = fallback::load_fallback(&snapshot_path, &config, run_started).await;
    }
    info!(total = collection.total, "collection ready");

    // ---- Emit artifacts ----
    // the collection document is the primary contract; failing to persist it
    // fails the run
    json::write_collection(&collection, &args.output_dir).await?;

    // secondary artifacts are logged and skipped on failure
    if let Err(e) = pages::write_item_pages(&collection, &args.output_dir, &config.site_url).await {
        error!(error = %e, "failed to write item detail pages");
    }
    if let Err(e) = syndication::write_feed(&collection, &args.output_dir, &config.site_url).await {
        error!(error = %e, "failed to write syndication document");
    }
    if let Err(e) = sitemap::write_sitemap(&collection, &args.output_dir, &config.site_url).await {
        error!(error = %e, "failed to write sitemap");
    }
    if let Err(e) = sitemap::write_robots(&args.output_dir, &config.site_url).await {
        error!(error = %e, "failed to write robots policy");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        total = collection.total,
        "execution complete"
    );

    Ok(())
}
