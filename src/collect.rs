//! Collection orchestration: fan out over configured sources, fan in raw
//! records.
//!
//! Sources are independent, so their fetches run concurrently with bounded
//! parallelism. A failing source is logged and skipped; it never aborts the
//! run. Aggregation happens only after every fetch resolved, so the
//! normalizer always sees the complete record set.

use futures::stream::{self, StreamExt};
use reqwest::Client;
use tracing::{info, instrument, warn};

use crate::config::{AppConfig, SourceConfig};
use crate::feed::parse_feed;
use crate::fetch::fetch_first_available;
use crate::models::RawRecord;

async fn collect_one(client: &Client, config: &AppConfig, source: &SourceConfig) -> Vec<RawRecord> {
    match fetch_first_available(client, &source.urls).await {
        Ok((body, endpoint)) => {
            let mut records = parse_feed(&body, &source.name);
            if records.is_empty() {
                warn!(source = %source.name, %endpoint, "feed failed: no usable records");
                return Vec::new();
            }
            records.truncate(config.max_per_source);
            info!(source = %source.name, count = records.len(), %endpoint, "feed ok");
            records
        }
        Err(failure) => {
            warn!(source = %source.name, error = %failure, "feed failed");
            Vec::new()
        }
    }
}

/// Fetch and extract every configured source, concatenating all
/// successfully retrieved records. Cross-source ordering is not significant;
/// the normalizer re-sorts by timestamp.
#[instrument(level = "info", skip_all, fields(sources = config.sources.len()))]
pub async fn collect_from_sources(client: &Client, config: &AppConfig) -> Vec<RawRecord> {
    let per_source: Vec<Vec<RawRecord>> = stream::iter(&config.sources)
        .map(|source| collect_one(client, config, source))
        .buffer_unordered(config.fetch_parallelism.max(1))
        .collect()
        .await;

    let records: Vec<RawRecord> = per_source.into_iter().flatten().collect();
    info!(count = records.len(), "collected raw records from all sources");
    records
}
