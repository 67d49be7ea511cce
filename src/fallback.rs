//! Fallback to the previous run's persisted collection.
//!
//! When a run collects nothing (every source down, or everything stale),
//! the previous `news.json` is reloaded and its items are fed back through
//! the normalizer as if they were fresh raw records. Re-deriving categories
//! and slugs keeps a stale snapshot consistent with rule or format changes
//! made since it was written. This path must never fail: with no usable
//! prior data it produces an empty, well-formed collection.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

use crate::config::AppConfig;
use crate::models::{NewsCollection, RawRecord};
use crate::normalize::normalize;
use crate::utils::parse_date;

/// RawRecord-shaped view of a persisted item. Deliberately ignores
/// `category`, `slug` and any field a future format adds or renames, so old
/// snapshots always load.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotItem {
    source: String,
    title: String,
    #[serde(default)]
    summary: String,
    url: String,
    #[serde(default)]
    published_at: String,
    #[serde(default)]
    keywords: Vec<String>,
}

impl From<SnapshotItem> for RawRecord {
    fn from(item: SnapshotItem) -> Self {
        RawRecord {
            source: item.source,
            title: item.title,
            summary: item.summary,
            url: item.url,
            published_at: parse_date(&item.published_at),
            keywords: item.keywords,
        }
    }
}

async fn read_snapshot_records(path: &Path) -> Vec<RawRecord> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(_) => return Vec::new(),
    };
    let value: Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(error) => {
            warn!(%error, "previous collection is not valid JSON; ignoring it");
            return Vec::new();
        }
    };
    // both historical shapes: a bare items array, or the full document
    let empty = Vec::new();
    let items = value
        .as_array()
        .or_else(|| value.get("items").and_then(Value::as_array))
        .unwrap_or(&empty);
    items
        .iter()
        .filter_map(|item| serde_json::from_value::<SnapshotItem>(item.clone()).ok())
        .map(RawRecord::from)
        .collect()
}

/// Rebuild a collection from the previous run's persisted output.
///
/// Returns an empty collection when no prior snapshot exists or nothing in
/// it survives normalization.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_fallback(path: &Path, config: &AppConfig, now: DateTime<Utc>) -> NewsCollection {
    let records = read_snapshot_records(path).await;
    if records.is_empty() {
        warn!("no previous collection to fall back to; publishing an empty collection");
    } else {
        info!(count = records.len(), "re-normalizing the previous collection");
    }
    normalize(records, config, now)
}
