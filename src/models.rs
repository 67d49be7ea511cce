//! Data models for the ingestion pipeline and its persisted output.
//!
//! Two shapes matter here:
//! - [`RawRecord`]: an unvalidated candidate item pulled out of one feed
//!   document, alive only between extraction and normalization
//! - [`NewsItem`] / [`NewsCollection`]: the validated, classified, slugged
//!   output that gets persisted and consumed by the presentation layer
//!
//! The persisted JSON uses camelCase field names (`publishedAt`, `localUrl`)
//! because that is the contract the client page reads, hence the serde
//! renames.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An unvalidated item extracted from a single feed document.
///
/// Fields are already sanitized text, but nothing is guaranteed yet: the
/// title or URL may be empty (such records are dropped during extraction or
/// normalization) and `published_at` is `None` when no timestamp field
/// parsed. Records are consumed by the normalizer and never persisted.
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// Name of the configured source this record came from.
    pub source: String,
    pub title: String,
    /// Cleaned summary, pre-truncated during extraction.
    pub summary: String,
    pub url: String,
    /// Publish instant, or `None` when every timestamp field failed to parse.
    pub published_at: Option<DateTime<Utc>>,
    /// Keyword tags carried from the feed's `<category>` elements.
    pub keywords: Vec<String>,
}

/// Fixed category set for classified items.
///
/// Serialized as stable kebab-case codes (`"hot-topics"`, `"general"`, …) so
/// the client-side filter can match on them. [`Category::General`] is the
/// default bucket for records no rule matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Regulation,
    Security,
    Infrastructure,
    Defi,
    Rwa,
    Markets,
    HotTopics,
    General,
}

impl Category {
    /// Stable code used in JSON and in page markup.
    pub fn code(&self) -> &'static str {
        match self {
            Category::Regulation => "regulation",
            Category::Security => "security",
            Category::Infrastructure => "infrastructure",
            Category::Defi => "defi",
            Category::Rwa => "rwa",
            Category::Markets => "markets",
            Category::HotTopics => "hot-topics",
            Category::General => "general",
        }
    }

    /// Human-readable label used in rendered artifacts.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Regulation => "Regulation",
            Category::Security => "Security",
            Category::Infrastructure => "Infrastructure",
            Category::Defi => "DeFi",
            Category::Rwa => "RWA",
            Category::Markets => "Markets",
            Category::HotTopics => "Hot Topics",
            Category::General => "General",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A fully validated, classified, deduplicated item eligible for publication.
///
/// Invariants (upheld by the normalizer, never re-checked downstream):
/// `title` and `url` are non-empty, `published_at` is a valid instant,
/// `slug` is unique within the collection, `local_url` is derived from
/// `slug`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub source: String,
    pub title: String,
    pub summary: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub category: Category,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub slug: String,
    pub local_url: String,
}

/// One run's published output: ordered items plus run metadata.
///
/// Items are sorted by `published_at` descending and capped at the
/// configured maximum. Each run's collection wholly replaces the previous
/// one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsCollection {
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub items: Vec<NewsItem>,
}
