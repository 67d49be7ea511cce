//! Normalization and classification: raw records in, the authoritative
//! collection out.
//!
//! This stage owns every correctness-sensitive decision: URL
//! canonicalization, timestamp substitution, ordered keyword-rule
//! classification, the freshness window, fingerprint deduplication, unique
//! slug assignment, and the size cap. It never fails; defective records are
//! dropped one at a time.

use chrono::{DateTime, Duration, Utc};
use itertools::Itertools;
use std::collections::HashSet;
use tracing::{info, instrument};
use url::Url;

use crate::config::AppConfig;
use crate::models::{Category, NewsCollection, NewsItem, RawRecord};
use crate::text::{compact_whitespace, slugify};

/// Ordered classification rules, evaluated top to bottom; the first rule
/// with any keyword substring present in the record's search blob wins.
/// Order is part of the contract (e.g. "sec" outranks "security").
pub const CATEGORY_RULES: &[(Category, &[&str])] = &[
    (
        Category::Regulation,
        &["sec", "regulator", "regulation", "policy", "law", "compliance", "etf"],
    ),
    (
        Category::Security,
        &["hack", "exploit", "breach", "vulnerability", "phishing", "security"],
    ),
    (
        Category::Infrastructure,
        &[
            "ethereum", "solana", "layer2", "layer 2", "rollup", "mainnet", "testnet",
            "protocol", "upgrade", "client",
        ],
    ),
    (
        Category::Defi,
        &["defi", "dex", "amm", "liquidity", "yield", "lending", "staking"],
    ),
    (Category::Rwa, &["rwa", "treasury", "bond", "tokenized", "real world asset"]),
    (
        Category::Markets,
        &["bitcoin", "btc", "eth", "price", "market", "volatility", "flow"],
    ),
    (Category::HotTopics, &["x:", "tweet", "twitter", "thread", "space"]),
];

/// Sources named with this prefix aggregate social posts and are
/// force-classified ahead of the rule scan.
const SOCIAL_SOURCE_PREFIX: &str = "x ";

/// Slug base when a title slugifies to nothing.
const FALLBACK_SLUG: &str = "news";

/// Parse and canonicalize a record URL: any fragment is stripped, anything
/// unparseable disqualifies the record.
pub fn canonicalize_url(raw: &str) -> Option<String> {
    let mut parsed = Url::parse(raw).ok()?;
    parsed.set_fragment(None);
    Some(parsed.to_string())
}

/// Classify a record by the ordered rule table.
///
/// Social-post aggregator sources short-circuit to [`Category::HotTopics`]
/// before any rule runs, even when the blob also matches another rule's
/// keyword. No match lands in [`Category::General`].
pub fn classify(record: &RawRecord) -> Category {
    if record.source.to_lowercase().starts_with(SOCIAL_SOURCE_PREFIX) {
        return Category::HotTopics;
    }
    let blob = format!(
        "{} {} {} {}",
        record.source,
        record.title,
        record.summary,
        record.keywords.join(" ")
    )
    .to_lowercase();
    for (category, keywords) in CATEGORY_RULES {
        if keywords.iter().any(|keyword| blob.contains(keyword)) {
            return *category;
        }
    }
    Category::General
}

struct Staged {
    record: RawRecord,
    published_at: DateTime<Utc>,
    category: Category,
}

/// Produce the run's collection from the raw record multiset.
///
/// Steps, in order: canonicalize and re-compact each record (dropping
/// defective ones), substitute `now` for missing timestamps, classify,
/// filter to the freshness window, stable-sort newest first, deduplicate by
/// `(lowercased title, canonical url)` fingerprint keeping the first-seen
/// copy, assign run-unique date-prefixed slugs, and cap the output size.
/// Always succeeds, possibly with zero items.
#[instrument(level = "info", skip_all, fields(input = records.len()))]
pub fn normalize(records: Vec<RawRecord>, config: &AppConfig, now: DateTime<Utc>) -> NewsCollection {
    let cutoff = now - Duration::days(config.lookback_days);

    let mut staged: Vec<Staged> = records
        .into_iter()
        .filter_map(|mut record| {
            let url = canonicalize_url(&record.url)?;
            record.url = url;
            record.title = compact_whitespace(&record.title);
            record.summary = compact_whitespace(&record.summary);
            if record.title.is_empty() {
                return None;
            }
            let published_at = record.published_at.unwrap_or(now);
            let category = classify(&record);
            Some(Staged { record, published_at, category })
        })
        .filter(|staged| staged.published_at >= cutoff)
        .collect();

    // stable: records with equal timestamps keep their arrival order
    staged.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    let mut slugs_seen: HashSet<String> = HashSet::new();
    let mut items = Vec::new();
    let deduped = staged
        .into_iter()
        .unique_by(|s| format!("{}|{}", s.record.title.to_lowercase(), s.record.url));

    for staged_item in deduped {
        let day = staged_item.published_at.format("%Y%m%d").to_string();
        let mut base = slugify(&staged_item.record.title);
        if base.is_empty() {
            base = FALLBACK_SLUG.to_string();
        }
        let mut slug = format!("{day}-{base}");
        let mut suffix = 2;
        while !slugs_seen.insert(slug.clone()) {
            slug = format!("{day}-{base}-{suffix}");
            suffix += 1;
        }

        let local_url = format!("/news/{slug}.html");
        items.push(NewsItem {
            source: staged_item.record.source,
            title: staged_item.record.title,
            summary: staged_item.record.summary,
            url: staged_item.record.url,
            published_at: staged_item.published_at,
            category: staged_item.category,
            keywords: staged_item.record.keywords,
            slug,
            local_url,
        });
        if items.len() >= config.max_items {
            break;
        }
    }

    info!(total = items.len(), "normalized collection");
    NewsCollection {
        generated_at: now,
        total: items.len(),
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn run_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap()
    }

    fn record(title: &str, url: &str, hours_ago: i64) -> RawRecord {
        RawRecord {
            source: "Fixture".to_string(),
            title: title.to_string(),
            summary: String::new(),
            url: url.to_string(),
            published_at: Some(run_instant() - Duration::hours(hours_ago)),
            keywords: Vec::new(),
        }
    }

    fn config() -> AppConfig {
        AppConfig::default()
    }

    #[test]
    fn sec_keyword_classifies_to_regulation() {
        let mut r = record("SEC weighs new disclosure rules", "https://x.test/a", 1);
        r.summary = "The commission is reviewing filings".to_string();
        assert_eq!(classify(&r), Category::Regulation);
    }

    #[test]
    fn rule_order_breaks_keyword_ties() {
        // matches both the regulation rule ("sec") and the security rule
        // ("hack"); the earlier rule wins
        let r = record("SEC probes exchange hack", "https://x.test/a", 1);
        assert_eq!(classify(&r), Category::Regulation);
    }

    #[test]
    fn social_source_overrides_keyword_rules() {
        let mut r = record("Major exploit hack disclosed", "https://x.test/a", 1);
        r.source = "X Wire".to_string();
        assert_eq!(classify(&r), Category::HotTopics);
    }

    #[test]
    fn keywords_participate_in_the_blob() {
        let mut r = record("Quiet title", "https://x.test/a", 1);
        r.keywords = vec!["staking".to_string()];
        assert_eq!(classify(&r), Category::Defi);
    }

    #[test]
    fn unmatched_records_fall_into_general() {
        let r = record("Weather report", "https://x.test/a", 1);
        assert_eq!(classify(&r), Category::General);
    }

    #[test]
    fn canonicalize_strips_fragments() {
        assert_eq!(
            canonicalize_url("https://x.test/story#section-2").unwrap(),
            "https://x.test/story"
        );
        assert!(canonicalize_url("not a url").is_none());
        assert!(canonicalize_url("").is_none());
    }

    #[test]
    fn unparseable_url_drops_the_record() {
        let collection = normalize(
            vec![record("Title", "::::", 1), record("Kept", "https://x.test/kept", 1)],
            &config(),
            run_instant(),
        );
        assert_eq!(collection.total, 1);
        assert_eq!(collection.items[0].title, "Kept");
    }

    #[test]
    fn missing_timestamp_becomes_the_run_instant() {
        let mut r = record("Fresh by default", "https://x.test/a", 0);
        r.published_at = None;
        let collection = normalize(vec![r], &config(), run_instant());
        assert_eq!(collection.total, 1);
        assert_eq!(collection.items[0].published_at, run_instant());
    }

    #[test]
    fn freshness_window_includes_recent_and_excludes_stale() {
        let collection = normalize(
            vec![
                record("One hour old", "https://x.test/fresh", 1),
                record("Ten days old", "https://x.test/stale", 240),
            ],
            &config(),
            run_instant(),
        );
        assert_eq!(collection.total, 1);
        assert_eq!(collection.items[0].title, "One hour old");
    }

    #[test]
    fn collection_is_sorted_newest_first() {
        let collection = normalize(
            vec![
                record("Older", "https://x.test/1", 30),
                record("Newest", "https://x.test/2", 1),
                record("Middle", "https://x.test/3", 10),
            ],
            &config(),
            run_instant(),
        );
        let titles: Vec<_> = collection.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["Newest", "Middle", "Older"]);
    }

    #[test]
    fn duplicate_stories_keep_the_newest_copy() {
        let mut newer = record("Same Story", "https://x.test/dup", 1);
        newer.source = "First".to_string();
        let mut older = record("SAME STORY", "https://x.test/dup", 5);
        older.source = "Second".to_string();

        let collection = normalize(vec![older, newer], &config(), run_instant());
        assert_eq!(collection.total, 1);
        assert_eq!(collection.items[0].source, "First");
    }

    #[test]
    fn fragment_only_differences_deduplicate() {
        let collection = normalize(
            vec![
                record("Story", "https://x.test/a#top", 1),
                record("Story", "https://x.test/a", 2),
            ],
            &config(),
            run_instant(),
        );
        assert_eq!(collection.total, 1);
    }

    #[test]
    fn colliding_slugs_get_numeric_suffixes() {
        let collection = normalize(
            vec![
                record("Same Title!", "https://x.test/1", 1),
                record("Same, Title", "https://x.test/2", 2),
                record("Same-Title", "https://x.test/3", 3),
            ],
            &config(),
            run_instant(),
        );
        let slugs: Vec<_> = collection.items.iter().map(|i| i.slug.as_str()).collect();
        assert_eq!(slugs[0], "20260806-same-title");
        assert_eq!(slugs[1], "20260806-same-title-2");
        assert_eq!(slugs[2], "20260806-same-title-3");
    }

    #[test]
    fn slug_day_prefix_comes_from_the_publish_date() {
        let collection = normalize(
            vec![record("Yesterday's Story", "https://x.test/y", 25)],
            &config(),
            run_instant(),
        );
        assert_eq!(collection.items[0].slug, "20260805-yesterdays-story");
        assert_eq!(
            collection.items[0].local_url,
            "/news/20260805-yesterdays-story.html"
        );
    }

    #[test]
    fn unsluggable_title_falls_back_to_news() {
        let collection = normalize(
            vec![record("比特币大涨", "https://x.test/zh", 1)],
            &config(),
            run_instant(),
        );
        assert_eq!(collection.items[0].slug, "20260806-news");
    }

    #[test]
    fn output_is_capped_at_max_items() {
        let records = (0..10)
            .map(|i| record(&format!("Story {i}"), &format!("https://x.test/{i}"), i))
            .collect();
        let capped = AppConfig { max_items: 4, ..AppConfig::default() };
        let collection = normalize(records, &capped, run_instant());
        assert_eq!(collection.total, 4);
        assert_eq!(collection.items.len(), 4);
    }

    #[test]
    fn empty_input_yields_a_valid_empty_collection() {
        let collection = normalize(Vec::new(), &config(), run_instant());
        assert_eq!(collection.total, 0);
        assert!(collection.items.is_empty());
        assert_eq!(collection.generated_at, run_instant());
    }

    #[test]
    fn normalize_is_idempotent_on_its_own_output() {
        let records = vec![
            record("SEC Action Against Exchange", "https://x.test/sec", 2),
            record("Solana Upgrade Ships", "https://x.test/sol", 4),
            record("Quiet Day", "https://x.test/quiet", 6),
        ];
        let first = normalize(records, &config(), run_instant());

        let replayed: Vec<RawRecord> = first
            .items
            .iter()
            .map(|item| RawRecord {
                source: item.source.clone(),
                title: item.title.clone(),
                summary: item.summary.clone(),
                url: item.url.clone(),
                published_at: Some(item.published_at),
                keywords: item.keywords.clone(),
            })
            .collect();
        let second = normalize(replayed, &config(), run_instant());

        let slugs = |c: &NewsCollection| c.items.iter().map(|i| i.slug.clone()).collect::<Vec<_>>();
        let categories =
            |c: &NewsCollection| c.items.iter().map(|i| i.category).collect::<Vec<_>>();
        assert_eq!(slugs(&first), slugs(&second));
        assert_eq!(categories(&first), categories(&second));
        assert_eq!(first.total, second.total);
    }
}
