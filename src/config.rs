//! Run configuration: the source list and every pipeline threshold.
//!
//! The whole pipeline reads from one immutable [`AppConfig`] passed by
//! reference, so tests can substitute mock endpoints and shortened windows
//! without touching global state. Defaults are compiled in; a YAML file can
//! override any subset of fields.

use serde::{Deserialize, Serialize};
use std::error::Error;
use tracing::info;

/// A logical feed provider with one or more candidate endpoint URLs, tried
/// in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub urls: Vec<String>,
}

/// Immutable configuration for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Canonical site URL used in generated artifacts and the client UA.
    pub site_url: String,
    /// Maximum items in the published collection.
    pub max_items: usize,
    /// Per-source record cap, so one noisy feed cannot dominate.
    pub max_per_source: usize,
    /// Freshness window in days, measured back from the run instant.
    pub lookback_days: i64,
    /// Per-request timeout; a timed-out request is cancelled, not retried.
    pub source_timeout_secs: u64,
    /// How many source fetches may be in flight at once.
    pub fetch_parallelism: usize,
    pub sources: Vec<SourceConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            site_url: "https://www.chainradar.news".to_string(),
            max_items: 90,
            max_per_source: 20,
            lookback_days: 4,
            source_timeout_secs: 18,
            fetch_parallelism: 4,
            sources: default_sources(),
        }
    }
}

impl AppConfig {
    /// Descriptive client identifier sent with every feed request.
    pub fn user_agent(&self) -> String {
        format!(
            "Mozilla/5.0 (compatible; ChainRadarBot/1.0; +{}/feed.xml)",
            self.site_url
        )
    }
}

fn source(name: &str, urls: &[&str]) -> SourceConfig {
    SourceConfig {
        name: name.to_string(),
        urls: urls.iter().map(|u| u.to_string()).collect(),
    }
}

fn default_sources() -> Vec<SourceConfig> {
    let social_query =
        urlencoding::encode("site:x.com (bitcoin OR ethereum OR crypto OR blockchain) when:3d");
    vec![
        source("CoinDesk", &["https://www.coindesk.com/arc/outboundfeeds/rss/"]),
        source("Cointelegraph", &["https://cointelegraph.com/rss"]),
        source("Decrypt", &["https://decrypt.co/feed"]),
        source("Ethereum Blog", &["https://blog.ethereum.org/feed.xml"]),
        source(
            "Solana Blog",
            &[
                "https://solana.com/news/rss.xml",
                "https://solana.com/news/feed.xml",
            ],
        ),
        source("Chainalysis Blog", &["https://www.chainalysis.com/blog/feed/"]),
        SourceConfig {
            name: "X Wire".to_string(),
            urls: vec![format!(
                "https://news.google.com/rss/search?q={social_query}&hl=en-US&gl=US&ceid=US:en"
            )],
        },
    ]
}

/// Load configuration from an optional YAML file.
///
/// With no path, the compiled-in defaults apply. A file only needs to name
/// the fields it overrides.
pub fn load(path: Option<&str>) -> Result<AppConfig, Box<dyn Error>> {
    match path {
        Some(p) => {
            let raw = std::fs::read_to_string(p)?;
            let config: AppConfig = serde_yaml::from_str(&raw)?;
            info!(path = p, sources = config.sources.len(), "loaded configuration file");
            Ok(config)
        }
        None => Ok(AppConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_published_thresholds() {
        let config = AppConfig::default();
        assert_eq!(config.max_items, 90);
        assert_eq!(config.max_per_source, 20);
        assert_eq!(config.lookback_days, 4);
        assert_eq!(config.source_timeout_secs, 18);
        assert_eq!(config.sources.len(), 7);
    }

    #[test]
    fn default_sources_have_candidate_urls() {
        let config = AppConfig::default();
        assert!(config.sources.iter().all(|s| !s.urls.is_empty()));
        let solana = config.sources.iter().find(|s| s.name == "Solana Blog").unwrap();
        assert_eq!(solana.urls.len(), 2);
    }

    #[test]
    fn social_wire_query_is_percent_encoded() {
        let config = AppConfig::default();
        let wire = config.sources.iter().find(|s| s.name == "X Wire").unwrap();
        assert!(wire.urls[0].contains("site%3Ax.com"));
        assert!(!wire.urls[0].contains(' '));
    }

    #[test]
    fn yaml_overrides_only_named_fields() {
        let yaml = "max_items: 10\nlookback_days: 1\n";
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.max_items, 10);
        assert_eq!(config.lookback_days, 1);
        // untouched fields keep their defaults
        assert_eq!(config.max_per_source, 20);
        assert_eq!(config.sources.len(), 7);
    }

    #[test]
    fn yaml_can_replace_the_source_list() {
        let yaml = r#"
sources:
  - name: Fixture
    urls: ["http://127.0.0.1:1/feed"]
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].name, "Fixture");
    }

    #[test]
    fn user_agent_points_at_the_site_feed() {
        let config = AppConfig::default();
        assert!(config.user_agent().contains("ChainRadarBot/1.0"));
        assert!(config.user_agent().contains(&config.site_url));
    }
}
