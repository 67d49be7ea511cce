//! Command-line interface definitions.

use clap::Parser;

/// Command-line arguments for one pipeline run.
///
/// # Examples
///
/// ```sh
/// # Defaults: built-in sources, artifacts under ./public
/// chain_news_radar
///
/// # Custom output directory and config file
/// chain_news_radar -o ./site -c ./radar.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output directory for generated artifacts (news.json, news/, feed.xml,
    /// sitemap.xml, robots.txt)
    #[arg(short, long, default_value = "public")]
    pub output_dir: String,

    /// Optional YAML config file overriding sources and thresholds
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the canonical site URL used in generated artifacts
    #[arg(long, env = "SITE_URL")]
    pub site_url: Option<String>,
}
