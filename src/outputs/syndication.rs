//! The site's own RSS 2.0 document.

use std::error::Error;
use std::fmt::Write as _;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

use crate::models::NewsCollection;
use crate::utils::escape_xml;

pub const FEED_FILE: &str = "feed.xml";

/// Only the newest slice of the collection goes into the feed.
const FEED_ITEM_LIMIT: usize = 60;

/// Render the RSS document for the newest items.
pub fn render_feed(collection: &NewsCollection, site_url: &str) -> String {
    let mut items = String::new();
    for item in collection.items.iter().take(FEED_ITEM_LIMIT) {
        let link = format!("{site_url}{}", item.local_url);
        writeln!(
            items,
            r#"    <item>
      <title>{title}</title>
      <link>{link}</link>
      <guid isPermaLink="true">{link}</guid>
      <description>{description}</description>
      <pubDate>{pub_date}</pubDate>
      <category>{category}</category>
      <source url="{source_url}">{source}</source>
    </item>"#,
            title = escape_xml(&item.title),
            link = escape_xml(&link),
            description = escape_xml(&item.summary),
            pub_date = item.published_at.to_rfc2822(),
            category = escape_xml(item.category.label()),
            source_url = escape_xml(&item.url),
            source = escape_xml(&item.source),
        )
        .unwrap();
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Chain Radar — Blockchain News</title>
    <link>{site_url}/</link>
    <description>Continuously refreshed blockchain news aggregated from primary sources</description>
    <language>en-us</language>
    <lastBuildDate>{build_date}</lastBuildDate>
{items}  </channel>
</rss>
"#,
        site_url = escape_xml(site_url),
        build_date = collection.generated_at.to_rfc2822(),
        items = items,
    )
}

/// Write `<output_dir>/feed.xml`.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
pub async fn write_feed(
    collection: &NewsCollection,
    output_dir: &str,
    site_url: &str,
) -> Result<(), Box<dyn Error>> {
    let path = Path::new(output_dir).join(FEED_FILE);
    fs::create_dir_all(output_dir).await?;
    fs::write(&path, render_feed(collection, site_url)).await?;
    info!(path = %path.display(), "wrote syndication document");
    Ok(())
}
