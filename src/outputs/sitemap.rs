//! Sitemap and crawler policy documents.

use std::error::Error;
use std::fmt::Write as _;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

use crate::models::NewsCollection;
use crate::utils::escape_xml;

pub const SITEMAP_FILE: &str = "sitemap.xml";
pub const ROBOTS_FILE: &str = "robots.txt";

struct SitemapEntry {
    loc: String,
    lastmod: String,
    changefreq: &'static str,
    priority: &'static str,
}

/// Render the sitemap: the home page, the feed, and every item detail page.
pub fn render_sitemap(collection: &NewsCollection, site_url: &str) -> String {
    let generated = collection.generated_at.to_rfc3339();
    let mut entries = vec![
        SitemapEntry {
            loc: format!("{site_url}/"),
            lastmod: generated.clone(),
            changefreq: "hourly",
            priority: "1.0",
        },
        SitemapEntry {
            loc: format!("{site_url}/feed.xml"),
            lastmod: generated,
            changefreq: "hourly",
            priority: "0.5",
        },
    ];
    for item in &collection.items {
        entries.push(SitemapEntry {
            loc: format!("{site_url}{}", item.local_url),
            lastmod: item.published_at.to_rfc3339(),
            changefreq: "daily",
            priority: "0.7",
        });
    }

    let mut body = String::new();
    for entry in entries {
        writeln!(
            body,
            r#"  <url>
    <loc>{loc}</loc>
    <lastmod>{lastmod}</lastmod>
    <changefreq>{changefreq}</changefreq>
    <priority>{priority}</priority>
  </url>"#,
            loc = escape_xml(&entry.loc),
            lastmod = escape_xml(&entry.lastmod),
            changefreq = entry.changefreq,
            priority = entry.priority,
        )
        .unwrap();
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{body}</urlset>\n"
    )
}

/// Render the crawler policy pointing at the sitemap.
pub fn render_robots(site_url: &str) -> String {
    format!("User-agent: *\nAllow: /\nSitemap: {site_url}/sitemap.xml\n")
}

/// Write `<output_dir>/sitemap.xml`.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
pub async fn write_sitemap(
    collection: &NewsCollection,
    output_dir: &str,
    site_url: &str,
) -> Result<(), Box<dyn Error>> {
    let path = Path::new(output_dir).join(SITEMAP_FILE);
    fs::create_dir_all(output_dir).await?;
    fs::write(&path, render_sitemap(collection, site_url)).await?;
    info!(path = %path.display(), urls = collection.items.len() + 2, "wrote sitemap");
    Ok(())
}

/// Write `<output_dir>/robots.txt`.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
pub async fn write_robots(output_dir: &str, site_url: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(output_dir).join(ROBOTS_FILE);
    fs::create_dir_all(output_dir).await?;
    fs::write(&path, render_robots(site_url)).await?;
    info!(path = %path.display(), "wrote robots policy");
    Ok(())
}
