//! Per-item HTML detail documents.
//!
//! Every item gets a small static page at its `local_url`, carrying the
//! canonical link, OpenGraph metadata and a NewsArticle JSON-LD block so
//! crawlers can index each story individually. The `news/` directory is
//! replaced wholesale each run; stale pages from dropped items never
//! linger.

use std::error::Error;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

use crate::models::{NewsCollection, NewsItem};
use crate::utils::escape_html;

fn source_host(item: &NewsItem) -> String {
    Url::parse(&item.url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| item.source.clone())
}

/// Render one item's detail document.
pub fn render_item_page(item: &NewsItem, site_url: &str) -> String {
    let canonical = format!("{site_url}{}", item.local_url);
    let schema_value = serde_json::json!({
        "@context": "https://schema.org",
        "@type": "NewsArticle",
        "headline": item.title,
        "datePublished": item.published_at.to_rfc3339(),
        "dateModified": item.published_at.to_rfc3339(),
        "articleSection": item.category.label(),
        "mainEntityOfPage": canonical,
        "isBasedOn": item.url,
        "description": item.summary,
    });
    // keep item text from closing the script element early
    let schema = schema_value.to_string().replace('<', "\\u003c");

    format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>{title} | Chain Radar</title>
    <meta name="description" content="{summary}" />
    <meta name="robots" content="index,follow" />
    <link rel="canonical" href="{canonical}" />
    <meta property="og:type" content="article" />
    <meta property="og:title" content="{title}" />
    <meta property="og:description" content="{summary}" />
    <meta property="og:url" content="{canonical}" />
    <meta property="article:published_time" content="{published}" />
    <meta property="article:section" content="{category}" />
    <script type="application/ld+json">{schema}</script>
  </head>
  <body data-category="{category_code}">
    <main>
      <p class="meta">{category} · {source} · {published}</p>
      <h1>{title}</h1>
      <p>{summary}</p>
      <p class="origin">Source: {host}</p>
      <p class="links">
        <a href="{url}" target="_blank" rel="noopener noreferrer">Read the original story</a>
        <a href="/">Back to Chain Radar</a>
      </p>
    </main>
  </body>
</html>
"#,
        title = escape_html(&item.title),
        summary = escape_html(&item.summary),
        canonical = escape_html(&canonical),
        published = escape_html(&item.published_at.to_rfc3339()),
        category = escape_html(item.category.label()),
        category_code = item.category.code(),
        source = escape_html(&item.source),
        host = escape_html(&source_host(item)),
        url = escape_html(&item.url),
        schema = schema,
    )
}

/// Replace `<output_dir>/news/` with one detail document per item.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir, count = collection.items.len()))]
pub async fn write_item_pages(
    collection: &NewsCollection,
    output_dir: &str,
    site_url: &str,
) -> Result<(), Box<dyn Error>> {
    let news_dir = Path::new(output_dir).join("news");
    match fs::remove_dir_all(&news_dir).await {
        Ok(()) => {}
        Err(error) if error.kind() == ErrorKind::NotFound => {}
        Err(error) => return Err(error.into()),
    }
    fs::create_dir_all(&news_dir).await?;

    for item in &collection.items {
        let path = news_dir.join(format!("{}.html", item.slug));
        fs::write(&path, render_item_page(item, site_url)).await?;
    }

    info!(count = collection.items.len(), dir = %news_dir.display(), "wrote item detail pages");
    Ok(())
}
