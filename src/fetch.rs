//! Feed endpoint fetching with per-source candidate fallback.
//!
//! Each logical source lists one or more candidate URLs tried strictly in
//! order. A candidate fails on any transport error, timeout, or non-2xx
//! status; the next candidate is tried immediately, with no retry of an
//! individual candidate. The per-request timeout cancels the in-flight
//! request and nothing else.

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::Client;
use std::error::Error;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::config::AppConfig;

const FEED_ACCEPT: &str =
    "application/rss+xml, application/atom+xml, application/xml, text/xml, text/html;q=0.8";

/// Every candidate endpoint for a source failed; carries one `(url, reason)`
/// entry per attempt.
#[derive(Debug)]
pub struct FetchFailure {
    pub attempts: Vec<(String, String)>,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attempts.is_empty() {
            return write!(f, "no candidate urls configured");
        }
        let detail = self
            .attempts
            .iter()
            .map(|(url, reason)| format!("{url}: {reason}"))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "all {} candidates failed ({detail})", self.attempts.len())
    }
}

impl Error for FetchFailure {}

/// Build the shared HTTP client used for every feed request.
///
/// The timeout covers the whole request and cancels it on expiry. Redirects
/// are followed; the user agent identifies the bot and points back at the
/// site's own feed.
pub fn build_client(config: &AppConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(FEED_ACCEPT));
    Client::builder()
        .timeout(Duration::from_secs(config.source_timeout_secs))
        .user_agent(config.user_agent())
        .default_headers(headers)
        .redirect(Policy::limited(10))
        .build()
}

async fn fetch_text(client: &Client, url: &str) -> Result<String, String> {
    let response = client.get(url).send().await.map_err(|e| e.to_string())?;
    let status = response.status();
    if !status.is_success() {
        return Err(format!("HTTP {status}"));
    }
    response.text().await.map_err(|e| e.to_string())
}

/// Try each candidate URL in order; return the first successful body
/// together with the URL that produced it.
#[instrument(level = "debug", skip_all, fields(candidates = urls.len()))]
pub async fn fetch_first_available(
    client: &Client,
    urls: &[String],
) -> Result<(String, String), FetchFailure> {
    let mut attempts = Vec::new();
    for url in urls {
        match fetch_text(client, url).await {
            Ok(body) => return Ok((body, url.clone())),
            Err(reason) => {
                debug!(%url, %reason, "candidate endpoint failed");
                attempts.push((url.clone(), reason));
            }
        }
    }
    Err(FetchFailure { attempts })
}
