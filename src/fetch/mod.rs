pub mod cache;
pub mod cases;
pub mod http;
pub mod population;

pub use cache::FetchCache;

use anyhow::Result;
use chrono::Utc;
use reqwest::Client;
use tracing::info;

use crate::config::Config;

/// Fetch one source body, going through the day cache when one is
/// configured.
pub(crate) async fn fetch_body(
    client: &Client,
    config: &Config,
    cache: Option<&FetchCache>,
    source_name: &str,
    url: &str,
) -> Result<String> {
    let today = Utc::now().date_naive();
    if let Some(cache) = cache {
        if let Some(body) = cache.load(source_name, today) {
            info!(source = source_name, "using cached body");
            return Ok(body);
        }
    }

    let body = http::get_text_with_retry(client, url, config).await?;
    if let Some(cache) = cache {
        cache.store(source_name, today, &body)?;
    }
    Ok(body)
}
