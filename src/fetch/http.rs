use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::time::sleep;
use tracing::{debug, error, warn};
use url::Url;

use crate::config::Config;

/// Build the shared client with the configured request timeout.
pub fn build_client(config: &Config) -> Result<Client> {
    Client::builder()
        .timeout(config.request_timeout)
        .gzip(true)
        .build()
        .context("building HTTP client")
}

async fn get_text_core(client: &Client, url: &Url) -> Result<String> {
    debug!(%url, "fetching");
    Ok(client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?
        .error_for_status()
        .with_context(|| format!("Non-success status from {}", url))?
        .text()
        .await
        .with_context(|| format!("Reading body from {}", url))?)
}

/// GET a URL's body with bounded retries and exponential backoff. Both
/// upstream fetch points are transient-failure-prone, so every network read
/// goes through here.
pub async fn get_text_with_retry(client: &Client, url_str: &str, config: &Config) -> Result<String> {
    let url = Url::parse(url_str).with_context(|| format!("invalid source URL `{url_str}`"))?;
    let mut attempts = 0;
    loop {
        match get_text_core(client, &url).await {
            Ok(body) => return Ok(body),
            Err(e) if attempts < config.max_retries => {
                attempts += 1;
                let backoff = config.initial_backoff_ms * 2u64.pow(attempts - 1);
                warn!(%url, attempt = attempts, delay_ms = backoff, error = %e, "retrying");
                sleep(Duration::from_millis(backoff)).await;
            }
            Err(e) => {
                error!(%url, error = %e, "exhausted retries");
                return Err(e);
            }
        }
    }
}
