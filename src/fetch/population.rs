use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::config::Config;
use crate::error::PipelineError;

use super::FetchCache;

const SOURCE_NAME: &str = "population";

#[derive(Debug, Deserialize)]
struct CountryRecord {
    name: String,
    #[serde(default)]
    population: u64,
}

/// Fetch the country-metadata feed and project it to
/// `lowercase name -> population`.
///
/// Failure is fatal for normalization only; the registry builder degrades
/// to an empty map (all-zero normalized views) instead of aborting.
pub async fn load_population(
    client: &Client,
    config: &Config,
    cache: Option<&FetchCache>,
) -> Result<HashMap<String, u64>, PipelineError> {
    let body = super::fetch_body(client, config, cache, SOURCE_NAME, &config.population_url)
        .await
        .map_err(|e| PipelineError::source_unavailable(SOURCE_NAME, e))?;
    let map = parse_population(&body)
        .map_err(|e| PipelineError::source_unavailable(SOURCE_NAME, e))?;
    info!(countries = map.len(), "loaded population map");
    Ok(map)
}

pub fn parse_population(body: &str) -> Result<HashMap<String, u64>> {
    let records: Vec<CountryRecord> =
        serde_json::from_str(body).context("parsing country metadata JSON")?;
    if records.is_empty() {
        bail!("country metadata feed is empty");
    }
    Ok(records
        .into_iter()
        .map(|r| (r.name.to_lowercase(), r.population))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projects_to_lowercase_name_population_pairs() {
        let body = r#"[
            {"name": "Italy", "population": 60483973, "region": "Europe"},
            {"name": "United States of America", "population": 323947000}
        ]"#;
        let map = parse_population(body).unwrap();
        assert_eq!(map["italy"], 60483973);
        assert_eq!(map["united states of america"], 323947000);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(parse_population("<html>maintenance</html>").is_err());
        assert!(parse_population("[]").is_err());
    }
}
