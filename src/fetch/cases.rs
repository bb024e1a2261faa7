use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use tracing::info;

use crate::config::Config;
use crate::error::PipelineError;
use crate::series::{Category, RawCaseTable};

use super::FetchCache;

/// Header names that can carry the country of a row, depending on feed
/// vintage.
const COUNTRY_HEADERS: &[&str] = &["Country/Region", "Country_Region"];

/// Date labels in the feed header, e.g. `1/22/20`.
const DATE_FORMAT: &str = "%m/%d/%y";

/// Fetch one category's global time-series CSV and reduce it to a
/// [`RawCaseTable`]: sub-national rows summed per country, geographic
/// columns dropped, date index ascending.
pub async fn fetch_cases(
    client: &Client,
    config: &Config,
    cache: Option<&FetchCache>,
    category: Category,
    url: &str,
) -> Result<RawCaseTable, PipelineError> {
    let body = super::fetch_body(client, config, cache, category.name(), url)
        .await
        .map_err(|e| PipelineError::source_unavailable(category.name(), e))?;
    let table = parse_cases_csv(&body)
        .map_err(|e| PipelineError::source_unavailable(category.name(), e))?;
    info!(
        category = category.name(),
        rows = table.num_rows(),
        countries = table.countries().count(),
        "parsed case table"
    );
    Ok(table)
}

/// Parse the feed body. Every column whose header parses as a date is a
/// data column; everything else (province, Lat, Long) only matters for
/// picking the country of a row.
pub fn parse_cases_csv(body: &str) -> Result<RawCaseTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(false)
        .from_reader(body.as_bytes());

    let headers = reader.headers().context("reading CSV header")?.clone();
    let country_idx = headers
        .iter()
        .position(|h| COUNTRY_HEADERS.contains(&h))
        .context("no country column in CSV header")?;

    let date_columns: Vec<(usize, NaiveDate)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| {
            NaiveDate::parse_from_str(h.trim(), DATE_FORMAT)
                .ok()
                .map(|d| (i, d))
        })
        .collect();
    if date_columns.is_empty() {
        bail!("no date-labeled columns in CSV header");
    }

    let dates: Vec<NaiveDate> = date_columns.iter().map(|&(_, d)| d).collect();
    let mut columns: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading CSV record {}", line + 1))?;
        let country = record
            .get(country_idx)
            .with_context(|| format!("record {} has no country field", line + 1))?
            .trim()
            .to_string();
        if country.is_empty() {
            bail!("record {} has an empty country name", line + 1);
        }

        let column = columns
            .entry(country)
            .or_insert_with(|| vec![0.0; dates.len()]);
        for (slot, &(idx, date)) in column.iter_mut().zip(&date_columns) {
            let cell = record.get(idx).unwrap_or("").trim();
            // Empty cells show up in fresh columns; count them as zero.
            let value = if cell.is_empty() {
                0.0
            } else {
                cell.parse::<f64>()
                    .with_context(|| format!("bad count `{}` for {}", cell, date))?
            };
            *slot += value;
        }
    }

    if columns.is_empty() {
        bail!("CSV contains no data rows");
    }

    RawCaseTable::new(dates, columns).map_err(Into::into)
}
