use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{PipelineError, Result};

use super::table::{RawCaseTable, SeriesTable};
use super::Evaluation;

/// Derive all five evaluation views for one category.
///
/// Countries absent from the population map get an all-zero series in both
/// normalized views instead of an error; everyone has the unnormalized
/// views. `None` marks positions with no defined value (no prior day, or a
/// zero denominator in the growth rate).
pub fn derive_views(
    raw: &RawCaseTable,
    dates: &Arc<Vec<NaiveDate>>,
    population: &HashMap<String, u64>,
) -> HashMap<Evaluation, SeriesTable> {
    let mut cumulative = BTreeMap::new();
    let mut cumulative_norm = BTreeMap::new();
    let mut daily = BTreeMap::new();
    let mut daily_norm = BTreeMap::new();
    let mut growth = BTreeMap::new();

    let mut unmatched = 0usize;
    for (country, values) in raw.columns() {
        cumulative.insert(country.clone(), values.iter().map(|&v| Some(v)).collect());
        daily.insert(country.clone(), diff(values));
        growth.insert(country.clone(), growth_rate(values));

        match population.get(&country.to_lowercase()) {
            Some(&pop) if pop > 0 => {
                let scale = pop as f64 / 100.0;
                let normalized: Vec<f64> = values.iter().map(|v| v / scale).collect();
                cumulative_norm.insert(
                    country.clone(),
                    normalized.iter().map(|&v| Some(v)).collect(),
                );
                daily_norm.insert(country.clone(), diff(&normalized));
            }
            _ => {
                unmatched += 1;
                cumulative_norm.insert(country.clone(), vec![Some(0.0); values.len()]);
                daily_norm.insert(country.clone(), vec![Some(0.0); values.len()]);
            }
        }
    }
    if unmatched > 0 {
        debug!(unmatched, "countries without population entry, zeroed normalized views");
    }

    let mut views = HashMap::new();
    views.insert(
        Evaluation::Cumulative,
        SeriesTable::new(Arc::clone(dates), cumulative),
    );
    views.insert(
        Evaluation::CumulativeNormalized,
        SeriesTable::new(Arc::clone(dates), cumulative_norm),
    );
    views.insert(
        Evaluation::DailyNew,
        SeriesTable::new(Arc::clone(dates), daily),
    );
    views.insert(
        Evaluation::DailyNewNormalized,
        SeriesTable::new(Arc::clone(dates), daily_norm),
    );
    views.insert(
        Evaluation::GrowthRate,
        SeriesTable::new(Arc::clone(dates), growth),
    );
    views
}

/// Synthesize the `infected` views: `confirmed - deaths - recovered`,
/// element-wise per evaluation kind. A position is `None` whenever any
/// operand is. The three categories must share one shape; a country the
/// other operands lack, or a ragged column, is a `ShapeMismatch`.
pub fn derive_infected(
    dates: &Arc<Vec<NaiveDate>>,
    confirmed: &HashMap<Evaluation, SeriesTable>,
    recovered: &HashMap<Evaluation, SeriesTable>,
    deaths: &HashMap<Evaluation, SeriesTable>,
) -> Result<HashMap<Evaluation, SeriesTable>> {
    let mut views = HashMap::new();
    for eval in Evaluation::ALL {
        let c = &confirmed[&eval];
        let r = &recovered[&eval];
        let d = &deaths[&eval];

        let mut columns = BTreeMap::new();
        for (country, c_vals) in c.columns() {
            let r_vals = operand_column(r, country, c_vals.len(), "recovered")?;
            let d_vals = operand_column(d, country, c_vals.len(), "deaths")?;
            let values = c_vals
                .iter()
                .zip(r_vals)
                .zip(d_vals)
                .map(|((c, r), d)| match (c, r, d) {
                    (Some(c), Some(r), Some(d)) => Some(c - d - r),
                    _ => None,
                })
                .collect();
            columns.insert(country.clone(), values);
        }

        views.insert(eval, SeriesTable::new(Arc::clone(dates), columns));
    }
    Ok(views)
}

fn operand_column<'a>(
    table: &'a SeriesTable,
    country: &str,
    expected_len: usize,
    operand: &str,
) -> Result<&'a [Option<f64>]> {
    let column = table.column(country).ok_or_else(|| {
        PipelineError::ShapeMismatch(format!("`{operand}` has no column `{country}`"))
    })?;
    if column.len() != expected_len {
        return Err(PipelineError::ShapeMismatch(format!(
            "`{operand}` column `{country}` has {} rows, expected {expected_len}",
            column.len()
        )));
    }
    Ok(column)
}

/// First-order difference; the first position has no prior day.
fn diff(values: &[f64]) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| if i == 0 { None } else { Some(v - values[i - 1]) })
        .collect()
}

/// Day-over-day percentage change; undefined on the first row and wherever
/// the previous value is zero.
fn growth_rate(values: &[f64]) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            if i == 0 {
                return None;
            }
            let prev = values[i - 1];
            if prev == 0.0 {
                None
            } else {
                Some((v - prev) / prev * 100.0)
            }
        })
        .collect()
}
