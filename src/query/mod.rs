use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{PipelineError, Result};
use crate::series::{Category, DatasetRegistry, Evaluation};

/// An ordered slice of one country's values, ascending by date. Numeric
/// categories yield numbers with `None` holes; the `time` category yields
/// the dates themselves so either axis can carry it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SeriesData {
    Numbers(Vec<Option<f64>>),
    Dates(Vec<NaiveDate>),
}

impl SeriesData {
    pub fn len(&self) -> usize {
        match self {
            SeriesData::Numbers(v) => v.len(),
            SeriesData::Dates(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Half-open index range into the shared date index. Out-of-range ends are
/// clamped to the table bounds rather than rejected, matching slice
/// semantics; signed ends let a caller pass through raw UI slider values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: i64,
    pub end: i64,
}

impl DateRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// The whole date index.
    pub fn full() -> Self {
        Self {
            start: 0,
            end: i64::MAX,
        }
    }

    fn clamp(&self, len: usize) -> (usize, usize) {
        let start = self.start.clamp(0, len as i64) as usize;
        let end = self.end.clamp(start as i64, len as i64) as usize;
        (start, end)
    }
}

/// Look up one country's series for an axis selection, slice it to the
/// clamped range and apply the trailing moving average. Averaging is
/// skipped entirely for the `time` category.
pub fn get_series(
    registry: &DatasetRegistry,
    category: Category,
    evaluation: Evaluation,
    country: &str,
    range: DateRange,
    averaging_days: usize,
) -> Result<SeriesData> {
    let dates = registry.dates();
    let (start, end) = range.clamp(dates.len());

    if category == Category::Time {
        // The time table is the same date column under every country.
        if !registry.contains_country(country) {
            return Err(PipelineError::UnknownCountry(country.to_string()));
        }
        return Ok(SeriesData::Dates(dates[start..end].to_vec()));
    }

    let view = registry
        .view(category, evaluation)
        .ok_or_else(|| PipelineError::UnknownSelector(category.to_string()))?;
    let column = view
        .table
        .column(country)
        .ok_or_else(|| PipelineError::UnknownCountry(country.to_string()))?;

    let window = moving_average(&column[start..end], averaging_days);
    Ok(SeriesData::Numbers(window))
}

/// String-keyed variant for the UI collaborator; selector names that are
/// not registry keys come back as `UnknownSelector`.
pub fn get_series_by_name(
    registry: &DatasetRegistry,
    dataset_name: &str,
    evaluation_name: &str,
    country: &str,
    range: DateRange,
    averaging_days: usize,
) -> Result<SeriesData> {
    let category: Category = dataset_name.parse()?;
    let evaluation: Evaluation = evaluation_name.parse()?;
    get_series(registry, category, evaluation, country, range, averaging_days)
}

/// Trailing moving average over a window of `w` values ending at each
/// position. Positions with fewer than `w` values so far are undefined, as
/// is any window containing an undefined value. `w <= 1` is a no-op.
pub fn moving_average(values: &[Option<f64>], w: usize) -> Vec<Option<f64>> {
    if w <= 1 {
        return values.to_vec();
    }
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i + 1 < w {
                return None;
            }
            let window = &values[i + 1 - w..=i];
            let mut sum = 0.0;
            for v in window {
                sum += (*v)?;
            }
            Some(sum / w as f64)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::RawCaseTable;
    use std::collections::{BTreeMap, HashMap};

    fn registry(values: &[f64]) -> DatasetRegistry {
        let dates: Vec<NaiveDate> = (0..values.len() as i64)
            .map(|i| NaiveDate::from_ymd_opt(2020, 3, 1).unwrap() + chrono::Days::new(i as u64))
            .collect();
        let table = |vals: &[f64]| {
            let mut columns = BTreeMap::new();
            columns.insert("Italy".to_string(), vals.to_vec());
            RawCaseTable::new(dates.clone(), columns).unwrap()
        };
        let zeros = vec![0.0; values.len()];
        DatasetRegistry::from_tables(
            table(values),
            table(&zeros),
            table(&zeros),
            &HashMap::new(),
        )
        .unwrap()
    }

    #[test]
    fn window_of_one_is_a_no_op() {
        let input = vec![Some(10.0), None, Some(30.0)];
        assert_eq!(moving_average(&input, 1), input);
        assert_eq!(moving_average(&input, 0), input);
    }

    #[test]
    fn window_produces_leading_undefined_then_trailing_means() {
        let input = vec![Some(10.0), Some(20.0), Some(30.0), Some(40.0)];
        assert_eq!(
            moving_average(&input, 2),
            vec![None, Some(15.0), Some(25.0), Some(35.0)]
        );
        assert_eq!(
            moving_average(&input, 4),
            vec![None, None, None, Some(25.0)]
        );
    }

    #[test]
    fn undefined_input_poisons_its_windows() {
        let input = vec![None, Some(20.0), Some(30.0)];
        assert_eq!(moving_average(&input, 2), vec![None, None, Some(25.0)]);
    }

    #[test]
    fn out_of_range_indices_clamp_to_bounds() {
        let reg = registry(&[1.0, 2.0, 3.0]);
        let series = get_series(
            &reg,
            Category::Confirmed,
            Evaluation::Cumulative,
            "Italy",
            DateRange::new(-5, 10_000),
            1,
        )
        .unwrap();
        assert_eq!(
            series,
            SeriesData::Numbers(vec![Some(1.0), Some(2.0), Some(3.0)])
        );
    }

    #[test]
    fn range_slices_before_averaging() {
        let reg = registry(&[1.0, 2.0, 4.0, 8.0]);
        let series = get_series(
            &reg,
            Category::Confirmed,
            Evaluation::Cumulative,
            "Italy",
            DateRange::new(2, 4),
            2,
        )
        .unwrap();
        // The window restarts at the slice: first sliced position undefined.
        assert_eq!(series, SeriesData::Numbers(vec![None, Some(6.0)]));
    }

    #[test]
    fn time_axis_returns_dates_and_ignores_averaging() {
        let reg = registry(&[1.0, 2.0, 3.0]);
        let series = get_series(
            &reg,
            Category::Time,
            Evaluation::GrowthRate,
            "Italy",
            DateRange::new(1, 3),
            7,
        )
        .unwrap();
        match series {
            SeriesData::Dates(dates) => {
                assert_eq!(dates.len(), 2);
                assert_eq!(dates[0], NaiveDate::from_ymd_opt(2020, 3, 2).unwrap());
            }
            other => panic!("expected dates, got {:?}", other),
        }
    }

    #[test]
    fn unknown_country_is_reported_not_fatal() {
        let reg = registry(&[1.0]);
        let err = get_series(
            &reg,
            Category::Confirmed,
            Evaluation::Cumulative,
            "Narnia",
            DateRange::full(),
            1,
        );
        assert!(matches!(err, Err(PipelineError::UnknownCountry(_))));
    }

    #[test]
    fn string_selectors_are_validated() {
        let reg = registry(&[1.0]);
        let err = get_series_by_name(&reg, "casez", "cumulative", "Italy", DateRange::full(), 1);
        assert!(matches!(err, Err(PipelineError::UnknownSelector(_))));
        let ok = get_series_by_name(
            &reg,
            "confirmed",
            "cumulative",
            "Italy",
            DateRange::full(),
            1,
        );
        assert!(ok.is_ok());
    }
}
