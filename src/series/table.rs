use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::{PipelineError, Result};

use super::{US_CANONICAL, US_SHORT, WORLD};

/// One category's raw cumulative counts: an ascending date index plus one
/// column per country. Values are passed through as reported; the source
/// occasionally issues corrections that make a column dip, and no
/// monotonicity is enforced.
#[derive(Debug, Clone)]
pub struct RawCaseTable {
    dates: Vec<NaiveDate>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl RawCaseTable {
    /// Build a table from parsed rows. Every column must have one value per
    /// date. The date index is sorted ascending as a safety net (the feed is
    /// already sorted in practice), reordering every column alongside it.
    pub fn new(dates: Vec<NaiveDate>, columns: BTreeMap<String, Vec<f64>>) -> Result<Self> {
        for (country, values) in &columns {
            if values.len() != dates.len() {
                return Err(PipelineError::ShapeMismatch(format!(
                    "column `{}` has {} values for {} dates",
                    country,
                    values.len(),
                    dates.len()
                )));
            }
        }

        let mut order: Vec<usize> = (0..dates.len()).collect();
        order.sort_by_key(|&i| dates[i]);
        let sorted_dates: Vec<NaiveDate> = order.iter().map(|&i| dates[i]).collect();
        let sorted_columns = columns
            .into_iter()
            .map(|(country, values)| {
                let sorted: Vec<f64> = order.iter().map(|&i| values[i]).collect();
                (country, sorted)
            })
            .collect();

        Ok(Self {
            dates: sorted_dates,
            columns: sorted_columns,
        })
    }

    /// Rename the feed's short `US` column to the canonical long form so
    /// population lookups find it. No-op when the column is absent.
    pub fn canonicalize_us(&mut self) {
        if let Some(values) = self.columns.remove(US_SHORT) {
            self.columns.insert(US_CANONICAL.to_string(), values);
        }
    }

    /// Append the synthetic `World` column as the row-wise sum over all real
    /// countries. Replaces any existing `World` column.
    pub fn append_world(&mut self) {
        self.columns.remove(WORLD);
        let mut world = vec![0.0; self.dates.len()];
        for values in self.columns.values() {
            for (acc, v) in world.iter_mut().zip(values) {
                *acc += v;
            }
        }
        self.columns.insert(WORLD.to_string(), world);
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn column(&self, country: &str) -> Option<&[f64]> {
        self.columns.get(country).map(Vec::as_slice)
    }

    pub fn columns(&self) -> &BTreeMap<String, Vec<f64>> {
        &self.columns
    }

    pub fn num_rows(&self) -> usize {
        self.dates.len()
    }

    /// Verify this table and `other` share the exact same date index and
    /// country set, the precondition for element-wise combination.
    pub fn check_same_shape(&self, other: &RawCaseTable) -> Result<()> {
        if self.dates != other.dates {
            return Err(PipelineError::ShapeMismatch(format!(
                "date indexes differ ({} vs {} rows)",
                self.dates.len(),
                other.dates.len()
            )));
        }
        if !self.columns.keys().eq(other.columns.keys()) {
            let only_left: Vec<&String> = self
                .columns
                .keys()
                .filter(|k| !other.columns.contains_key(*k))
                .collect();
            let only_right: Vec<&String> = other
                .columns
                .keys()
                .filter(|k| !self.columns.contains_key(*k))
                .collect();
            return Err(PipelineError::ShapeMismatch(format!(
                "country columns differ (only left: {:?}, only right: {:?})",
                only_left, only_right
            )));
        }
        Ok(())
    }
}

/// A derived view's data: the shared ascending date index plus one
/// `Option<f64>` column per country. `None` is the single missing-value
/// sentinel (no prior day, zero denominator).
#[derive(Debug, Clone)]
pub struct SeriesTable {
    dates: Arc<Vec<NaiveDate>>,
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl SeriesTable {
    pub fn new(dates: Arc<Vec<NaiveDate>>, columns: BTreeMap<String, Vec<Option<f64>>>) -> Self {
        Self { dates, columns }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn column(&self, country: &str) -> Option<&[Option<f64>]> {
        self.columns.get(country).map(Vec::as_slice)
    }

    pub fn columns(&self) -> &BTreeMap<String, Vec<Option<f64>>> {
        &self.columns
    }

    pub fn num_rows(&self) -> usize {
        self.dates.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn table(dates: &[&str], cols: &[(&str, &[f64])]) -> RawCaseTable {
        let dates = dates.iter().map(|d| date(d)).collect();
        let columns = cols
            .iter()
            .map(|(c, v)| (c.to_string(), v.to_vec()))
            .collect();
        RawCaseTable::new(dates, columns).unwrap()
    }

    #[test]
    fn new_sorts_dates_and_reorders_columns() {
        let t = table(
            &["2020-03-03", "2020-03-01", "2020-03-02"],
            &[("Italy", &[3.0, 1.0, 2.0])],
        );
        assert_eq!(
            t.dates(),
            &[date("2020-03-01"), date("2020-03-02"), date("2020-03-03")]
        );
        assert_eq!(t.column("Italy").unwrap(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn new_rejects_ragged_columns() {
        let mut columns = BTreeMap::new();
        columns.insert("Italy".to_string(), vec![1.0]);
        let err = RawCaseTable::new(vec![date("2020-03-01"), date("2020-03-02")], columns);
        assert!(matches!(err, Err(PipelineError::ShapeMismatch(_))));
    }

    #[test]
    fn us_is_canonicalized_and_world_sums_rows() {
        let mut t = table(
            &["2020-03-01"],
            &[("US", &[100.0]), ("Canada", &[50.0])],
        );
        t.canonicalize_us();
        t.append_world();

        assert!(t.column("US").is_none());
        assert_eq!(t.column("United States of America").unwrap(), &[100.0]);
        assert_eq!(t.column("World").unwrap(), &[150.0]);
    }

    #[test]
    fn shape_check_reports_column_difference() {
        let a = table(&["2020-03-01"], &[("Italy", &[1.0]), ("Spain", &[2.0])]);
        let b = table(&["2020-03-01"], &[("Italy", &[1.0])]);
        let err = a.check_same_shape(&b).unwrap_err();
        assert!(err.to_string().contains("Spain"));
    }

    #[test]
    fn shape_check_reports_date_difference() {
        let a = table(&["2020-03-01"], &[("Italy", &[1.0])]);
        let b = table(&["2020-03-01", "2020-03-02"], &[("Italy", &[1.0, 2.0])]);
        assert!(a.check_same_shape(&b).is_err());
    }
}
