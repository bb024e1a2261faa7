pub mod derive;
pub mod registry;
pub mod table;

pub use registry::DatasetRegistry;
pub use table::{RawCaseTable, SeriesTable};

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::PipelineError;

/// The disease-count dataset being viewed. Iteration and display order is
/// fixed: confirmed, infected, recovered, deaths, time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Confirmed,
    Infected,
    Recovered,
    Deaths,
    Time,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Confirmed,
        Category::Infected,
        Category::Recovered,
        Category::Deaths,
        Category::Time,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Confirmed => "confirmed",
            Category::Infected => "infected",
            Category::Recovered => "recovered",
            Category::Deaths => "deaths",
            Category::Time => "time",
        }
    }

    /// Axis label shown to users, e.g. "Confirmed cases".
    pub fn label(self) -> &'static str {
        match self {
            Category::Confirmed => "Confirmed cases",
            Category::Infected => "Currently infected",
            Category::Recovered => "Recovered cases",
            Category::Deaths => "Death cases",
            Category::Time => "Time",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PipelineError::UnknownSelector(s.to_string()))
    }
}

/// One of the five derived transforms of a category's raw table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Evaluation {
    Cumulative,
    CumulativeNormalized,
    DailyNew,
    DailyNewNormalized,
    GrowthRate,
}

impl Evaluation {
    pub const ALL: [Evaluation; 5] = [
        Evaluation::Cumulative,
        Evaluation::CumulativeNormalized,
        Evaluation::DailyNew,
        Evaluation::DailyNewNormalized,
        Evaluation::GrowthRate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Evaluation::Cumulative => "cumulative",
            Evaluation::CumulativeNormalized => "cumulative normalized",
            Evaluation::DailyNew => "new",
            Evaluation::DailyNewNormalized => "new normalized",
            Evaluation::GrowthRate => "growth rate",
        }
    }

    /// Display unit attached to every view of this evaluation.
    pub fn unit(self) -> &'static str {
        match self {
            Evaluation::Cumulative => "total cases",
            Evaluation::CumulativeNormalized => "% of country's population",
            Evaluation::DailyNew => "cases / day",
            Evaluation::DailyNewNormalized => "% of population / day",
            Evaluation::GrowthRate => "% change from previous day",
        }
    }

    /// Short explanation surfaced next to the selector, metadata only.
    pub fn tooltip(self) -> &'static str {
        match self {
            Evaluation::Cumulative => "Total cumulative number of cases as reported upstream.",
            Evaluation::CumulativeNormalized => {
                "Cumulative cases divided by the country's population."
            }
            Evaluation::DailyNew => {
                "Cases reported for each day, the day-to-day difference of the cumulative count."
            }
            Evaluation::DailyNewNormalized => {
                "Daily cases divided by the country's population."
            }
            Evaluation::GrowthRate => {
                "Percentage change of the cumulative count versus the previous day."
            }
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Evaluation {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Evaluation::ALL
            .into_iter()
            .find(|e| e.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PipelineError::UnknownSelector(s.to_string()))
    }
}

/// Unit label for the `time` pseudo-category, whatever the evaluation.
pub const TIME_UNIT: &str = "date";

/// Synthetic column summing all real countries per row.
pub const WORLD: &str = "World";

/// The raw feed reports "US"; the population source uses the long form.
pub const US_SHORT: &str = "US";
pub const US_CANONICAL: &str = "United States of America";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_order_is_fixed() {
        let names: Vec<&str> = Category::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec!["confirmed", "infected", "recovered", "deaths", "time"]
        );
    }

    #[test]
    fn selectors_parse_from_display_names() {
        assert_eq!(
            "confirmed".parse::<Category>().unwrap(),
            Category::Confirmed
        );
        assert_eq!(" Time ".parse::<Category>().unwrap(), Category::Time);
        assert_eq!(
            "growth rate".parse::<Evaluation>().unwrap(),
            Evaluation::GrowthRate
        );
        assert_eq!(
            "cumulative normalized".parse::<Evaluation>().unwrap(),
            Evaluation::CumulativeNormalized
        );
    }

    #[test]
    fn junk_selector_is_rejected() {
        assert!(matches!(
            "casez".parse::<Category>(),
            Err(PipelineError::UnknownSelector(_))
        ));
        assert!(matches!(
            "median".parse::<Evaluation>(),
            Err(PipelineError::UnknownSelector(_))
        ));
    }
}
