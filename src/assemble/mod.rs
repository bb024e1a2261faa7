pub mod chart;
pub mod xlsx;

pub use chart::{AxisAnnotation, ChartBundle, ChartSeries};
pub use xlsx::XLSX_MIME;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::PipelineError;
use crate::query::DateRange;
use crate::series::{Category, Evaluation};

/// Axis scale requested by the caller. Pure presentation: the adapter never
/// alters values for it, and the renderer owns any floor policy for
/// non-positive points on a logarithmic axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Linear,
    Logarithmic,
}

impl Scale {
    pub fn label(self) -> &'static str {
        match self {
            Scale::Linear => "linear",
            Scale::Logarithmic => "logarithmic",
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Scale {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The UI historically sends the short keys.
        match s.trim().to_lowercase().as_str() {
            "lin" | "linear" => Ok(Scale::Linear),
            "log" | "logarithmic" => Ok(Scale::Logarithmic),
            other => Err(PipelineError::UnknownSelector(other.to_string())),
        }
    }
}

/// What to plot on one axis.
#[derive(Debug, Clone, Copy)]
pub struct AxisSelection {
    pub category: Category,
    pub evaluation: Evaluation,
    pub scale: Scale,
    /// Trailing moving-average window; 1 means off. Ignored for time.
    pub averaging_days: usize,
}

impl AxisSelection {
    pub fn new(category: Category, evaluation: Evaluation) -> Self {
        Self {
            category,
            evaluation,
            scale: Scale::Linear,
            averaging_days: 1,
        }
    }
}

/// A full user selection: countries, both axes, date sub-range.
#[derive(Debug, Clone)]
pub struct Selection {
    pub countries: Vec<String>,
    pub x: AxisSelection,
    pub y: AxisSelection,
    pub range: DateRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_parses_both_key_forms() {
        assert_eq!("lin".parse::<Scale>().unwrap(), Scale::Linear);
        assert_eq!("Linear".parse::<Scale>().unwrap(), Scale::Linear);
        assert_eq!("log".parse::<Scale>().unwrap(), Scale::Logarithmic);
        assert_eq!("logarithmic".parse::<Scale>().unwrap(), Scale::Logarithmic);
        assert!("cubic".parse::<Scale>().is_err());
    }
}
