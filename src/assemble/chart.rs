use serde::Serialize;

use crate::error::Result;
use crate::query::{get_series, SeriesData};
use crate::series::{Category, DatasetRegistry};

use super::{AxisSelection, Scale, Selection};

/// One country's plotted trace.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    pub x: SeriesData,
    pub y: SeriesData,
    pub label: String,
}

/// Presentation metadata for one axis.
#[derive(Debug, Clone, Serialize)]
pub struct AxisAnnotation {
    pub title: String,
    pub scale: Scale,
}

/// Everything the rendering collaborator needs for one chart.
#[derive(Debug, Clone, Serialize)]
pub struct ChartBundle {
    pub series: Vec<ChartSeries>,
    pub x_axis: AxisAnnotation,
    pub y_axis: AxisAnnotation,
}

/// Compose the chart bundle for a selection. An empty country selection is
/// a no-op, not an error: there is nothing to render.
pub fn chart_bundle(registry: &DatasetRegistry, selection: &Selection) -> Result<Option<ChartBundle>> {
    if selection.countries.is_empty() {
        return Ok(None);
    }

    let mut series = Vec::with_capacity(selection.countries.len());
    for country in &selection.countries {
        let x = axis_series(registry, &selection.x, country, selection)?;
        let y = axis_series(registry, &selection.y, country, selection)?;
        series.push(ChartSeries {
            x,
            y,
            label: country.clone(),
        });
    }

    Ok(Some(ChartBundle {
        series,
        x_axis: annotate(registry, &selection.x),
        y_axis: annotate(registry, &selection.y),
    }))
}

fn axis_series(
    registry: &DatasetRegistry,
    axis: &AxisSelection,
    country: &str,
    selection: &Selection,
) -> Result<SeriesData> {
    get_series(
        registry,
        axis.category,
        axis.evaluation,
        country,
        selection.range,
        axis.averaging_days,
    )
}

/// Axis title: base label, optional moving-average suffix, unit in
/// brackets. The time axis is always linear and never averaged.
fn annotate(registry: &DatasetRegistry, axis: &AxisSelection) -> AxisAnnotation {
    let mut title = axis.category.label().to_string();
    let scale = if axis.category == Category::Time {
        Scale::Linear
    } else {
        if axis.averaging_days > 1 {
            title.push_str(&format!(
                " with moving average of {} days",
                axis.averaging_days
            ));
        }
        axis.scale
    };
    title.push_str(&format!(
        " [{}]",
        registry.unit(axis.category, axis.evaluation)
    ));
    AxisAnnotation { title, scale }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::DateRange;
    use crate::series::{Evaluation, RawCaseTable};
    use chrono::NaiveDate;
    use std::collections::{BTreeMap, HashMap};

    fn registry() -> DatasetRegistry {
        let dates: Vec<NaiveDate> = (1..=4)
            .map(|d| NaiveDate::from_ymd_opt(2020, 3, d).unwrap())
            .collect();
        let table = |vals: [f64; 4]| {
            let mut columns = BTreeMap::new();
            columns.insert("Italy".to_string(), vals.to_vec());
            columns.insert("Spain".to_string(), vals.iter().map(|v| v * 2.0).collect());
            RawCaseTable::new(dates.clone(), columns).unwrap()
        };
        DatasetRegistry::from_tables(
            table([10.0, 20.0, 30.0, 40.0]),
            table([1.0, 2.0, 3.0, 4.0]),
            table([0.0, 1.0, 1.0, 2.0]),
            &HashMap::new(),
        )
        .unwrap()
    }

    fn selection(countries: &[&str]) -> Selection {
        Selection {
            countries: countries.iter().map(|c| c.to_string()).collect(),
            x: AxisSelection::new(Category::Time, Evaluation::Cumulative),
            y: AxisSelection::new(Category::Confirmed, Evaluation::Cumulative),
            range: DateRange::full(),
        }
    }

    #[test]
    fn empty_selection_is_a_no_op() {
        let reg = registry();
        assert!(chart_bundle(&reg, &selection(&[])).unwrap().is_none());
    }

    #[test]
    fn one_trace_per_country_with_label() {
        let reg = registry();
        let bundle = chart_bundle(&reg, &selection(&["Italy", "Spain"]))
            .unwrap()
            .unwrap();
        assert_eq!(bundle.series.len(), 2);
        assert_eq!(bundle.series[0].label, "Italy");
        assert_eq!(bundle.series[1].label, "Spain");
        assert_eq!(bundle.series[0].x.len(), 4);
        assert_eq!(
            bundle.series[0].y,
            SeriesData::Numbers(vec![Some(10.0), Some(20.0), Some(30.0), Some(40.0)])
        );
    }

    #[test]
    fn axis_title_carries_average_suffix_and_unit() {
        let reg = registry();
        let mut sel = selection(&["Italy"]);
        sel.y.averaging_days = 7;
        sel.y.scale = Scale::Logarithmic;
        let bundle = chart_bundle(&reg, &sel).unwrap().unwrap();
        assert_eq!(
            bundle.y_axis.title,
            "Confirmed cases with moving average of 7 days [total cases]"
        );
        assert_eq!(bundle.y_axis.scale, Scale::Logarithmic);
    }

    #[test]
    fn time_axis_is_forced_linear_without_suffix() {
        let reg = registry();
        let mut sel = selection(&["Italy"]);
        sel.x.averaging_days = 7;
        sel.x.scale = Scale::Logarithmic;
        let bundle = chart_bundle(&reg, &sel).unwrap().unwrap();
        assert_eq!(bundle.x_axis.title, "Time [date]");
        assert_eq!(bundle.x_axis.scale, Scale::Linear);
        // Dates come through unaveraged.
        assert_eq!(bundle.series[0].x.len(), 4);
    }

    #[test]
    fn bundle_serializes_for_the_renderer() {
        let reg = registry();
        let bundle = chart_bundle(&reg, &selection(&["Italy"])).unwrap().unwrap();
        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(json["series"][0]["label"], "Italy");
        assert_eq!(json["y_axis"]["scale"], "linear");
        assert_eq!(json["series"][0]["x"][0], "2020-03-01");
    }
}
