use anyhow::{Context, Result};
use rust_xlsxwriter::Workbook;
use tracing::debug;

use crate::query::{get_series, SeriesData};
use crate::series::DatasetRegistry;

use super::Selection;

/// MIME type of the produced payload; the buffer is self-contained and
/// base64-embeddable by the caller (e.g. into a data URI).
pub const XLSX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Excel limits worksheet names to 31 characters.
const MAX_SHEET_NAME: usize = 31;

/// Build the spreadsheet for a selection: one sheet per country, a date
/// column and the two axis columns, row-aligned over the selected range.
/// Returns the workbook as an in-memory buffer; an empty country selection
/// is a no-op.
pub fn workbook(registry: &DatasetRegistry, selection: &Selection) -> Result<Option<Vec<u8>>> {
    if selection.countries.is_empty() {
        return Ok(None);
    }

    let mut workbook = Workbook::new();
    for country in &selection.countries {
        let x = get_series(
            registry,
            selection.x.category,
            selection.x.evaluation,
            country,
            selection.range,
            selection.x.averaging_days,
        )?;
        let y = get_series(
            registry,
            selection.y.category,
            selection.y.evaluation,
            country,
            selection.range,
            selection.y.averaging_days,
        )?;

        let sheet = workbook.add_worksheet();
        let name: String = country.chars().take(MAX_SHEET_NAME).collect();
        sheet
            .set_name(&name)
            .with_context(|| format!("naming sheet for `{country}`"))?;

        sheet.write_string(0, 0, "Date")?;
        sheet.write_string(
            0,
            1,
            format!("{} - {}", country, selection.x.category.label()),
        )?;
        sheet.write_string(
            0,
            2,
            format!("{} - {}", country, selection.y.category.label()),
        )?;

        write_column(sheet, 1, &x)?;
        write_column(sheet, 2, &y)?;

        // The date index column, clamped the same way the series were.
        let dates = registry.dates();
        let start = selection.range.start.clamp(0, dates.len() as i64) as usize;
        for (row, date) in dates[start..start + x.len()].iter().enumerate() {
            sheet.write_string(row as u32 + 1, 0, date.format("%Y-%m-%d").to_string())?;
        }
    }

    let buffer = workbook
        .save_to_buffer()
        .context("serializing workbook to buffer")?;
    debug!(bytes = buffer.len(), "export workbook assembled");
    Ok(Some(buffer))
}

fn write_column(
    sheet: &mut rust_xlsxwriter::Worksheet,
    col: u16,
    series: &SeriesData,
) -> Result<()> {
    match series {
        SeriesData::Numbers(values) => {
            for (row, value) in values.iter().enumerate() {
                // Missing values stay blank cells.
                if let Some(v) = value {
                    sheet.write_number(row as u32 + 1, col, *v)?;
                }
            }
        }
        SeriesData::Dates(dates) => {
            for (row, date) in dates.iter().enumerate() {
                sheet.write_string(row as u32 + 1, col, date.format("%Y-%m-%d").to_string())?;
            }
        }
    }
    Ok(())
}
