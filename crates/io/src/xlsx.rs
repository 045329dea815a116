// Excel import (source tables) and export (styled report)

use std::path::Path;
use std::time::Instant;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use rust_xlsxwriter::{Format, Table, TableColumn, TableStyle, Workbook, Worksheet};

use regrecon_report::config::TableStyleKind;
use regrecon_report::{Field, RawCell, RawTable, ReportResult, REPORT_COLUMNS};

/// Number format applied to the report's date column.
pub const DATE_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm";

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Day zero of Excel's 1900 date system (serial 1 = 1900-01-01, with the
/// phantom 1900-02-29 absorbed by starting on Dec 30).
fn excel_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Convert an Excel serial date-time to a timestamp, rounded to the second.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let millis = (serial * MILLIS_PER_DAY).round() as i64;
    let ts = excel_epoch().checked_add_signed(TimeDelta::try_milliseconds(millis)?)?;
    // Drop sub-second float noise
    ts.with_nanosecond(0)
}

/// Convert a timestamp to an Excel serial date-time.
pub fn datetime_to_serial(ts: NaiveDateTime) -> f64 {
    let delta = ts - excel_epoch();
    delta.num_milliseconds() as f64 / MILLIS_PER_DAY
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Import one worksheet of an Excel/ODS file (xlsx, xlsm, xls, xlsb, ods).
///
/// `sheet` selects a worksheet by name; `None` takes the first one. The first
/// non-empty row is the header row. Fully empty rows are skipped.
pub fn import(path: &Path, sheet: Option<&str>) -> Result<RawTable, String> {
    let start_time = Instant::now();

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open spreadsheet {}: {}", path.display(), e))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(name) => sheet_names
            .iter()
            .find(|s| s.as_str() == name)
            .cloned()
            .ok_or_else(|| {
                format!(
                    "{}: no sheet named '{}' (available: {})",
                    path.display(),
                    name,
                    sheet_names.join(", ")
                )
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| format!("{}: spreadsheet contains no sheets", path.display()))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| format!("Failed to read sheet '{}': {}", sheet_name, e))?;

    let mut rows = range
        .rows()
        .filter(|row| !row.iter().all(|c| matches!(c, Data::Empty)));

    let header_row = rows
        .next()
        .ok_or_else(|| format!("{}: sheet '{}' is empty", path.display(), sheet_name))?;
    let headers: Vec<String> = header_row
        .iter()
        .map(|c| match convert_cell(c) {
            RawCell::Empty => String::new(),
            other => other.as_text().unwrap_or_default(),
        })
        .collect();

    let mut table = RawTable::new(headers);
    for row in rows {
        table.rows.push(row.iter().map(convert_cell).collect());
    }

    log::debug!(
        "imported sheet '{}' from {} ({} rows) in {}ms",
        sheet_name,
        path.display(),
        table.rows.len(),
        start_time.elapsed().as_millis()
    );
    Ok(table)
}

fn convert_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty => RawCell::Empty,
        Data::String(s) if s.trim().is_empty() => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Float(n) => RawCell::Number(*n),
        Data::Int(n) => RawCell::Number(*n as f64),
        // Store as TRUE/FALSE text
        Data::Bool(b) => RawCell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => RawCell::Text(format!("#{:?}", e)),
        Data::DateTime(dt) => match serial_to_datetime(dt.as_f64()) {
            Some(ts) => RawCell::DateTime(ts),
            None => RawCell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
            .map(RawCell::DateTime)
            .unwrap_or_else(|_| RawCell::Text(s.clone())),
        Data::DurationIso(s) => RawCell::Text(s.clone()),
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ExportResult {
    pub rows_exported: usize,
    pub export_duration_ms: u128,
}

fn table_style(kind: TableStyleKind) -> TableStyle {
    let pick = |styles: Vec<TableStyle>, n: u8| {
        styles
            .into_iter()
            .nth(usize::from(n.saturating_sub(1)))
            .unwrap_or(TableStyle::Medium2)
    };
    match kind {
        TableStyleKind::None => TableStyle::None,
        TableStyleKind::Light(n) => pick(
            vec![
                TableStyle::Light1, TableStyle::Light2, TableStyle::Light3, TableStyle::Light4,
                TableStyle::Light5, TableStyle::Light6, TableStyle::Light7, TableStyle::Light8,
                TableStyle::Light9, TableStyle::Light10, TableStyle::Light11, TableStyle::Light12,
                TableStyle::Light13, TableStyle::Light14, TableStyle::Light15, TableStyle::Light16,
                TableStyle::Light17, TableStyle::Light18, TableStyle::Light19, TableStyle::Light20,
                TableStyle::Light21,
            ],
            n,
        ),
        TableStyleKind::Medium(n) => pick(
            vec![
                TableStyle::Medium1, TableStyle::Medium2, TableStyle::Medium3, TableStyle::Medium4,
                TableStyle::Medium5, TableStyle::Medium6, TableStyle::Medium7, TableStyle::Medium8,
                TableStyle::Medium9, TableStyle::Medium10, TableStyle::Medium11, TableStyle::Medium12,
                TableStyle::Medium13, TableStyle::Medium14, TableStyle::Medium15, TableStyle::Medium16,
                TableStyle::Medium17, TableStyle::Medium18, TableStyle::Medium19, TableStyle::Medium20,
                TableStyle::Medium21, TableStyle::Medium22, TableStyle::Medium23, TableStyle::Medium24,
                TableStyle::Medium25, TableStyle::Medium26, TableStyle::Medium27, TableStyle::Medium28,
            ],
            n,
        ),
        TableStyleKind::Dark(n) => pick(
            vec![
                TableStyle::Dark1, TableStyle::Dark2, TableStyle::Dark3, TableStyle::Dark4,
                TableStyle::Dark5, TableStyle::Dark6, TableStyle::Dark7, TableStyle::Dark8,
                TableStyle::Dark9, TableStyle::Dark10, TableStyle::Dark11,
            ],
            n,
        ),
    }
}

/// Revenue as a number when it reads as one ("1,250.00" and "$50" included).
fn parse_amount(value: &str) -> Option<f64> {
    let cleaned: String = value
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn write_rows(worksheet: &mut Worksheet, result: &ReportResult) -> Result<(), String> {
    let date_format = Format::new().set_num_format(DATE_NUM_FORMAT);
    let err = |e: rust_xlsxwriter::XlsxError| format!("Failed to write cell: {}", e);

    for (idx, reg) in result.rows.iter().enumerate() {
        // Row 0 is the table header
        let row = (idx + 1) as u32;
        for (col, field) in REPORT_COLUMNS.iter().enumerate() {
            let col = col as u16;
            match field {
                Field::Date => {
                    if let Some(ts) = reg.date {
                        worksheet
                            .write_number_with_format(row, col, datetime_to_serial(ts), &date_format)
                            .map_err(err)?;
                    }
                }
                Field::Revenue => match reg.revenue.as_deref() {
                    Some(v) => match parse_amount(v) {
                        Some(n) => {
                            worksheet.write_number(row, col, n).map_err(err)?;
                        }
                        None => {
                            worksheet.write_string(row, col, v).map_err(err)?;
                        }
                    },
                    None => {}
                },
                other => {
                    if let Some(v) = reg.text(*other) {
                        worksheet.write_string(row, col, v).map_err(err)?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Write the report as a single worksheet holding one styled Excel table.
pub fn export_report(
    result: &ReportResult,
    path: &Path,
    style: TableStyleKind,
) -> Result<ExportResult, String> {
    let start_time = Instant::now();

    let mut workbook = Workbook::new();
    let worksheet = workbook
        .add_worksheet()
        .set_name(&result.meta.worksheet)
        .map_err(|e| format!("Failed to create sheet '{}': {}", result.meta.worksheet, e))?;

    write_rows(worksheet, result)?;

    let columns: Vec<TableColumn> = REPORT_COLUMNS
        .iter()
        .map(|f| TableColumn::new().set_header(f.header()))
        .collect();
    let table = Table::new().set_columns(&columns).set_style(table_style(style));

    // A table needs at least one data row; an empty report gets a blank one.
    let last_row = result.rows.len().max(1) as u32;
    let last_col = (REPORT_COLUMNS.len() - 1) as u16;
    worksheet
        .add_table(0, 0, last_row, last_col, &table)
        .map_err(|e| format!("Failed to add table: {}", e))?;
    worksheet.autofit();

    workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file {}: {}", path.display(), e))?;

    Ok(ExportResult {
        rows_exported: result.rows.len(),
        export_duration_ms: start_time.elapsed().as_millis(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn serial_conversion_known_values() {
        assert_eq!(serial_to_datetime(45435.0), Some(dt("2024-05-23 00:00")));
        assert_eq!(serial_to_datetime(45435.4375), Some(dt("2024-05-23 10:30")));
        assert_eq!(datetime_to_serial(dt("2024-05-23 10:30")), 45435.4375);
        assert_eq!(serial_to_datetime(-1.0), None);
        assert_eq!(serial_to_datetime(f64::NAN), None);
    }

    #[test]
    fn serial_conversion_absorbs_float_noise() {
        // 09:00 stored as a float that is a hair short of the exact value
        let serial = datetime_to_serial(dt("2024-05-24 09:00")) - 1e-9;
        assert_eq!(serial_to_datetime(serial), Some(dt("2024-05-24 09:00")));
    }

    #[test]
    fn amounts_parse_with_separators() {
        assert_eq!(parse_amount("50"), Some(50.0));
        assert_eq!(parse_amount(" 1,250.50 "), Some(1250.5));
        assert_eq!(parse_amount("$75"), Some(75.0));
        assert_eq!(parse_amount("comp"), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn datetime_iso_cells_become_timestamps() {
        let cell = convert_cell(&Data::DateTimeIso("2024-05-24T09:00:00".into()));
        assert_eq!(cell, RawCell::DateTime(dt("2024-05-24 09:00")));
        let cell = convert_cell(&Data::DateTimeIso("not a date".into()));
        assert_eq!(cell, RawCell::Text("not a date".into()));
    }

    #[test]
    fn blank_strings_read_as_empty() {
        assert_eq!(convert_cell(&Data::String("   ".into())), RawCell::Empty);
        assert_eq!(convert_cell(&Data::Int(80202)), RawCell::Number(80202.0));
    }
}
