// Excel import (xlsx, xlsm, xls, xlsb, ods)

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::{Duration, NaiveDate};
use nfmatch_recon::Table;

use crate::{table_from_records, IoError};

/// Maximum number of rows read from a sheet (prevents DoS from huge files)
const MAX_ROWS: usize = 1_048_576;

/// Import the first worksheet of a workbook. Every cell is rendered as text so
/// ids keep their leading zeros and never turn into floats.
pub fn import(path: &Path) -> Result<Table, IoError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| IoError::unparsable(path, format!("failed to open spreadsheet: {e}")))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| IoError::unparsable(path, "spreadsheet contains no sheets"))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| IoError::unparsable(path, format!("failed to read sheet '{sheet_name}': {e}")))?;

    let (height, _) = range.get_size();
    if height > MAX_ROWS {
        log::warn!(
            "{}: sheet '{}' truncated from {} to {} rows",
            path.display(),
            sheet_name,
            height,
            MAX_ROWS
        );
    }

    let records = range
        .rows()
        .take(MAX_ROWS)
        .map(|row| row.iter().map(cell_to_text).collect::<Vec<String>>());

    table_from_records(records).ok_or_else(|| IoError::unparsable(path, format!("sheet '{sheet_name}' is empty")))
}

/// Text form of one cell, close to what a spreadsheet user sees.
pub fn cell_to_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            // Integers without decimals
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => format!("{}", n),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => serial_to_text(dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Excel 1900-system serial -> ISO date (time-of-day appended when present).
fn serial_to_text(serial: f64) -> String {
    // Day 0 of the 1900 system, accounting for the phantom 1900-02-29.
    let Some(epoch) = NaiveDate::from_ymd_opt(1899, 12, 30) else {
        return format!("{serial}");
    };
    let days = serial.floor();
    let Some(date) = epoch.checked_add_signed(Duration::days(days as i64)) else {
        return format!("{serial}");
    };
    let seconds = ((serial - days) * 86_400.0).round() as i64;
    if seconds == 0 {
        date.format("%Y-%m-%d").to_string()
    } else {
        let time = date.and_hms_opt(0, 0, 0).map(|t| t + Duration::seconds(seconds));
        match time {
            Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => date.format("%Y-%m-%d").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::tempdir;

    #[test]
    fn floats_render_without_trailing_zero() {
        assert_eq!(cell_to_text(&Data::Float(123.0)), "123");
        assert_eq!(cell_to_text(&Data::Float(12.5)), "12.5");
        assert_eq!(cell_to_text(&Data::Int(77)), "77");
        assert_eq!(cell_to_text(&Data::Bool(true)), "TRUE");
        assert_eq!(cell_to_text(&Data::Empty), "");
    }

    #[test]
    fn serial_dates_become_iso() {
        assert_eq!(serial_to_text(45292.0), "2024-01-01");
        assert_eq!(serial_to_text(45292.5), "2024-01-01 12:00:00");
    }

    #[test]
    fn import_first_sheet_as_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dga.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "NF").unwrap();
        sheet.write_string(0, 1, "Pedido").unwrap();
        sheet.write_string(0, 2, "Cliente").unwrap();
        sheet.write_string(1, 0, "000123").unwrap();
        sheet.write_number(1, 1, 4501.0).unwrap();
        sheet.write_string(1, 2, "Acme").unwrap();
        workbook.add_worksheet().write_string(0, 0, "ignored").unwrap();
        workbook.save(&path).unwrap();

        let table = import(&path).unwrap();
        assert_eq!(table.columns(), ["NF", "Pedido", "Cliente"]);
        assert_eq!(table.get(0, "NF"), Some("000123"));
        assert_eq!(table.get(0, "Pedido"), Some("4501"));
        assert_eq!(table.get(0, "Cliente"), Some("Acme"));
    }

    #[test]
    fn garbage_is_unparsable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"definitely not a zip").unwrap();
        let err = import(&path).unwrap_err();
        assert!(matches!(err, IoError::UnparsableFile { .. }), "{err}");
    }
}
