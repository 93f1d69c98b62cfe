//! Two-sheet xlsx report: "Controle" mirrors the match records with the
//! operator's edits, "Resumo" holds the counters.

use chrono::{Datelike, NaiveDate};
use nfmatch_recon::{MatchRecord, ReconSummary};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet, XlsxError};

use crate::IoError;

pub const REPORT_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const CONTROL_SHEET: &str = "Controle";
pub const SUMMARY_SHEET: &str = "Resumo";

pub const CONTROL_HEADERS: [&str; 6] = ["NFe", "Pedido", "Cliente", "Enviado?", "Observação", "Data"];
pub const SUMMARY_HEADERS: [&str; 3] = ["Total de pedidos faturados", "Enviados", "Pendentes"];

const DATE_FORMAT: &str = "dd/mm/yyyy";

/// `<prefix>_YYYYMMDD.xlsx`
pub fn report_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}_{}.xlsx", date.format("%Y%m%d"))
}

/// Render the report into an in-memory xlsx file.
pub fn render_report(records: &[MatchRecord], summary: &ReconSummary) -> Result<Vec<u8>, IoError> {
    build_workbook(records, summary)
        .and_then(|mut workbook| workbook.save_to_buffer())
        .map_err(|e| IoError::Report(e.to_string()))
}

fn build_workbook(records: &[MatchRecord], summary: &ReconSummary) -> Result<Workbook, XlsxError> {
    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format(DATE_FORMAT);

    let mut workbook = Workbook::new();

    {
        let sheet = workbook.add_worksheet().set_name(CONTROL_SHEET)?;
        write_header(sheet, &CONTROL_HEADERS, &header_format)?;

        for (i, record) in records.iter().enumerate() {
            let row = (i + 1) as u32;
            sheet.write_string(row, 0, &record.invoice)?;
            sheet.write_string(row, 1, &record.order)?;
            sheet.write_string(row, 2, &record.customer)?;
            sheet.write_boolean(row, 3, record.sent)?;
            sheet.write_string(row, 4, &record.note)?;
            let date = excel_date(record.verified_on)?;
            sheet.write_datetime_with_format(row, 5, &date, &date_format)?;
        }

        let last_col = (CONTROL_HEADERS.len() - 1) as u16;
        sheet.autofilter(0, 0, records.len() as u32, last_col)?;
        sheet.set_freeze_panes(1, 0)?;
        sheet.autofit();
    }

    {
        let sheet = workbook.add_worksheet().set_name(SUMMARY_SHEET)?;
        write_header(sheet, &SUMMARY_HEADERS, &header_format)?;
        sheet.write_number(1, 0, summary.total as f64)?;
        sheet.write_number(1, 1, summary.sent as f64)?;
        sheet.write_number(1, 2, summary.pending as f64)?;

        let last_col = (SUMMARY_HEADERS.len() - 1) as u16;
        sheet.autofilter(0, 0, 1, last_col)?;
        sheet.set_freeze_panes(1, 0)?;
        sheet.autofit();
    }

    Ok(workbook)
}

fn write_header(sheet: &mut Worksheet, headers: &[&str], format: &Format) -> Result<(), XlsxError> {
    for (col, title) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, format)?;
    }
    Ok(())
}

fn excel_date(date: NaiveDate) -> Result<ExcelDateTime, XlsxError> {
    ExcelDateTime::from_ymd(date.year() as u16, date.month() as u8, date.day() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook_auto, Data, Reader};
    use nfmatch_recon::compute_summary;
    use tempfile::tempdir;

    fn record(invoice: &str, sent: bool, note: &str) -> MatchRecord {
        let mut r = MatchRecord::new(
            invoice.into(),
            "77".into(),
            "Acme".into(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        );
        r.sent = sent;
        r.note = note.into();
        r
    }

    #[test]
    fn file_name_embeds_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(report_file_name("controle_envio", date), "controle_envio_20240305.xlsx");
    }

    #[test]
    fn report_has_both_sheets_with_edits() {
        let records = vec![record("001", true, ""), record("002", false, "sem estoque")];
        let summary = compute_summary(&records);
        let bytes = render_report(&records, &summary).unwrap();
        assert_eq!(&bytes[..2], b"PK");

        let dir = tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        std::fs::write(&path, &bytes).unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec![CONTROL_SHEET.to_string(), SUMMARY_SHEET.to_string()]);

        let control = workbook.worksheet_range(CONTROL_SHEET).unwrap();
        assert_eq!(control.get_size(), (3, 6));
        assert_eq!(control.get((0, 4)), Some(&Data::String("Observação".into())));
        assert_eq!(control.get((1, 0)), Some(&Data::String("001".into())));
        assert_eq!(control.get((1, 3)), Some(&Data::Bool(true)));
        assert_eq!(control.get((2, 3)), Some(&Data::Bool(false)));
        assert_eq!(control.get((2, 4)), Some(&Data::String("sem estoque".into())));

        let resumo = workbook.worksheet_range(SUMMARY_SHEET).unwrap();
        assert_eq!(resumo.get((1, 0)), Some(&Data::Float(2.0)));
        assert_eq!(resumo.get((1, 1)), Some(&Data::Float(1.0)));
        assert_eq!(resumo.get((1, 2)), Some(&Data::Float(1.0)));
    }

    #[test]
    fn empty_report_still_renders() {
        let summary = compute_summary(&[]);
        let bytes = render_report(&[], &summary).unwrap();
        assert!(!bytes.is_empty());
    }
}
