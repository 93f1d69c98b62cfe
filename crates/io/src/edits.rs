// Edits file: operator decisions keyed by NFe + Pedido.
//
// Any table `load_table` accepts will do, including a previously rendered
// report. Invoice and order columns are found the same way as for the
// inputs; "Enviado?" and "Observação" are looked up by header token.

use std::path::Path;

use nfmatch_recon::classify::HeaderTokens;
use nfmatch_recon::normalize::normalize_id;
use nfmatch_recon::{classify_columns, KeyMode, RecordEdit, Role};

use crate::{load_table, IoError};

const SENT_HEADERS: &[&str] = &["enviado", "enviada", "sent"];
const NOTE_HEADERS: &[&str] = &["observacao", "observacoes", "obs", "note"];

/// Read an edits file into [`RecordEdit`]s with ids normalized by `mode`.
///
/// Rows with an empty key are skipped. Blank `Enviado?`/`Observação` cells
/// leave the field untouched.
pub fn load_edits(path: &Path, mode: KeyMode) -> Result<Vec<RecordEdit>, IoError> {
    let table = load_table(path)?;
    let roles = classify_columns(table.columns());

    let column = |role: Role| -> Result<usize, IoError> {
        roles
            .get(role)
            .and_then(|name| table.column_index(name))
            .ok_or_else(|| IoError::InvalidEdit {
                path: path.to_path_buf(),
                row: 1,
                reason: format!("no column for {role}"),
            })
    };
    let invoice_col = column(Role::InvoiceId)?;
    let order_col = column(Role::OrderId)?;
    let sent_col = find_column(table.columns(), SENT_HEADERS);
    let note_col = find_column(table.columns(), NOTE_HEADERS);

    if sent_col.is_none() && note_col.is_none() {
        log::warn!("{}: no Enviado?/Observação column, nothing to edit", path.display());
    }

    let mut edits = Vec::new();
    for (i, row) in table.rows().iter().enumerate() {
        // 1-based, counting the header line
        let line = i + 2;
        let invoice = normalize_id(&row[invoice_col], mode);
        let order = normalize_id(&row[order_col], mode);
        if invoice.is_empty() && order.is_empty() {
            continue;
        }

        let sent = match sent_col {
            Some(c) => parse_flag(&row[c]).map_err(|reason| IoError::InvalidEdit {
                path: path.to_path_buf(),
                row: line,
                reason,
            })?,
            None => None,
        };
        let note = note_col
            .map(|c| row[c].trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        edits.push(RecordEdit {
            invoice,
            order,
            sent,
            note,
        });
    }

    log::debug!("{}: {} edit(s)", path.display(), edits.len());
    Ok(edits)
}

fn find_column(columns: &[String], words: &[&str]) -> Option<usize> {
    columns.iter().position(|c| {
        let header = HeaderTokens::parse(c);
        words.contains(&header.compact.as_str()) || header.tokens.iter().any(|t| words.contains(&t.as_str()))
    })
}

/// Yes/no cell. Empty means "leave as is".
fn parse_flag(raw: &str) -> Result<Option<bool>, String> {
    let value = raw.trim().to_lowercase();
    match value.as_str() {
        "" => Ok(None),
        "true" | "verdadeiro" | "sim" | "s" | "yes" | "y" | "1" | "x" => Ok(Some(true)),
        "false" | "falso" | "não" | "nao" | "n" | "no" | "0" => Ok(Some(false)),
        _ => Err(format!("cannot read '{}' as yes/no", raw.trim())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_report;
    use chrono::NaiveDate;
    use nfmatch_recon::{compute_summary, MatchRecord};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn flags_accept_portuguese_and_english() {
        assert_eq!(parse_flag("Sim"), Ok(Some(true)));
        assert_eq!(parse_flag("NÃO"), Ok(Some(false)));
        assert_eq!(parse_flag("x"), Ok(Some(true)));
        assert_eq!(parse_flag("TRUE"), Ok(Some(true)));
        assert_eq!(parse_flag(" 0 "), Ok(Some(false)));
        assert_eq!(parse_flag("  "), Ok(None));
        assert!(parse_flag("talvez").is_err());
    }

    #[test]
    fn csv_edits_are_normalized() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("edits.csv");
        fs::write(
            &path,
            "NFe;Pedido;Enviado?;Observação\n001-A;77;sim;conferido\n002;78;;\n;;sim;\n",
        )
        .unwrap();

        let edits = load_edits(&path, KeyMode::DigitsOnly).unwrap();
        assert_eq!(
            edits,
            vec![
                RecordEdit {
                    invoice: "001".into(),
                    order: "77".into(),
                    sent: Some(true),
                    note: Some("conferido".into()),
                },
                RecordEdit {
                    invoice: "002".into(),
                    order: "78".into(),
                    sent: None,
                    note: None,
                },
            ]
        );
    }

    #[test]
    fn bad_flag_reports_the_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("edits.csv");
        fs::write(&path, "NFe;Pedido;Enviado?\n1;2;sim\n3;4;talvez\n").unwrap();

        match load_edits(&path, KeyMode::DigitsOnly).unwrap_err() {
            IoError::InvalidEdit { row, reason, .. } => {
                assert_eq!(row, 3);
                assert!(reason.contains("talvez"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_key_column_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("edits.csv");
        fs::write(&path, "Pedido;Enviado?\n77;sim\n").unwrap();
        let err = load_edits(&path, KeyMode::DigitsOnly).unwrap_err();
        assert!(matches!(err, IoError::InvalidEdit { .. }), "{err}");
    }

    #[test]
    fn a_rendered_report_reads_back_as_edits() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let mut first = MatchRecord::new("001".into(), "77".into(), "Acme".into(), date);
        first.sent = true;
        first.note = "ok".into();
        let mut second = MatchRecord::new("002".into(), "78".into(), "Beta".into(), date);
        second.sent = false;
        let records = vec![first, second];

        let bytes = render_report(&records, &compute_summary(&records)).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("controle_envio_20240315.xlsx");
        fs::write(&path, bytes).unwrap();

        let edits = load_edits(&path, KeyMode::DigitsOnly).unwrap();
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0].sent, Some(true));
        assert_eq!(edits[0].note.as_deref(), Some("ok"));
        assert_eq!(edits[1].sent, Some(false));
        assert_eq!(edits[1].note, None);
    }
}
