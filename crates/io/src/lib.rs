// File I/O: tabular inputs in, xlsx report out

pub mod csv;
pub mod edits;
pub mod report;
pub mod xlsx;

use std::io::Read;
use std::path::{Path, PathBuf};

use nfmatch_recon::Table;
use thiserror::Error;

pub use edits::load_edits;
pub use report::{render_report, report_file_name, REPORT_MIME};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Neither delimited text nor a spreadsheet we can open.
    #[error("cannot parse {}: {reason}", .path.display())]
    UnparsableFile { path: PathBuf, reason: String },
    /// A row of an edits file could not be applied.
    #[error("{}, row {row}: {reason}", .path.display())]
    InvalidEdit {
        path: PathBuf,
        row: usize,
        reason: String,
    },
    #[error("cannot build report: {0}")]
    Report(String),
}

impl IoError {
    pub(crate) fn unparsable(path: &Path, reason: impl Into<String>) -> Self {
        Self::UnparsableFile {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Extensions opened with the spreadsheet reader.
const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];
/// Extensions opened with the delimited-text reader.
const TEXT_EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

/// Load a table from a CSV/TSV or Excel/ODS file. Every cell comes back as text.
///
/// Known extensions pick the reader directly; anything else is probed by
/// magic bytes (zip or OLE container means spreadsheet, otherwise text).
pub fn load_table(path: &Path) -> Result<Table, IoError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let table = if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
        xlsx::import(path)?
    } else if TEXT_EXTENSIONS.contains(&ext.as_str()) {
        csv::import(path)?
    } else if looks_like_spreadsheet(path)? {
        xlsx::import(path)?
    } else {
        csv::import(path)?
    };

    log::info!(
        "loaded {}: {} column(s), {} row(s)",
        path.display(),
        table.columns().len(),
        table.len()
    );
    Ok(table)
}

fn looks_like_spreadsheet(path: &Path) -> Result<bool, IoError> {
    let mut file = std::fs::File::open(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut magic = [0u8; 4];
    let n = file.read(&mut magic).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let magic = &magic[..n];
    Ok(magic == ZIP_MAGIC || magic == OLE_MAGIC)
}

/// Make header names usable as keys: blanks become `Unnamed: N`, repeats get
/// a `.1`, `.2`, ... suffix.
pub(crate) fn unique_headers(raw: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for (i, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {i}")
        } else {
            name
        };
        let mut candidate = base.clone();
        let mut n = 1;
        while out.contains(&candidate) {
            candidate = format!("{base}.{n}");
            n += 1;
        }
        out.push(candidate);
    }
    out
}

/// Build a table from raw records: the first record with any non-blank cell
/// is the header, fully blank records are skipped.
pub(crate) fn table_from_records<I>(records: I) -> Option<Table>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut records = records
        .into_iter()
        .filter(|r| r.iter().any(|c| !c.trim().is_empty()));

    let header = records.next()?;
    let mut table = Table::new(unique_headers(header));
    for record in records {
        table.push_row(record);
    }
    Some(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn unique_headers_fill_blanks_and_suffix_repeats() {
        let headers = unique_headers(vec![
            "NF".into(),
            "".into(),
            "NF".into(),
            "NF".into(),
            "  ".into(),
        ]);
        assert_eq!(headers, vec!["NF", "Unnamed: 1", "NF.1", "NF.2", "Unnamed: 4"]);
    }

    #[test]
    fn blank_leading_rows_are_skipped() {
        let table = table_from_records(vec![
            vec!["".to_string(), " ".to_string()],
            vec!["NF".to_string(), "Pedido".to_string()],
            vec!["".to_string(), "".to_string()],
            vec!["1".to_string(), "2".to_string()],
        ])
        .unwrap();
        assert_eq!(table.columns(), ["NF", "Pedido"]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn unknown_extension_falls_back_to_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("export.dat");
        fs::write(&path, "NF;Pedido\n1;2\n").unwrap();
        let table = load_table(&path).unwrap();
        assert_eq!(table.columns(), ["NF", "Pedido"]);
        assert_eq!(table.get(0, "Pedido"), Some("2"));
    }

    #[test]
    fn zip_magic_with_unknown_extension_goes_to_spreadsheet_reader() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("export.bin");
        fs::write(&path, b"PK\x03\x04not really a workbook").unwrap();
        let err = load_table(&path).unwrap_err();
        assert!(matches!(err, IoError::UnparsableFile { .. }), "{err}");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_table(Path::new("/nonexistent/pedro.csv")).unwrap_err();
        assert!(matches!(err, IoError::Read { .. }), "{err}");
    }
}
