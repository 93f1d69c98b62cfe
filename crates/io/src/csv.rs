// CSV/TSV import

use std::path::Path;

use nfmatch_recon::Table;

use crate::{table_from_records, IoError};

/// Bytes inspected when guessing the delimiter.
const SNIFF_BYTES: usize = 1024;

/// Used when no candidate splits the sample into more than one field.
pub const FALLBACK_DELIMITER: u8 = b';';

pub fn import(path: &Path) -> Result<Table, IoError> {
    let bytes = std::fs::read(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let content = decode_utf8(bytes);
    if content.contains('\0') {
        return Err(IoError::unparsable(path, "binary content in a text file"));
    }
    let delimiter = sniff_delimiter(&content);
    log::debug!("{}: delimiter {:?}", path.display(), delimiter as char);
    parse_table(&content, delimiter).map_err(|reason| IoError::unparsable(path, reason))
}

/// Detect the most likely field delimiter from the first ~1KB.
///
/// For each candidate (semicolon, comma, tab, pipe), count fields per sampled
/// line. The delimiter that produces the most consistent field count (>1
/// field) wins; ties go to the earlier candidate. No viable candidate means
/// `;`.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b';', b',', b'\t', b'|'];

    let mut end = content.len().min(SNIFF_BYTES);
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    let sample = &content[..end];

    let mut sample_lines: Vec<&str> = sample.lines().filter(|l| !l.trim().is_empty()).collect();
    // A line cut off by the sample boundary would skew its field count.
    if end < content.len() && sample_lines.len() > 1 {
        sample_lines.pop();
    }

    if sample_lines.is_empty() {
        return FALLBACK_DELIMITER;
    }

    let mut best = FALLBACK_DELIMITER;
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Must produce >1 field on the first line to be viable
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Score: (lines with the same field count as line 1) * field_count
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Decode as UTF-8 (dropping a BOM); fall back to Windows-1252, which is what
/// Excel writes for "CSV" on Portuguese-locale Windows.
pub fn decode_utf8(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => match s.strip_prefix('\u{FEFF}') {
            Some(stripped) => stripped.to_string(),
            None => s,
        },
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    }
}

/// Parse delimited text. All values stay text; nothing is coerced.
pub fn parse_table(content: &str, delimiter: u8) -> Result<Table, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| e.to_string())?;
        records.push(record.iter().map(str::to_string).collect());
    }

    table_from_records(records).ok_or_else(|| "no header row".to_string())
}
