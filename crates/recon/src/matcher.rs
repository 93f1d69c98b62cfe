use std::collections::{HashMap, HashSet};

/// Row of one source reduced to its composite key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedRow {
    /// Position in the source table.
    pub row: usize,
    pub key: String,
}

/// One inner-join result: a left row and a right row sharing a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRow {
    pub key: String,
    pub left_row: usize,
    pub right_row: usize,
}

/// Inner join on exact key equality.
///
/// Output follows left order; a left row matching several right rows yields
/// one joined row per right row, in right order. Rows with no partner on the
/// other side are dropped.
pub fn join_exact_key(left: &[KeyedRow], right: &[KeyedRow]) -> Vec<JoinedRow> {
    let mut right_map: HashMap<&str, Vec<usize>> = HashMap::new();
    for r in right {
        right_map.entry(r.key.as_str()).or_default().push(r.row);
    }

    let mut joined = Vec::new();
    for l in left {
        if let Some(right_rows) = right_map.get(l.key.as_str()) {
            for &right_row in right_rows {
                joined.push(JoinedRow {
                    key: l.key.clone(),
                    left_row: l.row,
                    right_row,
                });
            }
        }
    }
    joined
}

/// Output of [`keep_first_per_key`].
#[derive(Debug, Default)]
pub struct DedupOutput {
    pub kept: Vec<JoinedRow>,
    /// Number of joined rows dropped.
    pub dropped: usize,
    /// Keys that had more than one joined row, in first-seen order.
    pub duplicate_keys: Vec<String>,
}

/// Keep the first joined row per distinct key, preserving order.
pub fn keep_first_per_key(rows: Vec<JoinedRow>) -> DedupOutput {
    let mut seen: HashSet<String> = HashSet::new();
    let mut reported: HashSet<String> = HashSet::new();
    let mut out = DedupOutput::default();

    for row in rows {
        if seen.contains(&row.key) {
            out.dropped += 1;
            if reported.insert(row.key.clone()) {
                out.duplicate_keys.push(row.key);
            }
            continue;
        }
        seen.insert(row.key.clone());
        out.kept.push(row);
    }
    out
}
