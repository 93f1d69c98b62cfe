use chrono::NaiveDate;

use crate::config::{DuplicatePolicy, ReconConfig};
use crate::error::ReconError;
use crate::matcher::{join_exact_key, keep_first_per_key, KeyedRow};
use crate::model::{MatchRecord, ReconOutcome, Role, RoleMap, RunDiagnostics, SourceSide};
use crate::normalize::{composite_key, normalize_id, KeyMode};
use crate::table::Table;

/// Maximum keys listed in a `DuplicateKeys` error.
const MAX_REPORTED_DUPLICATES: usize = 10;

/// Both exports plus the final (possibly user-corrected) role maps.
#[derive(Debug, Clone, Copy)]
pub struct ReconInput<'a> {
    pub pedro: &'a Table,
    pub pedro_roles: &'a RoleMap,
    pub dga: &'a Table,
    pub dga_roles: &'a RoleMap,
}

/// Run reconciliation dated today (local time).
pub fn run(config: &ReconConfig, input: &ReconInput<'_>) -> Result<ReconOutcome, ReconError> {
    run_on(config, input, chrono::Local::now().date_naive())
}

/// Run reconciliation with an explicit verification date.
pub fn run_on(
    config: &ReconConfig,
    input: &ReconInput<'_>,
    verified_on: NaiveDate,
) -> Result<ReconOutcome, ReconError> {
    // Resolve every column up front so a bad mapping fails before any work.
    let pedro_cols = KeyColumns::resolve(input.pedro, input.pedro_roles, SourceSide::Pedro)?;
    let dga_cols = KeyColumns::resolve(input.dga, input.dga_roles, SourceSide::Dga)?;
    let dga_customer = resolve_column(input.dga, input.dga_roles, Role::CustomerName, SourceSide::Dga)?;

    let mode = config.keys.mode;
    let sep = config.keys.separator.as_str();

    let pedro_keys = pedro_cols.key_rows(input.pedro, mode, sep);
    let dga_keys = dga_cols.key_rows(input.dga, mode, sep);

    let mut diagnostics = RunDiagnostics {
        pedro_rows: input.pedro.len(),
        dga_rows: input.dga.len(),
        pedro_empty_keys: pedro_keys.empty_parts,
        dga_empty_keys: dga_keys.empty_parts,
        pedro_separator_ids: pedro_keys.separator_parts,
        dga_separator_ids: dga_keys.separator_parts,
        ..Default::default()
    };

    if pedro_keys.separator_parts > 0 || dga_keys.separator_parts > 0 {
        log::warn!(
            "{} pedro row(s) and {} dga row(s) have an id containing the key separator '{sep}'; \
             their keys may collide with other rows",
            pedro_keys.separator_parts,
            dga_keys.separator_parts,
        );
    }

    if pedro_keys.empty_parts > 0 || dga_keys.empty_parts > 0 {
        log::warn!(
            "{} pedro row(s) and {} dga row(s) have an empty invoice or order after normalization ({mode}); \
             such rows can only match each other",
            pedro_keys.empty_parts,
            dga_keys.empty_parts,
        );
    }

    let joined = join_exact_key(&pedro_keys.rows, &dga_keys.rows);
    diagnostics.joined_rows = joined.len();

    let dedup = keep_first_per_key(joined);
    diagnostics.duplicates_collapsed = dedup.dropped;

    if !dedup.duplicate_keys.is_empty() {
        match config.duplicates.policy {
            DuplicatePolicy::Reject => {
                let count = dedup.duplicate_keys.len();
                let mut keys = dedup.duplicate_keys;
                keys.truncate(MAX_REPORTED_DUPLICATES);
                return Err(ReconError::DuplicateKeys { count, keys });
            }
            DuplicatePolicy::KeepFirst => {
                log::warn!(
                    "{} key(s) matched more than once; kept the first row of each, dropped {} row(s)",
                    dedup.duplicate_keys.len(),
                    dedup.dropped,
                );
            }
        }
    }

    let records: Vec<MatchRecord> = dedup
        .kept
        .iter()
        .map(|j| {
            let pedro_row = &input.pedro.rows()[j.left_row];
            let dga_row = &input.dga.rows()[j.right_row];
            MatchRecord::new(
                normalize_id(&pedro_row[pedro_cols.invoice], mode),
                normalize_id(&pedro_row[pedro_cols.order], mode),
                dga_row[dga_customer].trim().to_string(),
                verified_on,
            )
        })
        .collect();

    log::info!(
        "reconciled {} pedro row(s) against {} dga row(s): {} match(es)",
        diagnostics.pedro_rows,
        diagnostics.dga_rows,
        records.len(),
    );

    Ok(ReconOutcome {
        records,
        diagnostics,
        verified_on,
    })
}

/// Column index for `role`, or `MissingColumnMapping` if unset or absent.
pub fn resolve_column(
    table: &Table,
    roles: &RoleMap,
    role: Role,
    side: SourceSide,
) -> Result<usize, ReconError> {
    let column = roles.get(role).ok_or(ReconError::MissingColumnMapping {
        side,
        role,
        column: None,
    })?;
    table
        .column_index(column)
        .ok_or_else(|| ReconError::MissingColumnMapping {
            side,
            role,
            column: Some(column.to_string()),
        })
}

struct KeyColumns {
    invoice: usize,
    order: usize,
}

struct KeyRows {
    rows: Vec<KeyedRow>,
    /// Rows whose invoice or order part normalized to "".
    empty_parts: usize,
    /// Rows whose invoice or order part contains the separator.
    separator_parts: usize,
}

impl KeyColumns {
    fn resolve(table: &Table, roles: &RoleMap, side: SourceSide) -> Result<Self, ReconError> {
        Ok(Self {
            invoice: resolve_column(table, roles, Role::InvoiceId, side)?,
            order: resolve_column(table, roles, Role::OrderId, side)?,
        })
    }

    fn key_rows(&self, table: &Table, mode: KeyMode, separator: &str) -> KeyRows {
        let mut empty_parts = 0;
        let mut separator_parts = 0;
        let rows = table
            .rows()
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                let invoice = normalize_id(&cells[self.invoice], mode);
                let order = normalize_id(&cells[self.order], mode);
                if invoice.is_empty() || order.is_empty() {
                    empty_parts += 1;
                }
                if invoice.contains(separator) || order.contains(separator) {
                    separator_parts += 1;
                }
                KeyedRow {
                    row,
                    key: composite_key(&invoice, &order, separator),
                }
            })
            .collect();
        KeyRows {
            rows,
            empty_parts,
            separator_parts,
        }
    }
}
