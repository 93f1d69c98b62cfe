use thiserror::Error;

use crate::model::{Role, SourceSide};

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (bad separator, empty prefix, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// A required role is unusable: either nothing was selected for it
    /// (`column == None`) or the selected column is not in the table.
    #[error("{side}: {}", missing_mapping_detail(*.role, .column.as_deref()))]
    MissingColumnMapping {
        side: SourceSide,
        role: Role,
        column: Option<String>,
    },
    /// Duplicate composite keys under `DuplicatePolicy::Reject`.
    #[error("{count} duplicate key(s) after join: {}", .keys.join(", "))]
    DuplicateKeys { count: usize, keys: Vec<String> },
    /// Edit addressed a record index past the end of the session.
    #[error("record {index} out of range ({len} records)")]
    EditOutOfRange { index: usize, len: usize },
}

fn missing_mapping_detail(role: Role, column: Option<&str>) -> String {
    match column {
        None => format!("no column selected for {role}"),
        Some(column) => format!("column '{column}' selected for {role} not found"),
    }
}
