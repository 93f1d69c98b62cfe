//! `nfmatch detect` - show the classifier's column guesses for one file.

use std::path::PathBuf;

use nfmatch_recon::{classify_columns, Role, RoleMap};
use serde::Serialize;

use crate::exit_codes::EXIT_ERROR;
use crate::CliError;

#[derive(Serialize)]
struct DetectOutput<'a> {
    file: String,
    columns: &'a [String],
    rows: usize,
    roles: &'a RoleMap,
}

pub fn cmd_detect(file: PathBuf, json: bool) -> Result<(), CliError> {
    let table = nfmatch_io::load_table(&file)?;
    let roles = classify_columns(table.columns());

    if json {
        let output = DetectOutput {
            file: file.display().to_string(),
            columns: table.columns(),
            rows: table.len(),
            roles: &roles,
        };
        let json_str = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
        return Ok(());
    }

    println!("{}: {} column(s), {} row(s)", file.display(), table.columns().len(), table.len());
    for role in Role::ALL {
        let column = roles.get(role).unwrap_or("-");
        println!("  {:<26} {}", role.to_string(), column);
    }
    Ok(())
}
