//! CLI Exit Code Registry
//!
//! Single source of truth for all `nfmatch` exit codes. Scripts rely on
//! these values.
//!
//! | Code | Meaning                                             |
//! |------|-----------------------------------------------------|
//! | 0    | Success (including zero matches)                    |
//! | 1    | General error (unspecified)                         |
//! | 2    | Usage error (bad args, unreadable file)             |
//! | 3    | Input file could not be parsed as CSV or Excel      |
//! | 4    | A required column is unmapped or not in the table   |
//! | 5    | Duplicate keys found under `--on-duplicate reject`  |
//! | 6    | Config file invalid                                 |
//! | 7    | Report could not be built or written                |

use nfmatch_io::IoError;
use nfmatch_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing or unreadable file.
pub const EXIT_USAGE: u8 = 2;

/// Input is neither delimited text nor a readable spreadsheet.
pub const EXIT_UNPARSABLE: u8 = 3;

/// A required role has no column, or the chosen column does not exist.
pub const EXIT_MISSING_MAPPING: u8 = 4;

/// Duplicate composite keys and the policy is `reject`.
pub const EXIT_DUPLICATES: u8 = 5;

/// Config file failed to parse or validate.
pub const EXIT_CONFIG_INVALID: u8 = 6;

/// Report rendering or writing failed.
pub const EXIT_REPORT: u8 = 7;

pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_CONFIG_INVALID,
        ReconError::MissingColumnMapping { .. } => EXIT_MISSING_MAPPING,
        ReconError::DuplicateKeys { .. } => EXIT_DUPLICATES,
        ReconError::EditOutOfRange { .. } => EXIT_ERROR,
    }
}

pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Read { .. } => EXIT_USAGE,
        IoError::UnparsableFile { .. } => EXIT_UNPARSABLE,
        IoError::InvalidEdit { .. } => EXIT_USAGE,
        IoError::Report(_) => EXIT_REPORT,
    }
}
