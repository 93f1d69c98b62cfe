//! `nfmatch-recon`: invoice/order reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded tables, returns match records.
//! No CLI or file IO dependencies.

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod session;
pub mod table;

pub use classify::classify_columns;
pub use config::{DuplicatePolicy, ReconConfig};
pub use engine::{run, run_on, ReconInput};
pub use error::ReconError;
pub use model::{MatchRecord, ReconOutcome, ReconSummary, Role, RoleMap, SourceSide};
pub use normalize::KeyMode;
pub use session::{compute_summary, RecordEdit, ReconSession};
pub use table::Table;
