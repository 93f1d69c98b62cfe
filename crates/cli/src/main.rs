// nfmatch CLI - match a Pedro export against a DGA export by NFe + Pedido

mod detect;
mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use nfmatch_io::IoError;
use nfmatch_recon::{DuplicatePolicy, KeyMode, ReconError, SourceSide};

use exit_codes::{io_exit_code, recon_exit_code, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "nfmatch")]
#[command(about = "Reconcile invoiced orders (NFe + Pedido) between two exports")]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace). RUST_LOG wins when set.
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only print errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which columns would be used as NFe, Pedido and Cliente
    #[command(after_help = "\
Examples:
  nfmatch detect pedro.csv
  nfmatch detect dga.xlsx --json")]
    Detect {
        /// CSV/TSV or Excel file
        file: PathBuf,

        /// Output JSON to stdout instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Reconcile the two exports and write the control report
    #[command(after_help = "\
Rows match when both the normalized NFe and the normalized Pedido are equal.
Unmatched rows are left out; zero matches is still a success.

Examples:
  nfmatch run pedro.csv dga.xlsx
  nfmatch run pedro.csv dga.xlsx --dga-customer 'Razão Social'
  nfmatch run pedro.csv dga.xlsx --config nfmatch.toml --output-dir out/
  nfmatch run pedro.csv dga.xlsx --edits controle_envio_20240315.xlsx
  nfmatch run pedro.csv dga.xlsx --json --no-report")]
    Run(RunArgs),

    /// Validate a config file without running
    #[command(after_help = "\
Examples:
  nfmatch validate nfmatch.toml")]
    Validate {
        /// Path to the TOML config
        config: PathBuf,
    },
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// Pedro export (table A: NFe, Pedido)
    pub pedro: PathBuf,

    /// DGA export (table B: NFe, Pedido, Cliente)
    pub dga: PathBuf,

    /// TOML config with column overrides, key mode, duplicate policy
    #[arg(long, env = "NFMATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Column holding the NFe in the Pedro export
    #[arg(long, value_name = "COL")]
    pub pedro_invoice: Option<String>,

    /// Column holding the Pedido in the Pedro export
    #[arg(long, value_name = "COL")]
    pub pedro_order: Option<String>,

    /// Column holding the NFe in the DGA export
    #[arg(long, value_name = "COL")]
    pub dga_invoice: Option<String>,

    /// Column holding the Pedido in the DGA export
    #[arg(long, value_name = "COL")]
    pub dga_order: Option<String>,

    /// Column holding the customer name in the DGA export
    #[arg(long, value_name = "COL")]
    pub dga_customer: Option<String>,

    /// Key normalization: digits_only (default) or trimmed
    #[arg(long, value_name = "MODE")]
    pub key_mode: Option<KeyMode>,

    /// Duplicate keys after the join: keep_first (default) or reject
    #[arg(long, value_name = "POLICY")]
    pub on_duplicate: Option<DuplicatePolicy>,

    /// CSV/Excel file with NFe, Pedido, Enviado?, Observação columns
    #[arg(long, value_name = "FILE")]
    pub edits: Option<PathBuf>,

    /// Report path (default: <output-dir>/<prefix>_YYYYMMDD.xlsx)
    #[arg(long, short = 'o', conflicts_with_all = ["output_dir", "no_report"])]
    pub output: Option<PathBuf>,

    /// Directory for the report
    #[arg(long, value_name = "DIR", conflicts_with = "no_report")]
    pub output_dir: Option<PathBuf>,

    /// Output JSON (records, summary, diagnostics) to stdout
    #[arg(long)]
    pub json: bool,

    /// Skip writing the xlsx report
    #[arg(long)]
    pub no_report: bool,
}

fn init_logging(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Detect { file, json } => detect::cmd_detect(file, json),
        Commands::Run(args) => recon::cmd_run(args, cli.quiet),
        Commands::Validate { config } => recon::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        let hint = match &err {
            IoError::UnparsableFile { .. } => Some("expected CSV/TSV (any of ; , tab |) or xlsx/xls/ods".to_string()),
            IoError::InvalidEdit { .. } => {
                Some("edits need NFe and Pedido columns; Enviado? takes sim/não, true/false, 1/0 or x".to_string())
            }
            _ => None,
        };
        Self { code: io_exit_code(&err), message: err.to_string(), hint }
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::MissingColumnMapping { side, role, column } => {
                let flag = override_flag(*side, *role);
                Some(match column {
                    None => format!("pass {flag} <COL> or set it under [sources.{side}] in the config"),
                    Some(_) => format!("check {flag} spelling (see `nfmatch detect`)"),
                })
            }
            ReconError::DuplicateKeys { .. } => {
                Some("use --on-duplicate keep_first to keep the first row per key".to_string())
            }
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }
}

/// `--pedro-invoice`, `--dga-customer`, ...
fn override_flag(side: SourceSide, role: nfmatch_recon::Role) -> String {
    let role = match role {
        nfmatch_recon::Role::InvoiceId => "invoice",
        nfmatch_recon::Role::OrderId => "order",
        nfmatch_recon::Role::CustomerName => "customer",
    };
    format!("--{side}-{role}")
}
