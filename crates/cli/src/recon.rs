//! `nfmatch run` / `nfmatch validate` - the reconciliation pipeline.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use nfmatch_recon::session::EditReport;
use nfmatch_recon::{
    classify_columns, MatchRecord, ReconConfig, ReconInput, ReconSession, ReconSummary, RoleMap, Table,
};
use nfmatch_recon::model::RunDiagnostics;
use serde::Serialize;

use crate::exit_codes::{EXIT_CONFIG_INVALID, EXIT_ERROR, EXIT_REPORT};
use crate::{CliError, RunArgs};

#[derive(Serialize)]
struct RunOutput<'a> {
    verified_on: NaiveDate,
    pedro_roles: &'a RoleMap,
    dga_roles: &'a RoleMap,
    summary: ReconSummary,
    diagnostics: &'a RunDiagnostics,
    #[serde(skip_serializing_if = "Option::is_none")]
    edits: Option<&'a EditReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<String>,
    records: &'a [MatchRecord],
}

fn load_config(path: Option<&Path>) -> Result<ReconConfig, CliError> {
    let Some(path) = path else {
        return Ok(ReconConfig::default());
    };
    let config_str = std::fs::read_to_string(path)
        .map_err(|e| CliError::args(format!("cannot read config {}: {e}", path.display())))?;
    ReconConfig::from_toml(&config_str).map_err(|e| {
        CliError::new(EXIT_CONFIG_INVALID, format!("{}: {e}", path.display()))
            .with_hint("run `nfmatch validate <config>` for details")
    })
}

/// Classifier guess, then config overrides, then flag overrides.
fn resolve_roles(table: &Table, from_config: &RoleMap, from_flags: &RoleMap, side: &str) -> RoleMap {
    let detected = classify_columns(table.columns());
    log::info!(
        "{side}: detected invoice={:?} order={:?} customer={:?}",
        detected.invoice,
        detected.order,
        detected.customer
    );
    detected.overridden_by(from_config).overridden_by(from_flags)
}

pub fn cmd_run(args: RunArgs, quiet: bool) -> Result<(), CliError> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(mode) = args.key_mode {
        config.keys.mode = mode;
    }
    if let Some(policy) = args.on_duplicate {
        config.duplicates.policy = policy;
    }

    let pedro = nfmatch_io::load_table(&args.pedro)?;
    let dga = nfmatch_io::load_table(&args.dga)?;

    let pedro_flags = RoleMap {
        invoice: args.pedro_invoice,
        order: args.pedro_order,
        customer: None,
    };
    let dga_flags = RoleMap {
        invoice: args.dga_invoice,
        order: args.dga_order,
        customer: args.dga_customer,
    };
    let pedro_roles = resolve_roles(&pedro, &config.sources.pedro, &pedro_flags, "pedro");
    let dga_roles = resolve_roles(&dga, &config.sources.dga, &dga_flags, "dga");

    let input = ReconInput {
        pedro: &pedro,
        pedro_roles: &pedro_roles,
        dga: &dga,
        dga_roles: &dga_roles,
    };
    let outcome = nfmatch_recon::run(&config, &input)?;
    let verified_on = outcome.verified_on;
    let diagnostics = outcome.diagnostics.clone();
    let mut session = ReconSession::from(outcome);

    let edit_report = match args.edits {
        Some(ref path) => {
            let edits = nfmatch_io::load_edits(path, config.keys.mode)?;
            let report = session.apply_edits(&edits);
            log::info!("{}: applied {} edit(s)", path.display(), report.applied);
            Some(report)
        }
        None => None,
    };

    let summary = session.summary();

    let report_path = if args.no_report {
        None
    } else {
        let path = match args.output {
            Some(path) => path,
            None => {
                let dir = args.output_dir.unwrap_or_else(|| PathBuf::from("."));
                dir.join(nfmatch_io::report_file_name(&config.report.prefix, verified_on))
            }
        };
        write_report(&path, session.records(), &summary)?;
        Some(path)
    };

    if args.json {
        let output = RunOutput {
            verified_on,
            pedro_roles: &pedro_roles,
            dga_roles: &dga_roles,
            summary,
            diagnostics: &diagnostics,
            edits: edit_report.as_ref(),
            report: report_path.as_ref().map(|p| p.display().to_string()),
            records: session.records(),
        };
        let json_str = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    if !quiet {
        eprintln!("{} registros correspondentes encontrados", summary.total);
        eprintln!(
            "enviados: {}, pendentes: {} (pedro: {} linha(s), dga: {} linha(s), duplicados descartados: {})",
            summary.sent, summary.pending, diagnostics.pedro_rows, diagnostics.dga_rows, diagnostics.duplicates_collapsed,
        );
        if let Some(ref path) = report_path {
            eprintln!("wrote {}", path.display());
        }
    }

    Ok(())
}

fn write_report(path: &Path, records: &[MatchRecord], summary: &ReconSummary) -> Result<(), CliError> {
    let bytes = nfmatch_io::render_report(records, summary)?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .map_err(|e| CliError::new(EXIT_REPORT, format!("cannot create {}: {e}", dir.display())))?;
    }
    std::fs::write(path, bytes)
        .map_err(|e| CliError::new(EXIT_REPORT, format!("cannot write {}: {e}", path.display())))?;
    log::debug!("report: {} ({})", path.display(), nfmatch_io::REPORT_MIME);
    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(Some(&config_path))?;
    eprintln!(
        "valid: key mode {}, separator '{}', duplicates {:?}, report prefix '{}'",
        config.keys.mode, config.keys.separator, config.duplicates.policy, config.report.prefix,
    );
    for (side, roles) in [("pedro", &config.sources.pedro), ("dga", &config.sources.dga)] {
        if *roles != RoleMap::default() {
            eprintln!(
                "  {side}: invoice={} order={} customer={}",
                roles.invoice.as_deref().unwrap_or("(auto)"),
                roles.order.as_deref().unwrap_or("(auto)"),
                roles.customer.as_deref().unwrap_or("(auto)"),
            );
        }
    }
    Ok(())
}
