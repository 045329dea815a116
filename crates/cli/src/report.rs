//! `regrecon range`, `regrecon week` and `regrecon check`.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

use regrecon_io::{load_table, xlsx};
use regrecon_report::schema::{SourceSchema, FORM_SCHEMA, ORDER_SCHEMA};
use regrecon_report::{DateWindow, RawTable, ReportConfig, ReportResult};

use crate::exit_codes::EXIT_SCHEMA;
use crate::{CliError, RunArgs, SourceArgs};

/// Config plus input paths after merging the config file with flags.
struct Resolved {
    config: ReportConfig,
    orders: PathBuf,
    forms: PathBuf,
    forms_sheet: Option<String>,
    out_dir: PathBuf,
}

pub fn cmd_range(start: NaiveDate, end: NaiveDate, args: RunArgs) -> Result<(), CliError> {
    let window = DateWindow::new(start, end).map_err(CliError::report)?;
    run_report(window, args)
}

pub fn cmd_week(year: i32, week: u32, args: RunArgs) -> Result<(), CliError> {
    let window = DateWindow::iso_week(year, week).map_err(CliError::report)?;
    run_report(window, args)
}

fn run_report(window: DateWindow, args: RunArgs) -> Result<(), CliError> {
    let resolved = resolve(&args.sources, args.out_dir, args.title)?;

    let orders = load_source(&resolved.orders, None)?;
    let forms = load_source(&resolved.forms, resolved.forms_sheet.as_deref())?;

    let result = regrecon_report::run(&resolved.config, &window, &orders, &forms)
        .map_err(CliError::report)?;

    std::fs::create_dir_all(&resolved.out_dir).map_err(|e| {
        CliError::write(format!("cannot create {}: {e}", resolved.out_dir.display()))
    })?;
    let out_path = resolved.out_dir.join(&result.meta.file_name);
    let export = xlsx::export_report(&result, &out_path, resolved.config.table_style())
        .map_err(CliError::write)?;
    log::info!(
        "wrote {} rows to {} in {}ms",
        export.rows_exported,
        out_path.display(),
        export.export_duration_ms
    );

    if args.json {
        let json_str = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    if !args.quiet {
        print_summary(&result);
        eprintln!("report generated: {}", out_path.display());
    }

    Ok(())
}

/// Human summary to stderr.
fn print_summary(result: &ReportResult) {
    let s = &result.summary;
    eprintln!(
        "{} to {}: {} registrations ({} matched, {} orders only, {} forms only)",
        result.meta.start,
        result.meta.end,
        s.registrations,
        s.matched,
        s.orders_only,
        s.forms_only,
    );
    eprintln!(
        "  orders: {} read, {} in window",
        s.orders.read, s.orders.kept
    );
    eprintln!(
        "  forms:  {} read, {} in window, {} test entries dropped, {} without email",
        s.forms.read, s.forms.kept, s.forms.denylisted, s.forms.blank_email
    );
}

// ============================================================================
// check
// ============================================================================

#[derive(Debug, Serialize)]
struct SourceCheck {
    source: &'static str,
    path: String,
    rows: usize,
    columns: usize,
    missing: Vec<&'static str>,
}

impl SourceCheck {
    fn new(schema: &SourceSchema, path: &Path, table: &RawTable) -> Self {
        Self {
            source: schema.name,
            path: path.display().to_string(),
            rows: table.rows.len(),
            columns: table.headers.len(),
            missing: schema.missing_headers(&table.headers),
        }
    }
}

pub fn cmd_check(sources: SourceArgs, json: bool) -> Result<(), CliError> {
    let resolved = resolve(&sources, None, None)?;

    let orders = load_source(&resolved.orders, None)?;
    let forms = load_source(&resolved.forms, resolved.forms_sheet.as_deref())?;

    let checks = [
        SourceCheck::new(&ORDER_SCHEMA, &resolved.orders, &orders),
        SourceCheck::new(&FORM_SCHEMA, &resolved.forms, &forms),
    ];

    if json {
        let json_str = serde_json::to_string_pretty(&checks)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        for check in &checks {
            if check.missing.is_empty() {
                eprintln!("{}: {} ({} rows) ok", check.source, check.path, check.rows);
            } else {
                eprintln!(
                    "{}: {} ({} rows) missing: {}",
                    check.source,
                    check.path,
                    check.rows,
                    check.missing.join(", ")
                );
            }
        }
    }

    let failing: Vec<&str> = checks
        .iter()
        .filter(|c| !c.missing.is_empty())
        .map(|c| c.source)
        .collect();
    if failing.is_empty() {
        Ok(())
    } else {
        Err(CliError {
            code: EXIT_SCHEMA,
            message: format!("missing required columns in {}", failing.join(" and ")),
            hint: Some("headers must match the export exactly; extra columns are ignored".into()),
        })
    }
}

// ============================================================================
// Shared
// ============================================================================

fn load_source(path: &Path, sheet: Option<&str>) -> Result<RawTable, CliError> {
    load_table(path, sheet).map_err(CliError::source_read)
}

/// Load the config file (if any) and overlay command-line flags. Paths in
/// the config file resolve against its directory; flag paths against the
/// working directory.
fn resolve(
    sources: &SourceArgs,
    out_dir: Option<PathBuf>,
    title: Option<String>,
) -> Result<Resolved, CliError> {
    let (mut config, base_dir) = match &sources.config {
        Some(path) => {
            let config_str = std::fs::read_to_string(path)
                .map_err(|e| CliError::config(format!("cannot read config {}: {e}", path.display())))?;
            let config = ReportConfig::from_toml(&config_str).map_err(CliError::report)?;
            let base_dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
            log::debug!("loaded config {}", path.display());
            (config, base_dir)
        }
        None => (ReportConfig::default(), PathBuf::new()),
    };

    if let Some(title) = title {
        config.output.title = title;
        config.validate().map_err(CliError::report)?;
    }

    let orders = input_path(sources.orders.as_ref(), config.inputs.orders.as_deref(), &base_dir)
        .ok_or_else(|| {
            CliError::usage("no orders file given")
                .with_hint("pass --orders or set inputs.orders in the config file")
        })?;
    let forms = input_path(sources.forms.as_ref(), config.inputs.forms.as_deref(), &base_dir)
        .ok_or_else(|| {
            CliError::usage("no forms file given")
                .with_hint("pass --forms or set inputs.forms in the config file")
        })?;
    let forms_sheet = sources.forms_sheet.clone().or_else(|| config.inputs.forms_sheet.clone());
    let out_dir = out_dir.unwrap_or_else(|| base_dir.join(&config.output.dir));

    Ok(Resolved { config, orders, forms, forms_sheet, out_dir })
}

fn input_path(flag: Option<&PathBuf>, configured: Option<&str>, base_dir: &Path) -> Option<PathBuf> {
    flag.cloned().or_else(|| configured.map(|p| base_dir.join(p)))
}
