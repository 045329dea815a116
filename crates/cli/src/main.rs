mod exit_codes;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_codes::*;
use regrecon_report::ReportError;

#[derive(Parser)]
#[command(name = "regrecon")]
#[command(about = "Weekly registration report: merge commerce orders with form entries")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the report for an explicit date range (both ends inclusive)
    #[command(after_help = "\
Examples:
  regrecon range --start 2024-05-22 --end 2024-05-28 --orders orders.csv --forms wpforms.xlsx
  regrecon range --start 2024-05-01 --end 2024-05-31 --config regrecon.toml --json")]
    Range {
        /// First day of the window (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Last day of the window (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Build the report for one ISO week (Monday through Sunday)
    #[command(after_help = "\
Examples:
  regrecon week --year 2024 --week 21 --config regrecon.toml
  regrecon week --year 2025 --week 1 --orders orders.csv --forms wpforms.xlsx --out-dir reports")]
    Week {
        /// ISO week-numbering year
        #[arg(long)]
        year: i32,

        /// ISO week number (1-53)
        #[arg(long)]
        week: u32,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Load both sources and verify their headers, without writing anything
    #[command(after_help = "\
Examples:
  regrecon check --orders orders.csv --forms wpforms.xlsx
  regrecon check --config regrecon.toml --json")]
    Check {
        #[command(flatten)]
        sources: SourceArgs,

        /// Print the check result as JSON on stdout
        #[arg(long)]
        json: bool,
    },
}

/// Where the two exports come from.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Commerce order export (.csv, .tsv, .xlsx, .xls, .xlsb, .ods)
    #[arg(long)]
    pub orders: Option<PathBuf>,

    /// Form entry export (.csv, .tsv, .xlsx, .xls, .xlsb, .ods)
    #[arg(long)]
    pub forms: Option<PathBuf>,

    /// Worksheet to read from a spreadsheet form export (default: first sheet)
    #[arg(long)]
    pub forms_sheet: Option<String>,

    /// TOML config file; flags given on the command line take precedence
    #[arg(long, env = "REGRECON_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Directory the report is written to (created if missing)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Report title, used in the output file name
    #[arg(long)]
    pub title: Option<String>,

    /// Print the full report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Suppress the summary and completion message
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
        )
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // Also installs the log -> tracing bridge for the library crates
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Range { start, end, run } => report::cmd_range(start, end, run),
        Commands::Week { year, week, run } => report::cmd_week(year, week, run),
        Commands::Check { sources, json } => report::cmd_check(sources, json),
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

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_CONFIG, message: msg.into(), hint: None }
    }

    pub fn source_read(msg: impl Into<String>) -> Self {
        Self { code: EXIT_SOURCE_READ, message: msg.into(), hint: None }
    }

    pub fn write(msg: impl Into<String>) -> Self {
        Self { code: EXIT_WRITE, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Create error from an engine error with the matching exit code.
    pub fn report(err: ReportError) -> Self {
        let code = report_exit_code(&err);
        let hint = match &err {
            ReportError::MissingColumn { .. } => {
                Some("run `regrecon check` to list every missing column".to_string())
            }
            ReportError::InvalidWeek { .. } => {
                Some("ISO years have 52 or 53 weeks; week 1 contains the first Thursday".to_string())
            }
            ReportError::DateParse { source_name, .. } if source_name == "forms" => {
                Some("form entries look like: May 23, 2024 02:05 PM".to_string())
            }
            ReportError::DateParse { .. } => {
                Some("order dates look like: 2024-05-23 14:05".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
