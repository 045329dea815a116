//! CLI Exit Code Registry
//!
//! Single source of truth for `regrecon` exit codes. Schedulers and wrapper
//! scripts branch on these, so existing values never change meaning.
//!
//! | Code | Meaning                                             |
//! |------|-----------------------------------------------------|
//! | 0    | Success                                             |
//! | 1    | General error (unspecified)                         |
//! | 2    | Usage error (bad arguments, no input path given)    |
//! | 3    | Config file unreadable or invalid                   |
//! | 4    | Source file missing, unreadable or unsupported      |
//! | 5    | Source is missing a required column                 |
//! | 6    | A row date does not match the source's date format  |
//! | 7    | Report could not be written                         |

use regrecon_report::ReportError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, impossible date window, missing input path.
pub const EXIT_USAGE: u8 = 2;

/// Config file could not be read, parsed or validated.
pub const EXIT_CONFIG: u8 = 3;

/// Source file could not be read (missing, unreadable, unsupported type,
/// unknown worksheet).
pub const EXIT_SOURCE_READ: u8 = 4;

/// Source table lacks a required header.
pub const EXIT_SCHEMA: u8 = 5;

/// Row date did not parse.
pub const EXIT_DATE_PARSE: u8 = 6;

/// Output directory or XLSX could not be written.
pub const EXIT_WRITE: u8 = 7;

/// Map an engine error to its exit code.
pub fn report_exit_code(err: &ReportError) -> u8 {
    match err {
        ReportError::ConfigParse(_) | ReportError::ConfigValidation(_) => EXIT_CONFIG,
        ReportError::MissingColumn { .. } => EXIT_SCHEMA,
        ReportError::DateParse { .. } => EXIT_DATE_PARSE,
        ReportError::InvalidWindow { .. } | ReportError::InvalidWeek { .. } => EXIT_USAGE,
    }
}
