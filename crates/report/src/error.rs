use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (bad title, unknown table style, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Required header absent from a source table.
    #[error("{source_name}: missing column '{column}'")]
    MissingColumn { source_name: String, column: String },
    /// Row date does not match the source's date format. `row` is 1-based
    /// and counts data rows only.
    #[error("{source_name}, row {row}: cannot parse date '{value}' (expected {format})")]
    DateParse {
        source_name: String,
        row: usize,
        value: String,
        format: String,
    },
    /// Start date after end date.
    #[error("invalid date range: start {start} is after end {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },
    /// ISO week that does not exist in the given ISO year.
    #[error("invalid ISO week: {year}-W{week:02}")]
    InvalidWeek { year: i32, week: u32 },
}
