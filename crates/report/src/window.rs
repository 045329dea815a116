use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::Serialize;

use crate::error::ReportError;

/// Inclusive calendar-date interval the report covers.
///
/// Both selection modes (explicit range, ISO week) resolve to this before any
/// filtering runs, so normalizers have a single code path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ReportError> {
        if start > end {
            return Err(ReportError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Monday through Sunday of ISO week `week` in ISO year `year`.
    pub fn iso_week(year: i32, week: u32) -> Result<Self, ReportError> {
        let invalid = || ReportError::InvalidWeek { year, week };
        let start = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).ok_or_else(invalid)?;
        let end = NaiveDate::from_isoywd_opt(year, week, Weekday::Sun).ok_or_else(invalid)?;
        Ok(Self { start, end })
    }

    /// True when the timestamp's calendar date lies within the window. Both
    /// boundary days are included in full.
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        let date = at.date();
        self.start <= date && date <= self.end
    }

    /// `MM-DD to MM-DD`
    pub fn label(&self) -> String {
        format!("{} to {}", self.start.format("%m-%d"), self.end.format("%m-%d"))
    }

    /// Report file name, keyed by the end date's year.
    pub fn file_name(&self, title: &str) -> String {
        format!("{} - {} {}.xlsx", self.end.year(), title, self.label())
    }

    pub fn worksheet_name(&self) -> String {
        format!("Registrations {}", self.label())
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}
