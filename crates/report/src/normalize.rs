use chrono::NaiveDateTime;

use crate::error::ReportError;
use crate::model::{Field, RawCell, RawTable, Registration, SourceCounts};
use crate::schema::{SourceSchema, FORM_SCHEMA, ORDER_SCHEMA};
use crate::window::DateWindow;

/// Local-parts of seeded test submissions.
pub const DEFAULT_DENYLIST: [&str; 3] = ["ss", "cr", "xx"];

/// Rows that survived normalization plus what happened to the rest.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub rows: Vec<Registration>,
    pub counts: SourceCounts,
}

/// Project order rows into the commerce fields and keep those in `window`.
pub fn normalize_orders(table: &RawTable, window: &DateWindow) -> Result<Normalized, ReportError> {
    normalize(&ORDER_SCHEMA, table, window, &[])
}

/// Project form rows into the contact fields, drop denylisted test
/// submissions and keep those in `window`.
pub fn normalize_forms(
    table: &RawTable,
    window: &DateWindow,
    denylist: &[String],
) -> Result<Normalized, ReportError> {
    normalize(&FORM_SCHEMA, table, window, denylist)
}

/// Everything before the first `@`; the whole address when there is none.
pub fn local_part(email: &str) -> &str {
    match email.split_once('@') {
        Some((local, _)) => local,
        None => email,
    }
}

fn parse_datetime(cell: &RawCell, format: &str) -> Option<NaiveDateTime> {
    match cell {
        RawCell::DateTime(dt) => Some(*dt),
        RawCell::Text(s) => NaiveDateTime::parse_from_str(s.trim(), format).ok(),
        RawCell::Empty | RawCell::Number(_) => None,
    }
}

fn normalize(
    schema: &SourceSchema,
    table: &RawTable,
    window: &DateWindow,
    denylist: &[String],
) -> Result<Normalized, ReportError> {
    let resolved = schema.resolve(&table.headers)?;

    let mut out = Normalized::default();
    out.counts.read = table.rows.len();

    // Parse every timestamp first: one malformed date aborts the run even if
    // its row would have been filtered out.
    let mut stamps = Vec::with_capacity(table.rows.len());
    for row in 0..table.rows.len() {
        let cell = table.cell(row, resolved.date_idx);
        let stamp = parse_datetime(cell, schema.date_format).ok_or_else(|| ReportError::DateParse {
            source_name: schema.name.into(),
            row: row + 1,
            value: cell.as_text().unwrap_or_default(),
            format: schema.date_format.into(),
        })?;
        stamps.push(stamp);
    }

    for (row, stamp) in stamps.into_iter().enumerate() {
        let mut reg = Registration::default();
        for &(col, field) in &resolved.columns {
            if let Some(value) = table.cell(row, col).as_text() {
                reg.fill_text(field, value);
            }
        }
        reg.email = reg.email.trim().to_lowercase();

        if reg.email.is_empty() {
            log::warn!("{}: row {} has no email, skipped", schema.name, row + 1);
            out.counts.blank_email += 1;
            continue;
        }

        let local = local_part(&reg.email);
        if denylist.iter().any(|d| d == local) {
            log::debug!("{}: row {} is a test submission ({}), skipped", schema.name, row + 1, reg.email);
            out.counts.denylisted += 1;
            continue;
        }

        if !window.contains(stamp) {
            out.counts.outside_window += 1;
            continue;
        }

        match schema.date_field {
            Field::Date => reg.date = Some(stamp),
            _ => reg.submitted_at = Some(stamp),
        }
        out.rows.push(reg);
    }

    out.counts.kept = out.rows.len();
    log::info!(
        "{}: {} read, {} kept, {} outside {}, {} test, {} without email",
        schema.name,
        out.counts.read,
        out.counts.kept,
        out.counts.outside_window,
        window,
        out.counts.denylisted,
        out.counts.blank_email,
    );

    Ok(out)
}
