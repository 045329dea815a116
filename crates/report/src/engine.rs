use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::merge::merge_reports;
use crate::model::{RawTable, ReportMeta, ReportResult, ReportSummary};
use crate::normalize::{normalize_forms, normalize_orders};
use crate::window::DateWindow;

/// Run the report pipeline over pre-loaded order and form tables.
pub fn run(
    config: &ReportConfig,
    window: &DateWindow,
    orders: &RawTable,
    forms: &RawTable,
) -> Result<ReportResult, ReportError> {
    log::info!("building registration report for {window}");

    let orders = normalize_orders(orders, window)?;
    let forms = normalize_forms(forms, window, &config.filters.denylist)?;

    let merged = merge_reports(&orders.rows, &forms.rows);

    let summary = ReportSummary {
        orders: orders.counts,
        forms: forms.counts,
        joined_rows: merged.joined_rows,
        registrations: merged.rows.len(),
        matched: merged.matched,
        orders_only: merged.orders_only,
        forms_only: merged.forms_only,
    };

    let title = config.output.title.trim().to_string();
    Ok(ReportResult {
        meta: ReportMeta {
            file_name: window.file_name(&title),
            worksheet: window.worksheet_name(),
            title,
            start: window.start,
            end: window.end,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        rows: merged.rows,
    })
}
