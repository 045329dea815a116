use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;

use crate::model::Registration;

/// One row of the outer join, remembering which inputs produced it.
#[derive(Debug, Clone)]
pub struct JoinedRow {
    pub row: Registration,
    pub order_pos: Option<usize>,
    pub form_pos: Option<usize>,
}

impl JoinedRow {
    /// Dedup rank within an email group; the maximum is kept.
    ///
    /// Order date, then form entry date (null lowest for both), then the
    /// number of populated report fields, then input position (later order
    /// row, then later form row).
    fn rank(&self) -> (Option<NaiveDateTime>, Option<NaiveDateTime>, usize, Option<usize>, Option<usize>) {
        (
            self.row.date,
            self.row.submitted_at,
            self.row.populated_fields(),
            self.order_pos,
            self.form_pos,
        )
    }
}

/// Merged report rows plus join statistics.
#[derive(Debug, Clone, Default)]
pub struct MergeOutput {
    pub rows: Vec<Registration>,
    pub joined_rows: usize,
    pub matched: usize,
    pub orders_only: usize,
    pub forms_only: usize,
}

/// Full outer join on email with the key coalesced.
///
/// An email with `m` order rows and `n` form rows yields `m * n` rows; emails
/// present on one side pass through unchanged.
pub fn outer_join(orders: &[Registration], forms: &[Registration]) -> Vec<JoinedRow> {
    let mut forms_by_email: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (fi, form) in forms.iter().enumerate() {
        forms_by_email.entry(form.email.as_str()).or_default().push(fi);
    }
    let order_emails: BTreeSet<&str> = orders.iter().map(|o| o.email.as_str()).collect();

    let mut joined = Vec::with_capacity(orders.len() + forms.len());

    for (oi, order) in orders.iter().enumerate() {
        match forms_by_email.get(order.email.as_str()) {
            Some(form_idxs) => {
                for &fi in form_idxs {
                    joined.push(JoinedRow {
                        row: order.coalesce(&forms[fi]),
                        order_pos: Some(oi),
                        form_pos: Some(fi),
                    });
                }
            }
            None => joined.push(JoinedRow {
                row: order.clone(),
                order_pos: Some(oi),
                form_pos: None,
            }),
        }
    }

    for (fi, form) in forms.iter().enumerate() {
        if !order_emails.contains(form.email.as_str()) {
            joined.push(JoinedRow {
                row: form.clone(),
                order_pos: None,
                form_pos: Some(fi),
            });
        }
    }

    joined
}

/// Reduce each email group to its highest-ranked row.
pub fn dedupe_by_email(joined: Vec<JoinedRow>) -> Vec<JoinedRow> {
    let mut best: BTreeMap<String, JoinedRow> = BTreeMap::new();
    for candidate in joined {
        match best.get(&candidate.row.email) {
            Some(current) if current.rank() >= candidate.rank() => {}
            _ => {
                best.insert(candidate.row.email.clone(), candidate);
            }
        }
    }
    best.into_values().collect()
}

/// Ascending by order date, undated rows last; then form entry date (nulls
/// last), then email.
pub fn report_order(a: &Registration, b: &Registration) -> Ordering {
    fn nulls_last(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>) -> Ordering {
        match (a, b) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
    nulls_last(a.date, b.date)
        .then_with(|| nulls_last(a.submitted_at, b.submitted_at))
        .then_with(|| a.email.cmp(&b.email))
}

/// Join, dedupe and sort normalized order and form rows into report rows.
pub fn merge_reports(orders: &[Registration], forms: &[Registration]) -> MergeOutput {
    let joined = outer_join(orders, forms);
    let joined_rows = joined.len();

    let kept = dedupe_by_email(joined);

    let mut out = MergeOutput {
        joined_rows,
        ..Default::default()
    };
    for j in &kept {
        match (j.order_pos, j.form_pos) {
            (Some(_), Some(_)) => out.matched += 1,
            (Some(_), None) => out.orders_only += 1,
            _ => out.forms_only += 1,
        }
    }

    out.rows = kept.into_iter().map(|j| j.row).collect();
    out.rows.sort_by(report_order);

    log::info!(
        "merged {} joined rows into {} registrations ({} matched, {} orders only, {} forms only)",
        joined_rows,
        out.rows.len(),
        out.matched,
        out.orders_only,
        out.forms_only,
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn order(email: &str, date: &str, revenue: &str) -> Registration {
        Registration {
            date: Some(dt(date)),
            revenue: Some(revenue.into()),
            email: email.into(),
            ..Default::default()
        }
    }

    fn form(email: &str, submitted: &str, city: &str) -> Registration {
        Registration {
            city: Some(city.into()),
            email: email.into(),
            submitted_at: Some(dt(submitted)),
            ..Default::default()
        }
    }

    #[test]
    fn matching_order_and_form_merge_into_one_row() {
        let out = merge_reports(
            &[order("a@x.com", "2024-05-23 10:00", "50")],
            &[form("a@x.com", "2024-05-24 09:00", "Denver")],
        );
        assert_eq!(out.rows.len(), 1);
        let row = &out.rows[0];
        assert_eq!(row.email, "a@x.com");
        assert_eq!(row.revenue.as_deref(), Some("50"));
        assert_eq!(row.city.as_deref(), Some("Denver"));
        assert_eq!(row.date, Some(dt("2024-05-23 10:00")));
        assert_eq!(out.matched, 1);
    }

    #[test]
    fn later_order_wins() {
        let out = merge_reports(
            &[
                order("a@x.com", "2024-05-25 10:00", "70"),
                order("a@x.com", "2024-05-23 10:00", "50"),
            ],
            &[],
        );
        assert_eq!(out.joined_rows, 2);
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].date, Some(dt("2024-05-25 10:00")));
        assert_eq!(out.rows[0].revenue.as_deref(), Some("70"));
    }

    #[test]
    fn cartesian_join_then_latest_form_breaks_date_tie() {
        let out = merge_reports(
            &[order("a@x.com", "2024-05-23 10:00", "50")],
            &[
                form("a@x.com", "2024-05-26 09:00", "Boulder"),
                form("a@x.com", "2024-05-24 09:00", "Denver"),
            ],
        );
        assert_eq!(out.joined_rows, 2);
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].city.as_deref(), Some("Boulder"));
    }

    #[test]
    fn form_only_rows_trail_dated_rows() {
        let out = merge_reports(
            &[
                order("b@x.com", "2024-05-27 10:00", "50"),
                order("a@x.com", "2024-05-22 10:00", "50"),
            ],
            &[
                form("z@x.com", "2024-05-22 08:00", "Aspen"),
                form("c@x.com", "2024-05-23 08:00", "Vail"),
            ],
        );
        let emails: Vec<&str> = out.rows.iter().map(|r| r.email.as_str()).collect();
        assert_eq!(emails, vec!["a@x.com", "b@x.com", "z@x.com", "c@x.com"]);
        assert_eq!(out.orders_only, 2);
        assert_eq!(out.forms_only, 2);
        assert!(out.rows[2].date.is_none());
    }

    #[test]
    fn identical_rows_resolve_to_last_input() {
        let mut first = order("a@x.com", "2024-05-23 10:00", "50");
        first.first_name = Some("First".into());
        let mut second = order("a@x.com", "2024-05-23 10:00", "50");
        second.first_name = Some("Second".into());
        let out = merge_reports(&[first, second], &[]);
        assert_eq!(out.rows[0].first_name.as_deref(), Some("Second"));
    }

    #[test]
    fn richer_row_wins_equal_dates() {
        let sparse = order("a@x.com", "2024-05-23 10:00", "50");
        let mut rich = order("a@x.com", "2024-05-23 10:00", "50");
        rich.last_name = Some("Lee".into());
        let out = merge_reports(&[rich, sparse], &[]);
        assert_eq!(out.rows[0].last_name.as_deref(), Some("Lee"));
    }

    #[test]
    fn empty_inputs_produce_empty_report() {
        let out = merge_reports(&[], &[]);
        assert!(out.rows.is_empty());
        assert_eq!(out.joined_rows, 0);
    }
}
