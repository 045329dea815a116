// Property-based tests for the join/dedupe step.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use regrecon_report::merge::{merge_reports, outer_join};
use regrecon_report::Registration;

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Small email pool so joins and duplicates are common.
fn arb_email() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("a@x.com".to_string()),
        Just("b@x.com".to_string()),
        Just("c@y.org".to_string()),
        Just("d@y.org".to_string()),
        Just("@y.org".to_string()),
    ]
}

/// Minutes offset within one week; coarse so ties occur.
fn arb_stamp() -> impl Strategy<Value = NaiveDateTime> {
    (0i64..20).prop_map(|slot| {
        NaiveDate::from_ymd_opt(2024, 5, 22)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + chrono::Duration::hours(slot * 8)
    })
}

fn arb_order() -> impl Strategy<Value = Registration> {
    (arb_email(), arb_stamp(), prop::option::of("[0-9]{1,3}")).prop_map(|(email, date, revenue)| {
        Registration {
            date: Some(date),
            revenue,
            email,
            ..Default::default()
        }
    })
}

fn arb_form() -> impl Strategy<Value = Registration> {
    (arb_email(), arb_stamp(), prop::option::of("[A-Z][a-z]{2,6}")).prop_map(|(email, submitted, city)| {
        Registration {
            city,
            email,
            submitted_at: Some(submitted),
            ..Default::default()
        }
    })
}

fn arb_inputs() -> impl Strategy<Value = (Vec<Registration>, Vec<Registration>)> {
    (
        proptest::collection::vec(arb_order(), 0..12),
        proptest::collection::vec(arb_form(), 0..12),
    )
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config())]

    #[test]
    fn one_row_per_email((orders, forms) in arb_inputs()) {
        let out = merge_reports(&orders, &forms);
        let expected: BTreeSet<&str> = orders
            .iter()
            .chain(forms.iter())
            .map(|r| r.email.as_str())
            .collect();
        let actual: Vec<&str> = out.rows.iter().map(|r| r.email.as_str()).collect();
        let unique: BTreeSet<&str> = actual.iter().copied().collect();
        prop_assert_eq!(actual.len(), unique.len());
        prop_assert_eq!(unique, expected);
    }

    #[test]
    fn kept_date_is_group_maximum((orders, forms) in arb_inputs()) {
        let joined = outer_join(&orders, &forms);
        let mut max_date: BTreeMap<&str, Option<NaiveDateTime>> = BTreeMap::new();
        for j in &joined {
            let entry = max_date.entry(j.row.email.as_str()).or_insert(None);
            if j.row.date > *entry {
                *entry = j.row.date;
            }
        }

        let out = merge_reports(&orders, &forms);
        for row in &out.rows {
            prop_assert_eq!(row.date, max_date[row.email.as_str()]);
        }
    }

    #[test]
    fn output_sorted_with_undated_rows_last((orders, forms) in arb_inputs()) {
        let out = merge_reports(&orders, &forms);
        let dates: Vec<Option<NaiveDateTime>> = out.rows.iter().map(|r| r.date).collect();
        let first_undated = dates.iter().position(|d| d.is_none()).unwrap_or(dates.len());
        prop_assert!(dates[first_undated..].iter().all(|d| d.is_none()));
        prop_assert!(dates[..first_undated].windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn merge_is_deterministic((orders, forms) in arb_inputs()) {
        let first = merge_reports(&orders, &forms);
        let second = merge_reports(&orders, &forms);
        prop_assert_eq!(first.rows, second.rows);
    }

    #[test]
    fn joined_row_count_matches_outer_join((orders, forms) in arb_inputs()) {
        let mut order_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for o in &orders {
            *order_counts.entry(o.email.as_str()).or_default() += 1;
        }
        let mut form_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for f in &forms {
            *form_counts.entry(f.email.as_str()).or_default() += 1;
        }
        let emails: BTreeSet<&str> = order_counts.keys().chain(form_counts.keys()).copied().collect();
        let expected: usize = emails
            .iter()
            .map(|e| {
                let m = order_counts.get(e).copied().unwrap_or(0);
                let n = form_counts.get(e).copied().unwrap_or(0);
                m.max(1) * n.max(1)
            })
            .sum();
        prop_assert_eq!(merge_reports(&orders, &forms).joined_rows, expected);
    }
}
