//! Property tests for the range filter and the views built on it.
//!
//! Uses proptest to verify:
//! 1. Every selected row lies within the bounds, none outside are lost, file order is kept
//!    even when dates are unsorted
//! 2. Filtering is idempotent
//! 3. Inverted bounds return the whole dataset with a warning
//! 4. Fully populated columns report `count == rows` and never appear as missing
//! 5. The correlation matrix is symmetric with a unit diagonal where defined

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use gold_dashboard::data::charts::correlation_matrix;
use gold_dashboard::data::filter::{filter, DateRange, FilteredView};
use gold_dashboard::data::model::{Dataset, CLOSE, DAILY_RETURN, MA_30};
use gold_dashboard::data::summary::summarize;
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

fn offset(days: u64) -> NaiveDate {
    base().checked_add_days(Days::new(days)).unwrap()
}

type Rows = Vec<(NaiveDate, Vec<Option<f64>>)>;

/// Rows with non-decreasing dates (gaps allowed) and a fully populated
/// `close`; `ma_30` is sometimes missing.
fn arb_rows() -> impl Strategy<Value = Rows> {
    prop::collection::vec((0u64..4, 1.0..2000.0_f64, -0.05..0.05_f64, prop::option::of(1.0..2000.0_f64)), 0..60)
        .prop_map(|rows| {
            let mut day = 0;
            rows.into_iter()
                .map(|(step, close, ret, ma)| {
                    day += step;
                    (offset(day), vec![Some(close), Some(ret), ma])
                })
                .collect::<Rows>()
        })
}

fn to_dataset(rows: Rows) -> Arc<Dataset> {
    Arc::new(Dataset::from_numeric_rows(&[CLOSE, DAILY_RETURN, MA_30], rows))
}

fn arb_dataset() -> impl Strategy<Value = Arc<Dataset>> {
    arb_rows().prop_map(to_dataset)
}

/// Same rows in arbitrary order, so file order and date order disagree.
fn arb_shuffled_dataset() -> impl Strategy<Value = Arc<Dataset>> {
    arb_rows().prop_shuffle().prop_map(to_dataset)
}

fn arb_bounds() -> impl Strategy<Value = (NaiveDate, NaiveDate)> {
    (0u64..250, 0u64..250).prop_map(|(a, b)| (offset(a.min(b)), offset(a.max(b))))
}

// ── 1–3. Range filter ────────────────────────────────────────────────

proptest! {
    #[test]
    fn selected_rows_are_exactly_those_in_range(ds in arb_dataset(), (start, end) in arb_bounds()) {
        let out = filter(&ds, DateRange::new(start, end));
        prop_assert!(out.warning.is_none());

        let expected: Vec<usize> = ds
            .records()
            .iter()
            .enumerate()
            .filter(|(_, r)| start <= r.date && r.date <= end)
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(out.view.rows(), expected.as_slice());
        prop_assert!(out.view.dates().all(|d| start <= d && d <= end));
    }

    #[test]
    fn unordered_rows_keep_file_order(ds in arb_shuffled_dataset(), (start, end) in arb_bounds()) {
        let out = filter(&ds, DateRange::new(start, end));

        prop_assert!(out.view.rows().windows(2).all(|w| w[0] < w[1]));
        let expected: Vec<NaiveDate> = ds
            .records()
            .iter()
            .map(|r| r.date)
            .filter(|d| start <= *d && *d <= end)
            .collect();
        prop_assert_eq!(out.view.dates().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn filtering_twice_changes_nothing(ds in arb_dataset(), (start, end) in arb_bounds()) {
        let range = DateRange::new(start, end);
        let once = filter(&ds, range).view;
        let twice = once.refine(range);
        prop_assert!(twice.warning.is_none());
        prop_assert_eq!(twice.view, once);
    }

    #[test]
    fn inverted_bounds_return_everything(ds in arb_dataset(), (start, end) in arb_bounds()) {
        prop_assume!(start < end);
        let out = filter(&ds, DateRange::new(end, start));
        prop_assert!(out.warning.is_some());
        prop_assert_eq!(out.view, FilteredView::all(Arc::clone(&ds)));
    }
}

// ── 4–5. Derived views ───────────────────────────────────────────────

proptest! {
    #[test]
    fn complete_columns_are_fully_counted(ds in arb_dataset(), (start, end) in arb_bounds()) {
        let view = filter(&ds, DateRange::new(start, end)).view;
        let report = summarize(&view);

        prop_assert_eq!(report.row_count, view.len());
        prop_assert_eq!(report.stats_for(CLOSE).unwrap().count, view.len());
        prop_assert_eq!(report.stats_for(DAILY_RETURN).unwrap().count, view.len());
        prop_assert!(report.missing.iter().all(|m| m.column == MA_30 && m.missing > 0));
    }

    #[test]
    fn correlation_is_symmetric(ds in arb_dataset()) {
        let m = correlation_matrix(&FilteredView::all(Arc::clone(&ds)));
        for i in 0..m.len() {
            for j in 0..m.len() {
                let (a, b) = (m.get(i, j), m.get(j, i));
                prop_assert!(a == b || (a.is_nan() && b.is_nan()));
                if !a.is_nan() {
                    prop_assert!((-1.0..=1.0).contains(&a));
                }
            }
            let diag = m.get(i, i);
            prop_assert!(diag.is_nan() || diag == 1.0);
        }
    }
}

// ── Concrete scenarios ───────────────────────────────────────────────

fn five_days() -> Arc<Dataset> {
    let closes = [10.0, 20.0, 30.0, 40.0, 30.0];
    let rows = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| (offset(i as u64), vec![Some(c)]))
        .collect();
    Arc::new(Dataset::from_numeric_rows(&[CLOSE], rows))
}

#[test]
fn middle_three_days() {
    let ds = five_days();
    let view = filter(&ds, DateRange::new(offset(1), offset(3))).view;
    assert_eq!(view.numeric_column(CLOSE).unwrap(), vec![20.0, 30.0, 40.0]);

    let close = summarize(&view).stats_for(CLOSE).cloned().unwrap();
    assert_eq!(close.count, 3);
    assert_eq!(close.mean, 30.0);
    assert_eq!(close.min, 20.0);
    assert_eq!(close.max, 40.0);
}

#[test]
fn reversed_bounds_keep_all_five_rows() {
    let ds = five_days();
    let out = filter(&ds, DateRange::new(offset(3), offset(1)));
    assert_eq!(out.view.len(), 5);
    assert!(out.warning.is_some());
}

#[test]
fn single_row_is_degenerate() {
    let ds = five_days();
    let view = filter(&ds, DateRange::new(offset(2), offset(2))).view;
    assert!(summarize(&view).stats_for(CLOSE).unwrap().std.is_nan());
    let m = correlation_matrix(&view);
    assert!(m.values.iter().flatten().all(|r| r.is_nan()));
}
