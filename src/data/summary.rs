use super::filter::FilteredView;
use super::stats::{mean, quantile_sorted, sample_std, sorted};

// ---------------------------------------------------------------------------
// Summary report
// ---------------------------------------------------------------------------

/// Descriptive statistics for one numeric column, computed over its
/// non-missing values.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl ColumnStats {
    /// Compute over `values`, skipping NaNs. All-NaN or empty input gives
    /// `count == 0` and NaN everywhere else.
    pub fn compute(column: &str, values: &[f64]) -> Self {
        let present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        let asc = sorted(&present);
        Self {
            column: column.to_string(),
            count: present.len(),
            mean: mean(&present),
            std: sample_std(&present),
            min: asc.first().copied().unwrap_or(f64::NAN),
            q25: quantile_sorted(&asc, 0.25),
            median: quantile_sorted(&asc, 0.5),
            q75: quantile_sorted(&asc, 0.75),
            max: asc.last().copied().unwrap_or(f64::NAN),
        }
    }

    /// `(label, value)` pairs in the conventional describe-table order.
    pub fn rows(&self) -> [(&'static str, f64); 8] {
        [
            ("count", self.count as f64),
            ("mean", self.mean),
            ("std", self.std),
            ("min", self.min),
            ("25%", self.q25),
            ("50%", self.median),
            ("75%", self.q75),
            ("max", self.max),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingCount {
    pub column: String,
    pub missing: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryReport {
    /// One entry per numeric column, schema order.
    pub stats: Vec<ColumnStats>,
    /// Only columns with at least one missing cell.
    pub missing: Vec<MissingCount>,
    pub row_count: usize,
    /// Includes the `date` column.
    pub column_count: usize,
}

impl SummaryReport {
    pub fn stats_for(&self, column: &str) -> Option<&ColumnStats> {
        self.stats.iter().find(|s| s.column == column)
    }
}

/// Describe the view: per-column statistics, missing-value counts and shape.
pub fn summarize(view: &FilteredView) -> SummaryReport {
    let dataset = view.dataset();

    let stats = dataset
        .numeric_columns()
        .map(|(index, column)| {
            let values: Vec<f64> = view
                .cells(index)
                .map(|c| c.as_f64().unwrap_or(f64::NAN))
                .collect();
            ColumnStats::compute(&column.name, &values)
        })
        .collect();

    let missing = dataset
        .columns()
        .iter()
        .enumerate()
        .filter_map(|(index, column)| {
            let missing = view.cells(index).filter(|c| c.is_missing()).count();
            (missing > 0).then(|| MissingCount {
                column: column.name.clone(),
                missing,
            })
        })
        .collect();

    SummaryReport {
        stats,
        missing,
        row_count: view.len(),
        column_count: dataset.columns().len() + 1,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::data::filter::{filter, DateRange};
    use crate::data::model::{Dataset, CLOSE, MA_30};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    fn dataset() -> Arc<Dataset> {
        let rows = [
            (10.0, None),
            (20.0, Some(1.0)),
            (30.0, Some(2.0)),
            (40.0, None),
            (30.0, Some(3.0)),
        ];
        Arc::new(Dataset::from_numeric_rows(
            &[CLOSE, MA_30],
            rows.iter()
                .enumerate()
                .map(|(i, &(c, m))| (day(i as u32 + 1), vec![Some(c), m]))
                .collect(),
        ))
    }

    #[test]
    fn describes_filtered_rows() {
        let view = filter(&dataset(), DateRange::new(day(2), day(4))).view;
        let report = summarize(&view);

        let close = report.stats_for(CLOSE).unwrap();
        assert_eq!(close.count, 3);
        assert_eq!(close.mean, 30.0);
        assert_eq!(close.min, 20.0);
        assert_eq!(close.max, 40.0);
        assert_eq!(close.median, 30.0);
        assert_eq!(close.q25, 25.0);
        assert_eq!(close.q75, 35.0);
        assert_eq!(close.std, 10.0);

        assert_eq!(report.row_count, 3);
        assert_eq!(report.column_count, 3);
    }

    #[test]
    fn missing_table_omits_complete_columns() {
        let view = filter(&dataset(), DateRange::new(day(1), day(5))).view;
        let report = summarize(&view);
        assert_eq!(
            report.missing,
            vec![MissingCount {
                column: MA_30.to_string(),
                missing: 2
            }]
        );
        assert_eq!(report.stats_for(MA_30).unwrap().count, 3);
    }

    #[test]
    fn empty_view_still_reports() {
        let far = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let view = filter(&dataset(), DateRange::new(far, far)).view;
        let report = summarize(&view);
        let close = report.stats_for(CLOSE).unwrap();
        assert_eq!(close.count, 0);
        assert!(close.mean.is_nan());
        assert!(close.min.is_nan());
        assert!(close.q75.is_nan());
        assert!(report.missing.is_empty());
        assert_eq!(report.row_count, 0);
    }

    #[test]
    fn single_row_has_undefined_std() {
        let view = filter(&dataset(), DateRange::new(day(3), day(3))).view;
        let close = summarize(&view).stats_for(CLOSE).cloned().unwrap();
        assert_eq!(close.count, 1);
        assert_eq!(close.mean, 30.0);
        assert!(close.std.is_nan());
    }
}
