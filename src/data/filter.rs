use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;

use super::model::{CellValue, Dataset, Record};

// ---------------------------------------------------------------------------
// DateRange – the user-selected bounds
// ---------------------------------------------------------------------------

/// Inclusive `[start, end]` date bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The dataset's full span, `None` when it has no rows.
    pub fn full(dataset: &Dataset) -> Option<Self> {
        dataset
            .date_bounds()
            .map(|(start, end)| Self::new(start, end))
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Clamp each bound into the dataset's date span independently.
    ///
    /// An inverted range stays inverted unless clamping moves both bounds
    /// onto the same date.
    pub fn clamped(self, dataset: &Dataset) -> Self {
        match dataset.date_bounds() {
            Some((lo, hi)) => Self::new(self.start.clamp(lo, hi), self.end.clamp(lo, hi)),
            None => self,
        }
    }
}

/// Non-fatal: the range was inverted, so no filtering was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Start date must be before end date ({start} is after {end}); showing all rows.")]
pub struct InvalidRangeWarning {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

// ---------------------------------------------------------------------------
// FilteredView – row selection over a shared dataset
// ---------------------------------------------------------------------------

/// Read-only projection of a [`Dataset`]: the dataset itself plus the indices
/// of the selected rows, in source order.
#[derive(Debug, Clone)]
pub struct FilteredView {
    dataset: Arc<Dataset>,
    rows: Vec<usize>,
}

impl PartialEq for FilteredView {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.dataset, &other.dataset) && self.rows == other.rows
    }
}

/// Result of a filter call: the view plus the warning, if any, to display.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub view: FilteredView,
    pub warning: Option<InvalidRangeWarning>,
}

/// Select rows with `range.start <= date <= range.end`.
///
/// An inverted range is not an error: the whole dataset comes back together
/// with an [`InvalidRangeWarning`].
pub fn filter(dataset: &Arc<Dataset>, range: DateRange) -> FilterOutcome {
    FilteredView::all(Arc::clone(dataset)).refine(range)
}

impl FilteredView {
    /// Every row of `dataset`.
    pub fn all(dataset: Arc<Dataset>) -> Self {
        let rows = (0..dataset.len()).collect();
        Self { dataset, rows }
    }

    /// Narrow this view further. Same policy as [`filter`]; an inverted range
    /// leaves the view unchanged.
    pub fn refine(&self, range: DateRange) -> FilterOutcome {
        if !range.is_valid() {
            log::warn!(
                "Ignoring inverted date range {} .. {}",
                range.start,
                range.end
            );
            return FilterOutcome {
                view: self.clone(),
                warning: Some(InvalidRangeWarning {
                    start: range.start,
                    end: range.end,
                }),
            };
        }

        let records = self.dataset.records();
        let rows = self
            .rows
            .iter()
            .copied()
            .filter(|&i| range.contains(records[i].date))
            .collect();

        FilterOutcome {
            view: Self {
                dataset: Arc::clone(&self.dataset),
                rows,
            },
            warning: None,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Indices into [`Dataset::records`].
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Selected records, in source order.
    pub fn records(&self) -> impl Iterator<Item = &Record> + '_ {
        let records = self.dataset.records();
        self.rows.iter().map(move |&i| &records[i])
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.records().map(|r| r.date)
    }

    /// Cells of column `index` for the selected rows.
    pub fn cells(&self, index: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.records().map(move |r| &r.values[index])
    }

    /// Values of a numeric column with missing cells as NaN, one per row.
    /// `None` if the column is absent or not numeric.
    pub fn numeric_column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.dataset.numeric_column_index(name)?;
        Some(
            self.cells(index)
                .map(|c| c.as_f64().unwrap_or(f64::NAN))
                .collect(),
        )
    }
}
