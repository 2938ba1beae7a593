//! Chart-ready data derived from a [`FilteredView`].
//!
//! Four independent transformations, one per chart. None of them renders
//! anything; the UI layer turns their output into plot items.
//!
//! Missing-value policy:
//! * price and moving-average series keep one point per row; missing values
//!   are `NaN` and show up as gaps ([`Series::segments`]),
//! * the Bollinger band keeps only rows where both bounds are present,
//! * the return distribution drops missing returns and counts them,
//! * correlations use pairwise-complete rows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::filter::FilteredView;
use super::model::{BB_LOWER, BB_UPPER, CLOSE, DAILY_RETURN, MA_30, MA_90};
use super::stats::{pearson, quantile_sorted, sample_std, sorted};

// ---------------------------------------------------------------------------
// Line series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    /// NaN when the cell is missing.
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<SeriesPoint>,
}

impl Series {
    /// One point per row of `view`. An absent or text column yields an
    /// all-NaN series of the same length.
    pub fn from_column(view: &FilteredView, column: &str) -> Self {
        let values = view
            .numeric_column(column)
            .unwrap_or_else(|| vec![f64::NAN; view.len()]);
        let points = view
            .dates()
            .zip(values)
            .map(|(date, value)| SeriesPoint { date, value })
            .collect();
        Self {
            name: column.to_string(),
            points,
        }
    }

    /// Maximal runs of consecutive non-NaN points.
    pub fn segments(&self) -> Vec<&[SeriesPoint]> {
        self.points
            .split(|p| p.value.is_nan())
            .filter(|run| !run.is_empty())
            .collect()
    }

    pub fn gap_count(&self) -> usize {
        self.points.iter().filter(|p| p.value.is_nan()).count()
    }
}

/// `(date, close)` in row order.
pub fn price_series(view: &FilteredView) -> Series {
    Series::from_column(view, CLOSE)
}

// ---------------------------------------------------------------------------
// Technical overlay
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandPoint {
    /// Row position within the view.
    pub position: usize,
    pub date: NaiveDate,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TechnicalOverlay {
    pub close: Series,
    pub ma_30: Series,
    pub ma_90: Series,
    /// Rows where both band bounds are present.
    pub band: Vec<BandPoint>,
}

impl TechnicalOverlay {
    /// Split the band wherever a row was dropped, so a shaded region never
    /// bridges a gap.
    pub fn band_segments(&self) -> Vec<&[BandPoint]> {
        let mut segments = Vec::new();
        let mut start = 0;
        for i in 1..=self.band.len() {
            let broken = i == self.band.len()
                || self.band[i].position != self.band[i - 1].position + 1;
            if broken {
                segments.push(&self.band[start..i]);
                start = i;
            }
        }
        segments
    }
}

pub fn technical_overlay(view: &FilteredView) -> TechnicalOverlay {
    let lower = Series::from_column(view, BB_LOWER);
    let upper = Series::from_column(view, BB_UPPER);

    let band = lower
        .points
        .iter()
        .zip(&upper.points)
        .enumerate()
        .filter(|(_, (lo, hi))| !lo.value.is_nan() && !hi.value.is_nan())
        .map(|(position, (lo, hi))| BandPoint {
            position,
            date: lo.date,
            lower: lo.value,
            upper: hi.value,
        })
        .collect();

    TechnicalOverlay {
        close: Series::from_column(view, CLOSE),
        ma_30: Series::from_column(view, MA_30),
        ma_90: Series::from_column(view, MA_90),
        band,
    }
}

// ---------------------------------------------------------------------------
// Return distribution
// ---------------------------------------------------------------------------

/// How the histogram picks its bin count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinRule {
    /// Larger bin count of Sturges and Freedman–Diaconis.
    #[default]
    Auto,
    Sturges,
    Fixed(usize),
}

const MAX_BINS: usize = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `counts.len() + 1` ascending edges; empty when there is no data.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Equal-width bins over the data range. Every bin is half-open except
    /// the last, which includes its right edge.
    pub fn build(values: &[f64], rule: BinRule) -> Self {
        let asc = sorted(values);
        let (Some(&lo), Some(&hi)) = (asc.first(), asc.last()) else {
            return Self {
                edges: Vec::new(),
                counts: Vec::new(),
            };
        };
        let (lo, hi) = if lo == hi { (lo - 0.5, hi + 0.5) } else { (lo, hi) };

        let bins = bin_count(&asc, lo, hi, rule);
        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins)
            .map(|i| if i == bins { hi } else { lo + width * i as f64 })
            .collect();

        let mut counts = vec![0; bins];
        for &v in &asc {
            let idx = (((v - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }
        Self { edges, counts }
    }

    pub fn bin_width(&self) -> f64 {
        match self.edges.as_slice() {
            [first, second, ..] => second - first,
            _ => f64::NAN,
        }
    }

    /// `(centre, count)` per bin.
    pub fn bars(&self) -> impl Iterator<Item = (f64, usize)> + '_ {
        self.edges
            .windows(2)
            .zip(&self.counts)
            .map(|(w, &c)| ((w[0] + w[1]) / 2.0, c))
    }
}

fn bin_count(asc: &[f64], lo: f64, hi: f64, rule: BinRule) -> usize {
    let n = asc.len() as f64;
    // Widths come from the data's own spread, so constant data gets 0 and a single bin.
    let spread = asc[asc.len() - 1] - asc[0];
    let sturges_width = spread / (n.log2() + 1.0);
    let width = match rule {
        BinRule::Fixed(bins) => return bins.clamp(1, MAX_BINS),
        BinRule::Sturges => sturges_width,
        BinRule::Auto => {
            let iqr = quantile_sorted(asc, 0.75) - quantile_sorted(asc, 0.25);
            let fd_width = 2.0 * iqr * n.powf(-1.0 / 3.0);
            if fd_width > 0.0 {
                fd_width.min(sturges_width)
            } else {
                sturges_width
            }
        }
    };
    if width > 0.0 && width.is_finite() {
        (((hi - lo) / width).ceil() as usize).clamp(1, MAX_BINS)
    } else {
        1
    }
}

/// Box-and-whisker statistics with 1.5·IQR whiskers.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Smallest value not below `q1 - 1.5·IQR`.
    pub lower_whisker: f64,
    /// Largest value not above `q3 + 1.5·IQR`.
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    pub fn compute(values: &[f64]) -> Option<Self> {
        let asc = sorted(values);
        if asc.is_empty() {
            return None;
        }
        let q1 = quantile_sorted(&asc, 0.25);
        let median = quantile_sorted(&asc, 0.5);
        let q3 = quantile_sorted(&asc, 0.75);
        let reach = 1.5 * (q3 - q1);
        let (lo_fence, hi_fence) = (q1 - reach, q3 + reach);

        let inside = || asc.iter().copied().filter(|v| (lo_fence..=hi_fence).contains(v));
        Some(Self {
            q1,
            median,
            q3,
            lower_whisker: inside().next().unwrap_or(q1),
            upper_whisker: inside().last().unwrap_or(q3),
            outliers: asc
                .iter()
                .copied()
                .filter(|v| !(lo_fence..=hi_fence).contains(v))
                .collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnDistribution {
    /// Non-missing `daily_return` values in row order.
    pub values: Vec<f64>,
    /// Rows whose return was missing (or the column is absent).
    pub missing: usize,
    pub histogram: Histogram,
    /// Gaussian KDE as `[x, expected count per bin]`; empty when fewer than
    /// two distinct values exist.
    pub kde: Vec<[f64; 2]>,
    pub boxplot: Option<BoxStats>,
}

pub fn return_distribution(
    view: &FilteredView,
    rule: BinRule,
    kde_points: usize,
) -> ReturnDistribution {
    let raw = view
        .numeric_column(DAILY_RETURN)
        .unwrap_or_else(|| vec![f64::NAN; view.len()]);
    let values: Vec<f64> = raw.iter().copied().filter(|v| !v.is_nan()).collect();
    let missing = raw.len() - values.len();

    let histogram = Histogram::build(&values, rule);
    let kde = kde_curve(&values, kde_points, histogram.bin_width());
    let boxplot = BoxStats::compute(&values);

    ReturnDistribution {
        values,
        missing,
        histogram,
        kde,
        boxplot,
    }
}

/// Gaussian kernel density with Scott's bandwidth, evaluated on `points`
/// evenly spaced positions spanning the data plus three bandwidths each side,
/// scaled by `n * bin_width` so it overlays a count histogram.
fn kde_curve(values: &[f64], points: usize, bin_width: f64) -> Vec<[f64; 2]> {
    let n = values.len();
    let std = sample_std(values);
    if n < 2 || std.is_nan() || std <= 0.0 || points < 2 {
        return Vec::new();
    }
    let bandwidth = std * (n as f64).powf(-0.2);
    let asc = sorted(values);
    let lo = asc[0] - 3.0 * bandwidth;
    let hi = asc[n - 1] + 3.0 * bandwidth;
    let step = (hi - lo) / (points - 1) as f64;

    let norm = 1.0 / (n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    let scale = n as f64 * bin_width;

    (0..points)
        .map(|i| {
            let x = lo + step * i as f64;
            let density: f64 = values
                .iter()
                .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                .sum::<f64>()
                * norm;
            [x, density * scale]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Correlation matrix
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major, `columns.len()` × `columns.len()`.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }
}

/// Pearson correlation between every pair of numeric columns, over the rows
/// where both are present.
pub fn correlation_matrix(view: &FilteredView) -> CorrelationMatrix {
    let dataset = view.dataset();
    let (columns, data): (Vec<String>, Vec<Vec<f64>>) = dataset
        .numeric_columns()
        .map(|(index, column)| {
            let values: Vec<f64> = view
                .cells(index)
                .map(|c| c.as_f64().unwrap_or(f64::NAN))
                .collect();
            (column.name.clone(), values)
        })
        .unzip();

    let k = columns.len();
    let mut values = vec![vec![f64::NAN; k]; k];
    for i in 0..k {
        for j in i..k {
            let (xs, ys): (Vec<f64>, Vec<f64>) = data[i]
                .iter()
                .zip(&data[j])
                .filter(|(x, y)| !x.is_nan() && !y.is_nan())
                .map(|(x, y)| (*x, *y))
                .unzip();
            let r = pearson(&xs, &ys);
            let r = if i == j && !r.is_nan() { 1.0 } else { r };
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix { columns, values }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::data::filter::{filter, DateRange};
    use crate::data::model::Dataset;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    fn view(names: &[&str], rows: Vec<Vec<Option<f64>>>) -> FilteredView {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, r)| (day(i as u32 + 1), r))
            .collect();
        FilteredView::all(Arc::new(Dataset::from_numeric_rows(names, rows)))
    }

    #[test]
    fn price_series_keeps_gaps() {
        let v = view(&[CLOSE], vec![vec![Some(1.0)], vec![None], vec![Some(3.0)], vec![Some(4.0)]]);
        let s = price_series(&v);
        assert_eq!(s.points.len(), 4);
        assert_eq!(s.gap_count(), 1);
        let segs = s.segments();
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[1].len(), 2);
        assert_eq!(segs[1][0].date, day(3));
    }

    #[test]
    fn overlay_without_indicator_columns_does_not_panic() {
        let v = view(&[CLOSE], vec![vec![Some(1.0)], vec![Some(2.0)]]);
        let o = technical_overlay(&v);
        assert_eq!(o.ma_30.points.len(), 2);
        assert!(o.ma_30.segments().is_empty());
        assert!(o.band.is_empty());
        assert!(o.band_segments().is_empty());
    }

    #[test]
    fn band_drops_incomplete_rows_and_splits() {
        let v = view(
            &[BB_LOWER, BB_UPPER],
            vec![
                vec![Some(1.0), Some(3.0)],
                vec![Some(1.5), Some(3.5)],
                vec![None, Some(4.0)],
                vec![Some(2.0), Some(4.5)],
            ],
        );
        let o = technical_overlay(&v);
        assert_eq!(o.band.len(), 3);
        let segs = o.band_segments();
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].len(), 2);
        assert_eq!(segs[1][0].date, day(4));
    }

    #[test]
    fn histogram_counts_every_value() {
        let values: Vec<f64> = (0..100).map(|i| (i as f64 - 50.0) / 1000.0).collect();
        let h = Histogram::build(&values, BinRule::Auto);
        assert_eq!(h.edges.len(), h.counts.len() + 1);
        assert_eq!(h.counts.iter().sum::<usize>(), 100);
        assert_eq!(*h.edges.first().unwrap(), -0.05);
        assert_eq!(*h.edges.last().unwrap(), 0.049);
        assert_eq!(h, Histogram::build(&values, BinRule::Auto));
    }

    #[test]
    fn histogram_rules() {
        let values: Vec<f64> = (0..16).map(f64::from).collect();
        // log2(16) + 1 = 5 Sturges bins
        assert_eq!(Histogram::build(&values, BinRule::Sturges).counts.len(), 5);
        assert_eq!(Histogram::build(&values, BinRule::Fixed(4)).counts, vec![4, 4, 4, 4]);
        assert_eq!(Histogram::build(&values, BinRule::Fixed(0)).counts.len(), 1);
    }

    #[test]
    fn constant_and_empty_histograms() {
        let h = Histogram::build(&[0.01, 0.01, 0.01], BinRule::Auto);
        assert_eq!(h.counts, vec![3]);
        assert_eq!(h.edges, vec![0.01 - 0.5, 0.01 + 0.5]);
        let empty = Histogram::build(&[], BinRule::Auto);
        assert!(empty.counts.is_empty());
        assert!(empty.bin_width().is_nan());
    }

    #[test]
    fn box_stats_flag_outliers() {
        let b = BoxStats::compute(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(b.q1, 2.0);
        assert_eq!(b.median, 3.0);
        assert_eq!(b.q3, 4.0);
        assert_eq!(b.lower_whisker, 1.0);
        assert_eq!(b.upper_whisker, 4.0);
        assert_eq!(b.outliers, vec![100.0]);
        assert!(BoxStats::compute(&[]).is_none());
    }

    #[test]
    fn return_distribution_drops_missing() {
        let v = view(
            &[DAILY_RETURN],
            vec![vec![Some(0.01)], vec![None], vec![Some(-0.02)], vec![Some(0.03)]],
        );
        let d = return_distribution(&v, BinRule::Auto, 50);
        assert_eq!(d.values, vec![0.01, -0.02, 0.03]);
        assert_eq!(d.missing, 1);
        assert_eq!(d.kde.len(), 50);
        assert!(d.kde.iter().all(|p| p[1] >= 0.0));
        assert!(d.boxplot.is_some());
    }

    #[test]
    fn kde_area_matches_sample_size() {
        let values: Vec<f64> = (0..200).map(|i| ((i * 37) % 101) as f64 / 100.0).collect();
        let h = Histogram::build(&values, BinRule::Auto);
        let kde = kde_curve(&values, 400, h.bin_width());
        let step = kde[1][0] - kde[0][0];
        let area_in_bins: f64 = kde.iter().map(|p| p[1] * step).sum::<f64>() / h.bin_width();
        assert!((area_in_bins - 200.0).abs() < 2.0, "area {area_in_bins}");
    }

    #[test]
    fn missing_return_column() {
        let v = view(&[CLOSE], vec![vec![Some(1.0)], vec![Some(2.0)]]);
        let d = return_distribution(&v, BinRule::Auto, 200);
        assert!(d.values.is_empty());
        assert_eq!(d.missing, 2);
        assert!(d.kde.is_empty());
        assert!(d.boxplot.is_none());
    }

    #[test]
    fn correlation_is_symmetric_with_unit_diagonal() {
        let v = view(
            &["a", "b", "c"],
            vec![
                vec![Some(1.0), Some(2.0), Some(5.0)],
                vec![Some(2.0), Some(4.1), Some(5.0)],
                vec![Some(3.0), Some(5.9), Some(5.0)],
                vec![Some(4.0), None, Some(5.0)],
            ],
        );
        let m = correlation_matrix(&v);
        assert_eq!(m.columns, vec!["a", "b", "c"]);
        for i in 0..3 {
            for j in 0..3 {
                let (x, y) = (m.get(i, j), m.get(j, i));
                assert!(x == y || (x.is_nan() && y.is_nan()));
            }
        }
        assert_eq!(m.get(0, 0), 1.0);
        assert_eq!(m.get(1, 1), 1.0);
        assert!(m.get(0, 1) > 0.99);
        // constant column
        assert!(m.get(2, 2).is_nan());
        assert!(m.get(0, 2).is_nan());
    }

    #[test]
    fn single_row_correlation_is_undefined() {
        let v = view(&["a", "b"], vec![vec![Some(1.0), Some(2.0)], vec![Some(3.0), Some(1.0)]]);
        let one = filter(&Arc::new(v.dataset().clone()), DateRange::new(day(1), day(1))).view;
        let m = correlation_matrix(&one);
        assert!(m.values.iter().flatten().all(|r| r.is_nan()));
    }
}
