use std::sync::Arc;

use super::charts::{
    correlation_matrix, price_series, return_distribution, technical_overlay, CorrelationMatrix,
    ReturnDistribution, Series, TechnicalOverlay,
};
use super::filter::{filter, DateRange, FilteredView, InvalidRangeWarning};
use super::model::Dataset;
use super::summary::{summarize, SummaryReport};
use crate::config::DashboardConfig;

/// Everything the dashboard shows for one date range.
#[derive(Debug, Clone)]
pub struct DashboardViews {
    /// The range as requested, even when it was rejected.
    pub range: DateRange,
    pub warning: Option<InvalidRangeWarning>,
    pub view: FilteredView,
    pub summary: SummaryReport,
    pub price: Series,
    pub overlay: TechnicalOverlay,
    pub returns: ReturnDistribution,
    pub correlation: CorrelationMatrix,
}

/// Filter once, then fan the same view out to every derived view.
pub fn recompute(dataset: &Arc<Dataset>, range: DateRange, config: &DashboardConfig) -> DashboardViews {
    let outcome = filter(dataset, range);
    let view = outcome.view;
    log::debug!(
        "Recomputing views for {} .. {} ({} of {} rows)",
        range.start,
        range.end,
        view.len(),
        dataset.len()
    );

    DashboardViews {
        range,
        warning: outcome.warning,
        summary: summarize(&view),
        price: price_series(&view),
        overlay: technical_overlay(&view),
        returns: return_distribution(&view, config.histogram_bins, config.kde_points),
        correlation: correlation_matrix(&view),
        view,
    }
}
