use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::data::cache;
use crate::data::filter::DateRange;
use crate::data::model::Dataset;
use crate::data::pipeline::{recompute, DashboardViews};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Loaded dataset (None until a load succeeds).
    pub dataset: Option<Arc<Dataset>>,

    /// File the dataset came from.
    pub source: Option<PathBuf>,

    /// Current date-picker selection, clamped to the dataset's span.
    pub range: Option<DateRange>,

    /// Views for the current range (cached until the range changes).
    pub views: Option<DashboardViews>,

    /// Terminal load failure. When set, nothing else is shown.
    pub load_error: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            dataset: None,
            source: None,
            range: None,
            views: None,
            load_error: None,
        }
    }

    /// Load the file named in the config.
    pub fn load_configured(&mut self) {
        let path = self.config.data_path.clone();
        self.load_path(&path);
    }

    /// Load `path` through the process-wide cache. A failure clears every
    /// derived view so nothing runs against a missing dataset.
    pub fn load_path(&mut self, path: &Path) {
        match cache::load(path) {
            Ok(dataset) => self.set_dataset(dataset, path.to_path_buf()),
            Err(e) => {
                log::error!("Failed to load file: {e}");
                self.dataset = None;
                self.source = None;
                self.range = None;
                self.views = None;
                self.load_error = Some(format!("Error loading data: {e}"));
            }
        }
    }

    /// Ingest a newly loaded dataset with the range reset to its full span.
    pub fn set_dataset(&mut self, dataset: Arc<Dataset>, source: PathBuf) {
        self.range = DateRange::full(&dataset);
        self.dataset = Some(dataset);
        self.source = Some(source);
        self.load_error = None;
        self.refresh();
    }

    /// Apply a new picker selection. Bounds are clamped to the dataset span;
    /// an inverted range is kept so the warning can be shown.
    pub fn set_range(&mut self, range: DateRange) {
        let Some(dataset) = &self.dataset else {
            return;
        };
        let range = range.clamped(dataset);
        if self.range != Some(range) {
            self.range = Some(range);
            self.refresh();
        }
    }

    pub fn reset_range(&mut self) {
        if let Some(full) = self.dataset.as_deref().and_then(DateRange::full) {
            self.set_range(full);
        }
    }

    /// Recompute every view for the current range.
    pub fn refresh(&mut self) {
        self.views = match (&self.dataset, self.range) {
            (Some(dataset), Some(range)) => Some(recompute(dataset, range, &self.config)),
            _ => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Write;

    use chrono::NaiveDate;

    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    fn write_dataset(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("gold.csv");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "date,close,daily_return,volatility_7,ma_30,ma_90,bb_upper,bb_lower").unwrap();
        for (d, close) in [(1, 10), (2, 20), (3, 30), (4, 40), (5, 30)] {
            writeln!(f, "2023-01-0{d},{close},0.01,0.1,{close},{close},{close},{close}").unwrap();
        }
        path
    }

    #[test]
    fn load_selects_full_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::new(DashboardConfig::default());
        state.load_path(&write_dataset(&dir));

        assert!(state.load_error.is_none());
        assert_eq!(state.range, Some(DateRange::new(day(1), day(5))));
        assert_eq!(state.views.as_ref().unwrap().view.len(), 5);
    }

    #[test]
    fn range_changes_recompute_views() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::new(DashboardConfig::default());
        state.load_path(&write_dataset(&dir));

        state.set_range(DateRange::new(day(2), day(4)));
        let views = state.views.as_ref().unwrap();
        assert_eq!(views.view.len(), 3);
        assert_eq!(views.summary.stats_for("close").unwrap().mean, 30.0);

        state.set_range(DateRange::new(day(4), day(2)));
        let views = state.views.as_ref().unwrap();
        assert!(views.warning.is_some());
        assert_eq!(views.view.len(), 5);

        state.reset_range();
        assert!(state.views.as_ref().unwrap().warning.is_none());
    }

    #[test]
    fn picker_bounds_are_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::new(DashboardConfig::default());
        state.load_path(&write_dataset(&dir));

        let early = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        state.set_range(DateRange::new(early, day(3)));
        assert_eq!(state.range, Some(DateRange::new(day(1), day(3))));
    }

    #[test]
    fn failed_load_is_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::new(DashboardConfig::default());
        state.load_path(&write_dataset(&dir));
        state.load_path(&dir.path().join("missing.csv"));

        assert!(state.load_error.is_some());
        assert!(state.dataset.is_none());
        assert!(state.views.is_none());

        state.set_range(DateRange::new(day(1), day(2)));
        assert!(state.views.is_none());
    }
}
