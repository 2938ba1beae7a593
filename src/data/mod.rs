/// Data layer: core types, loading, filtering and derived views.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset   (memoized by cache: path + mtime)
///   └──────────┘
///        │  Arc<Dataset>
///        ▼
///   ┌──────────┐
///   │  filter   │  DateRange → FilteredView (row indices)
///   └──────────┘
///        │
///        ├──────────────┬──────────────┬──────────────┐
///        ▼              ▼              ▼              ▼
///    summary      price / overlay   returns     correlation
/// ```
///
/// `pipeline::recompute` wires the filter and every view together.

pub mod cache;
pub mod charts;
pub mod filter;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod stats;
pub mod summary;
