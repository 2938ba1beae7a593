//! Gold price analysis dashboard.
//!
//! The `data` module is the UI-independent core: load a dataset once, filter
//! it by date range and derive summary statistics and chart data. `state`,
//! `ui` and `app` put that on screen with egui.

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod state;
pub mod ui;
