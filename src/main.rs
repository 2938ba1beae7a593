use std::path::Path;

use eframe::egui;
use gold_dashboard::app::GoldDashboardApp;
use gold_dashboard::config::{DashboardConfig, CONFIG_FILE};

fn main() -> eframe::Result {
    env_logger::init();

    let config = DashboardConfig::load_or_default(Path::new(CONFIG_FILE));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Gold Price Analysis",
        options,
        Box::new(|_cc| Ok(Box::new(GoldDashboardApp::new(config)))),
    )
}
