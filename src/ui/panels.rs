use chrono::Datelike;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::filter::DateRange;
use crate::state::AppState;
use crate::ui::{plot, table};

// ---------------------------------------------------------------------------
// Left side panel – date filter
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Data");
    ui.separator();

    let (Some(dataset), Some(range)) = (state.dataset.clone(), state.range) else {
        ui.label("No dataset loaded.");
        return;
    };
    let Some((min, max)) = dataset.date_bounds() else {
        return;
    };

    let mut start = range.start;
    let mut end = range.end;
    let years = min.year()..=max.year();

    ui.strong("Start Date");
    ui.add(
        DatePickerButton::new(&mut start)
            .id_salt("start_date")
            .start_end_years(years.clone()),
    );
    ui.add_space(4.0);
    ui.strong("End Date");
    ui.add(
        DatePickerButton::new(&mut end)
            .id_salt("end_date")
            .start_end_years(years),
    );

    if start != range.start || end != range.end {
        state.set_range(DateRange::new(start, end));
    }

    if let Some(warning) = state.views.as_ref().and_then(|v| v.warning) {
        ui.add_space(4.0);
        ui.label(RichText::new(warning.to_string()).color(Color32::RED));
    }

    ui.add_space(8.0);
    if ui.button("Full range").clicked() {
        state.reset_range();
    }

    ui.separator();
    ui.small(format!("Available: {min} to {max}"));
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(ds), Some(views)) = (&state.dataset, &state.views) {
            let name = state
                .source
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            ui.label(format!(
                "{name}: {} rows loaded, {} in range",
                ds.len(),
                views.view.len()
            ));
        }
    });
}

// ---------------------------------------------------------------------------
// Central panel – tables and charts
// ---------------------------------------------------------------------------

pub fn dashboard(ui: &mut Ui, state: &AppState) {
    if let Some(message) = &state.load_error {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading(RichText::new(message).color(Color32::RED));
        });
        return;
    }
    let Some(views) = &state.views else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to analyse  (File → Open…)");
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading(RichText::new("Gold Price Forecasting Dataset Analysis").size(26.0));
            ui.label("Analyze historical gold prices and technical indicators.");

            table::section(ui, "Dataset Overview");
            ui.label(format!(
                "Displaying data from {} to {}.",
                views.range.start, views.range.end
            ));
            table::data_table(ui, &views.view);

            ui.add_space(8.0);
            ui.columns(2, |cols: &mut [Ui]| {
                cols[0].strong("Descriptive Statistics");
                table::statistics_table(&mut cols[0], &views.summary);
                cols[1].strong("Data Info");
                table::data_info(&mut cols[1], &views.summary);
            });

            table::section(ui, "Visualizations");

            ui.strong("Price History (Close Price)");
            plot::price_chart(ui, &views.price);

            ui.add_space(8.0);
            ui.strong("Technical Indicators");
            ui.label("Moving Averages and Bollinger Bands");
            plot::overlay_chart(ui, &views.overlay);

            ui.add_space(8.0);
            ui.strong("Daily Returns Distribution");
            if views.returns.missing > 0 {
                ui.small(format!("{} rows without a return omitted", views.returns.missing));
            }
            ui.columns(2, |cols: &mut [Ui]| {
                plot::returns_histogram(&mut cols[0], &views.returns);
                plot::returns_boxplot(&mut cols[1], &views.returns);
            });

            ui.add_space(8.0);
            ui.strong("Correlation Heatmap");
            plot::correlation_heatmap(ui, &views.correlation);
        });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open gold price data")
        .add_filter("Supported files", &["csv", "tsv", "tab", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("TSV", &["tsv", "tab"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}
