use eframe::egui::{self, Grid, RichText, ScrollArea, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use crate::data::filter::FilteredView;
use crate::data::model::{CellValue, DAILY_RETURN, VOLATILITY_7};
use crate::data::summary::SummaryReport;

// ---------------------------------------------------------------------------
// Display formatting (presentation only; never fed back into computations)
// ---------------------------------------------------------------------------

/// Text for one data-table cell. `daily_return` is shown as a percentage,
/// `volatility_7` with four decimals; missing cells are blank.
pub fn format_cell(column: &str, value: &CellValue) -> String {
    match (column, value.as_f64()) {
        (DAILY_RETURN, Some(v)) => format!("{:.2}%", v * 100.0),
        (VOLATILITY_7, Some(v)) => format!("{v:.4}"),
        _ => value.to_string(),
    }
}

/// Text for a statistics cell.
pub fn format_stat(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{value:.4}")
    }
}

// ---------------------------------------------------------------------------
// Filtered rows
// ---------------------------------------------------------------------------

pub fn data_table(ui: &mut Ui, view: &FilteredView) {
    let dataset = view.dataset();
    let columns = dataset.columns();

    ui.push_id("data_table", |ui: &mut Ui| {
        ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .max_scroll_height(320.0)
                .columns(TableColumn::auto().at_least(80.0), columns.len() + 1)
                .header(20.0, |mut header| {
                    header.col(|ui: &mut Ui| {
                        ui.strong("date");
                    });
                    for column in columns {
                        header.col(|ui: &mut Ui| {
                            ui.strong(&column.name);
                        });
                    }
                })
                .body(|body| {
                    body.rows(18.0, view.len(), |mut row| {
                        let record = &dataset.records()[view.rows()[row.index()]];
                        row.col(|ui: &mut Ui| {
                            ui.label(record.date.to_string());
                        });
                        for (column, value) in columns.iter().zip(&record.values) {
                            row.col(|ui: &mut Ui| {
                                ui.label(format_cell(&column.name, value));
                            });
                        }
                    });
                });
        });
    });
}

// ---------------------------------------------------------------------------
// Descriptive statistics and info
// ---------------------------------------------------------------------------

/// Statistic names down the side, one column per numeric dataset column.
pub fn statistics_table(ui: &mut Ui, report: &SummaryReport) {
    ScrollArea::horizontal()
        .id_salt("statistics_scroll")
        .show(ui, |ui: &mut Ui| {
            Grid::new("statistics_grid")
                .striped(true)
                .num_columns(report.stats.len() + 1)
                .show(ui, |ui: &mut Ui| {
                    ui.label("");
                    for stats in &report.stats {
                        ui.strong(&stats.column);
                    }
                    ui.end_row();

                    let Some(first) = report.stats.first() else {
                        return;
                    };
                    for (row, (label, _)) in first.rows().iter().enumerate() {
                        ui.strong(*label);
                        for stats in &report.stats {
                            let (_, value) = stats.rows()[row];
                            let text = if row == 0 {
                                stats.count.to_string()
                            } else {
                                format_stat(value)
                            };
                            ui.label(text);
                        }
                        ui.end_row();
                    }
                });
        });
}

pub fn data_info(ui: &mut Ui, report: &SummaryReport) {
    ui.label(format!("Total Rows: {}", report.row_count));
    ui.label(format!("Total Columns: {}", report.column_count));
    ui.label("Missing Values:");

    if report.missing.is_empty() {
        ui.label(RichText::new("none").italics());
        return;
    }
    Grid::new("missing_grid")
        .striped(true)
        .num_columns(2)
        .show(ui, |ui: &mut Ui| {
            for entry in &report.missing {
                ui.label(&entry.column);
                ui.label(entry.missing.to_string());
                ui.end_row();
            }
        });
}

/// A bold heading followed by a small gap, used between dashboard sections.
pub fn section(ui: &mut Ui, title: &str) {
    ui.add_space(12.0);
    ui.heading(title);
    ui.add(egui::Separator::default().spacing(4.0));
}
