use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};
use eframe::egui::{self, Color32, Sense, Stroke, Ui};
use egui_plot::{
    uniform_grid_spacer, Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line,
    LineStyle, MarkerShape, Plot, PlotPoint, PlotPoints, Points, Polygon,
};

use crate::color::{self, DivergingColorMap};
use crate::data::charts::{
    BandPoint, CorrelationMatrix, ReturnDistribution, Series, SeriesPoint, TechnicalOverlay,
};

const CHART_HEIGHT: f32 = 300.0;

// ---------------------------------------------------------------------------
// Date axis helpers
// ---------------------------------------------------------------------------

/// Plot x coordinate for a date: days since 0001-01-01.
pub fn date_to_x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

pub fn x_to_date(x: f64) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

fn date_axis(mark: GridMark, _range: &RangeInclusive<f64>) -> String {
    x_to_date(mark.value)
        .map(|d| d.to_string())
        .unwrap_or_default()
}

fn date_label(name: &str, value: &PlotPoint) -> String {
    let date = x_to_date(value.x)
        .map(|d| d.to_string())
        .unwrap_or_default();
    if name.is_empty() {
        format!("{date}\n{:.2}", value.y)
    } else {
        format!("{name}\n{date}\n{:.2}", value.y)
    }
}

fn line_points(segment: &[SeriesPoint]) -> PlotPoints {
    segment
        .iter()
        .map(|p| [date_to_x(p.date), p.value])
        .collect()
}

fn time_plot(id: &str) -> Plot {
    Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Date")
        .y_axis_label("Price")
        .x_axis_formatter(date_axis)
        .label_formatter(date_label)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
}

/// One line per contiguous run, all sharing `name` so the legend groups them.
fn segmented_line<'a>(plot_ui: &mut egui_plot::PlotUi<'a>, series: &'a Series, name: &str, style: impl Fn(Line<'a>) -> Line<'a>) {
    for segment in series.segments() {
        plot_ui.line(style(Line::new(line_points(segment)).name(name)));
    }
}

// ---------------------------------------------------------------------------
// Price history
// ---------------------------------------------------------------------------

pub fn price_chart(ui: &mut Ui, series: &Series) {
    time_plot("price_history").show(ui, |plot_ui| {
        segmented_line(plot_ui, series, "Close Price", |line| {
            line.color(color::GOLD).width(1.5)
        });
    });
}

// ---------------------------------------------------------------------------
// Technical indicators
// ---------------------------------------------------------------------------

pub fn overlay_chart(ui: &mut Ui, overlay: &TechnicalOverlay) {
    time_plot("technical_indicators").show(ui, |plot_ui| {
        for segment in overlay.band_segments() {
            for pair in segment.windows(2) {
                plot_ui.polygon(band_quad(pair));
            }
        }
        segmented_line(plot_ui, &overlay.close, "Close Price", |line| {
            line.color(color::CLOSE_MUTED).width(1.0)
        });
        segmented_line(plot_ui, &overlay.ma_30, "30-Day MA", |line| {
            line.color(color::MA_30)
                .style(LineStyle::Dashed { length: 8.0 })
                .width(1.2)
        });
        segmented_line(plot_ui, &overlay.ma_90, "90-Day MA", |line| {
            line.color(color::MA_90)
                .style(LineStyle::Dashed { length: 8.0 })
                .width(1.2)
        });
    });
}

/// Convex slice of the band between two adjacent rows.
fn band_quad(pair: &[BandPoint]) -> Polygon {
    let (a, b) = (&pair[0], &pair[1]);
    let (xa, xb) = (date_to_x(a.date), date_to_x(b.date));
    let points = PlotPoints::new(vec![
        [xa, a.lower],
        [xb, b.lower],
        [xb, b.upper],
        [xa, a.upper],
    ]);
    Polygon::new(points)
        .name("Bollinger Bands")
        .fill_color(color::BAND_FILL)
        .stroke(Stroke::NONE)
}

// ---------------------------------------------------------------------------
// Daily returns
// ---------------------------------------------------------------------------

pub fn returns_histogram(ui: &mut Ui, returns: &ReturnDistribution) {
    let width = returns.histogram.bin_width();
    let bars: Vec<Bar> = returns
        .histogram
        .bars()
        .map(|(centre, count)| Bar::new(centre, count as f64).width(width))
        .collect();

    Plot::new("returns_histogram")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("daily_return")
        .y_axis_label("Count")
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(color::RETURNS).name("daily_return"));
            if !returns.kde.is_empty() {
                plot_ui.line(
                    Line::new(PlotPoints::new(returns.kde.clone()))
                        .color(color::RETURNS)
                        .width(2.0)
                        .name("density"),
                );
            }
        });
}

pub fn returns_boxplot(ui: &mut Ui, returns: &ReturnDistribution) {
    Plot::new("returns_boxplot")
        .height(CHART_HEIGHT)
        .x_axis_label("daily_return")
        .show_y(false)
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            let Some(stats) = &returns.boxplot else {
                return;
            };
            let spread = BoxSpread::new(
                stats.lower_whisker,
                stats.q1,
                stats.median,
                stats.q3,
                stats.upper_whisker,
            );
            let elem = BoxElem::new(0.0, spread)
                .name("daily_return")
                .box_width(0.5)
                .whisker_width(0.3)
                .fill(color::RETURNS_LIGHT.gamma_multiply(0.6))
                .stroke(Stroke::new(1.5, color::RETURNS));
            plot_ui.box_plot(BoxPlot::new(vec![elem]).horizontal());

            if !stats.outliers.is_empty() {
                let outliers: PlotPoints = stats.outliers.iter().map(|&v| [v, 0.0]).collect();
                plot_ui.points(
                    Points::new(outliers)
                        .shape(MarkerShape::Diamond)
                        .radius(3.0)
                        .color(color::RETURNS),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Correlation heatmap
// ---------------------------------------------------------------------------

/// Cell `(i, j)` is centred on `(j, -i)` so the first column sits top-left.
pub fn correlation_heatmap(ui: &mut Ui, matrix: &CorrelationMatrix) {
    if matrix.is_empty() {
        ui.label("No numeric columns.");
        return;
    }
    let cmap = DivergingColorMap::default();
    let names = matrix.columns.clone();
    let x_names = names.clone();
    let y_names = names.clone();
    let hover = matrix.clone();

    Plot::new("correlation_heatmap")
        .height(CHART_HEIGHT * 1.6)
        .data_aspect(1.0)
        .show_grid(false)
        .allow_drag(false)
        .allow_scroll(false)
        .x_grid_spacer(uniform_grid_spacer(|_| [1.0, 5.0, 10.0]))
        .y_grid_spacer(uniform_grid_spacer(|_| [1.0, 5.0, 10.0]))
        .x_axis_formatter(move |mark, _| cell_label(&x_names, mark.value))
        .y_axis_formatter(move |mark, _| cell_label(&y_names, -mark.value))
        .label_formatter(move |_, point| {
            let j = point.x.round();
            let i = -point.y.round();
            if i < 0.0 || j < 0.0 || i as usize >= hover.len() || j as usize >= hover.len() {
                return String::new();
            }
            let (i, j) = (i as usize, j as usize);
            format!(
                "{} × {}\nr = {:.3}",
                hover.columns[i],
                hover.columns[j],
                hover.get(i, j)
            )
        })
        .show(ui, |plot_ui| {
            for i in 0..matrix.len() {
                for j in 0..matrix.len() {
                    let (x, y) = (j as f64, -(i as f64));
                    let cell = PlotPoints::new(vec![
                        [x - 0.5, y - 0.5],
                        [x + 0.5, y - 0.5],
                        [x + 0.5, y + 0.5],
                        [x - 0.5, y + 0.5],
                    ]);
                    plot_ui.polygon(
                        Polygon::new(cell)
                            .fill_color(cmap.color_for(matrix.get(i, j)))
                            .stroke(Stroke::new(0.5, Color32::from_gray(40))),
                    );
                }
            }
        });

    colour_legend(ui, &cmap);
}

fn cell_label(names: &[String], value: f64) -> String {
    let idx = value.round();
    if (value - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    names.get(idx as usize).cloned().unwrap_or_default()
}

fn colour_legend(ui: &mut Ui, cmap: &DivergingColorMap) {
    ui.horizontal(|ui: &mut Ui| {
        for (value, colour) in cmap.legend_entries(9) {
            let (rect, _) = ui.allocate_exact_size(egui::vec2(18.0, 12.0), Sense::hover());
            ui.painter().rect_filled(rect, 0.0, colour);
            ui.small(format!("{value:+.2}"));
        }
    });
}
