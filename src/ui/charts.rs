use std::ops::RangeInclusive;

use chrono::DateTime;
use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Plot};

use crate::data::analysis::{GroupValue, Summary};
use crate::data::model::Record;

// ---------------------------------------------------------------------------
// Shared chart helpers
// ---------------------------------------------------------------------------

/// Headline number with a small caption, four of which make the metric row.
pub fn metric_tile(ui: &mut Ui, label: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(label).small().weak());
        ui.label(RichText::new(value).heading().strong());
    });
}

/// Bar chart over a summary: one bar per group at integer positions, group
/// labels on the x axis and in the legend.
pub fn summary_bars(
    ui: &mut Ui,
    id: &str,
    summary: &Summary,
    y_label: &str,
    color_for: impl Fn(&GroupValue, usize) -> Color32,
) {
    let labels: Vec<String> = summary.iter().map(|(key, _)| key.to_string()).collect();
    let charts: Vec<BarChart> = summary
        .iter()
        .enumerate()
        .map(|(i, (key, value))| {
            let bar = Bar::new(i as f64, *value).width(0.6);
            BarChart::new(vec![bar])
                .name(key.to_string())
                .color(color_for(key, i))
        })
        .collect();

    Plot::new(id.to_string())
        .legend(Legend::default())
        .y_axis_label(y_label)
        .height(240.0)
        .allow_drag(false)
        .allow_scroll(false)
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            let i = mark.value.round();
            if (mark.value - i).abs() < 1e-6 && i >= 0.0 && (i as usize) < labels.len() {
                labels[i as usize].clone()
            } else {
                String::new()
            }
        })
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

/// X coordinate used for time axes.
pub fn epoch_seconds(rec: &Record) -> f64 {
    rec.timestamp.and_utc().timestamp() as f64
}

/// Tick labels for time axes fed with [`epoch_seconds`].
pub fn timestamp_formatter(mark: GridMark, _range: &RangeInclusive<f64>) -> String {
    match DateTime::from_timestamp(mark.value as i64, 0) {
        Some(dt) => dt.naive_utc().format("%d/%m %H:%M").to_string(),
        None => String::new(),
    }
}
