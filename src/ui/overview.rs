use eframe::egui::{self, Color32, ComboBox, RichText, ScrollArea, Ui};

use crate::color::status_color;
use crate::data::analysis::{
    aggregate, correlation_matrix, overview_stats, AggregateOp, CorrelationMatrix, GroupKey,
    GroupValue, Metric,
};
use crate::data::error::DataError;
use crate::data::model::Dataset;
use crate::state::{toggle_selection, AppState};
use crate::ui::charts;

// ---------------------------------------------------------------------------
// Overview tab
// ---------------------------------------------------------------------------

pub fn show(ui: &mut Ui, state: &mut AppState, dataset: &Dataset) {
    ui.heading("Machine Overview");
    ui.add_space(4.0);

    let stats = overview_stats(dataset, &state.visible_indices);
    ui.columns(4, |cols: &mut [Ui]| {
        charts::metric_tile(&mut cols[0], "Machines", stats.machines.to_string());
        charts::metric_tile(&mut cols[1], "Readings analysed", stats.records.to_string());
        charts::metric_tile(&mut cols[2], "Failures detected", stats.failures.to_string());
        charts::metric_tile(&mut cols[3], "Failure rate", format!("{:.2}%", stats.failure_rate));
    });

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.separator();
            ui.strong("Status distribution");
            let status_counts = aggregate(
                dataset,
                &state.visible_indices,
                GroupKey::Status,
                Metric::Temperature,
                AggregateOp::Count,
            );
            charts::summary_bars(ui, "status_distribution", &status_counts, "Readings", |key, _| {
                match key {
                    GroupValue::Status(status) => status_color(*status),
                    _ => Color32::GRAY,
                }
            });

            ui.separator();
            ui.strong("Sensor mean per machine");
            ComboBox::from_id_salt("overview_sensor")
                .selected_text(state.overview_sensor.to_string())
                .show_ui(ui, |ui: &mut Ui| {
                    for metric in Metric::ALL {
                        if ui
                            .selectable_label(state.overview_sensor == metric, metric.to_string())
                            .clicked()
                        {
                            state.overview_sensor = metric;
                        }
                    }
                });

            let mut means = aggregate(
                dataset,
                &state.visible_indices,
                GroupKey::Machine,
                state.overview_sensor,
                AggregateOp::Mean,
            );
            // Display order: largest mean first; the engine itself stays
            // key-ordered.
            means.sort_by(|a, b| b.1.total_cmp(&a.1));
            let colors = state.machine_colors.clone();
            charts::summary_bars(
                ui,
                "machine_means",
                &means,
                &state.overview_sensor.to_string(),
                |key, _| match (key, &colors) {
                    (GroupValue::Text(machine), Some(colors)) => colors.color_for(machine),
                    _ => Color32::LIGHT_BLUE,
                },
            );

            ui.separator();
            ui.strong("Sensor correlation");
            ui.horizontal_wrapped(|ui: &mut Ui| {
                for metric in Metric::ALL {
                    let mut checked = state.correlation_metrics.contains(&metric);
                    if ui.checkbox(&mut checked, metric.to_string()).changed() {
                        toggle_selection(&mut state.correlation_metrics, &metric);
                    }
                }
            });

            let metrics: Vec<Metric> = state.correlation_metrics.iter().copied().collect();
            match correlation_matrix(dataset, &state.visible_indices, &metrics) {
                Ok(matrix) => correlation_grid(ui, &matrix),
                Err(DataError::InsufficientInput(_)) => {
                    ui.label(
                        RichText::new("Select at least 2 sensors for correlation analysis.")
                            .color(Color32::YELLOW),
                    );
                }
                Err(e) => {
                    ui.label(RichText::new(e.to_string()).color(Color32::RED));
                }
            }
        });
}

/// Heat grid of pairwise correlations, red positive and blue negative.
/// Zero-variance pairs render as a dash.
fn correlation_grid(ui: &mut Ui, matrix: &CorrelationMatrix) {
    egui::Grid::new("correlation_grid")
        .spacing([6.0, 6.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("");
            for metric in &matrix.metrics {
                ui.strong(metric.to_string());
            }
            ui.end_row();

            for (i, metric) in matrix.metrics.iter().enumerate() {
                ui.strong(metric.to_string());
                for j in 0..matrix.len() {
                    let r = matrix.get(i, j);
                    let text = if r.is_nan() {
                        "—".to_string()
                    } else {
                        format!("{r:+.2}")
                    };
                    ui.label(
                        RichText::new(text)
                            .background_color(correlation_color(r))
                            .color(Color32::BLACK),
                    );
                }
                ui.end_row();
            }
        });
}

fn correlation_color(r: f64) -> Color32 {
    if r.is_nan() {
        return Color32::LIGHT_GRAY;
    }
    let t = r.clamp(-1.0, 1.0) as f32;
    if t >= 0.0 {
        let other = (255.0 * (1.0 - t)) as u8;
        Color32::from_rgb(255, other, other)
    } else {
        let other = (255.0 * (1.0 + t)) as u8;
        Color32::from_rgb(other, other, 255)
    }
}
