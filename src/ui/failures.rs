use eframe::egui::{Color32, RichText, ScrollArea, Slider, Ui};
use egui_plot::{Legend, Plot, PlotPoints, Points};
use egui_extras::{Column, TableBuilder};

use crate::color::generate_palette;
use crate::data::analysis::{detect_anomalies, failure_type_counts, maintenance_counts, GroupValue};
use crate::data::model::Dataset;
use crate::state::AppState;
use crate::ui::charts;

// ---------------------------------------------------------------------------
// Failure monitoring tab
// ---------------------------------------------------------------------------

pub fn show(ui: &mut Ui, state: &mut AppState, dataset: &Dataset) {
    ui.heading("Failure Monitoring");
    ui.add_space(4.0);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.strong("Anomaly detection");
            ui.add(
                Slider::new(&mut state.temp_threshold, 50.0..=120.0)
                    .text("Temperature threshold (°C)"),
            );
            ui.add(
                Slider::new(&mut state.vibration_threshold, 0.0..=100.0)
                    .text("Vibration threshold"),
            );

            let anomalies = detect_anomalies(
                dataset,
                &state.visible_indices,
                state.temp_threshold,
                state.vibration_threshold,
            );

            if anomalies.is_empty() {
                ui.label("No anomalies detected with the current thresholds.");
            } else {
                anomaly_scatter(ui, state, dataset, &anomalies);
                ui.add_space(6.0);
                ui.strong(format!("Anomalous readings ({})", anomalies.len()));
                anomaly_table(ui, dataset, &anomalies);
            }

            ui.separator();
            ui.strong("Failure types");
            let failures = failure_type_counts(dataset, &state.visible_indices);
            if failures.is_empty() {
                ui.label("No failures in the selected period.");
            } else {
                let palette = generate_palette(failures.len());
                charts::summary_bars(ui, "failure_types", &failures, "Readings", |_, i| palette[i]);
            }

            ui.separator();
            ui.strong("Machines needing maintenance");
            let mut maintenance = maintenance_counts(dataset, &state.visible_indices);
            maintenance.sort_by(|a, b| b.1.total_cmp(&a.1));
            if maintenance.is_empty() {
                ui.label("No maintenance flagged in the selected period.");
            } else {
                let colors = state.machine_colors.clone();
                charts::summary_bars(ui, "maintenance_counts", &maintenance, "Flagged readings", |key, _| {
                    match (key, &colors) {
                        (GroupValue::Text(machine), Some(colors)) => colors.color_for(machine),
                        _ => Color32::LIGHT_BLUE,
                    }
                });
            }
        });
}

/// Temperature-over-time scatter of the anomalous readings, split by which
/// threshold each reading tripped.
fn anomaly_scatter(ui: &mut Ui, state: &AppState, dataset: &Dataset, anomalies: &[usize]) {
    let mut by_temperature: Vec<[f64; 2]> = Vec::new();
    let mut by_vibration: Vec<[f64; 2]> = Vec::new();
    let mut by_both: Vec<[f64; 2]> = Vec::new();

    for &idx in anomalies {
        let rec = &dataset.records[idx];
        let point = [charts::epoch_seconds(rec), rec.temperature];
        let hot = rec.temperature > state.temp_threshold;
        let shaky = rec.vibration > state.vibration_threshold;
        match (hot, shaky) {
            (true, true) => by_both.push(point),
            (true, false) => by_temperature.push(point),
            _ => by_vibration.push(point),
        }
    }

    Plot::new("anomaly_scatter")
        .legend(Legend::default())
        .height(260.0)
        .y_axis_label("Temperature")
        .x_axis_formatter(charts::timestamp_formatter)
        .show(ui, |plot_ui| {
            for (points, name, color) in [
                (by_temperature, "High temperature", Color32::from_rgb(0xe7, 0x4c, 0x3c)),
                (by_vibration, "High vibration", Color32::from_rgb(0xf3, 0x9c, 0x12)),
                (by_both, "Both", Color32::from_rgb(0x8e, 0x44, 0xad)),
            ] {
                if points.is_empty() {
                    continue;
                }
                let plot_points: PlotPoints = points.into_iter().collect();
                plot_ui.points(Points::new(plot_points).name(name).color(color).radius(3.0));
            }
        });
}

/// Anomalous readings, newest first.
fn anomaly_table(ui: &mut Ui, dataset: &Dataset, anomalies: &[usize]) {
    let mut rows = anomalies.to_vec();
    rows.sort_by_key(|&idx| std::cmp::Reverse(dataset.records[idx].timestamp));

    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto().resizable(true))
        .column(Column::auto().resizable(true))
        .column(Column::auto().resizable(true))
        .column(Column::auto().resizable(true))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            for title in ["Machine", "Timestamp", "Temperature", "Vibration", "Failure type"] {
                header.col(|ui: &mut Ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for &idx in &rows {
                let rec = &dataset.records[idx];
                body.row(18.0, |mut row| {
                    row.col(|ui: &mut Ui| {
                        ui.label(&rec.machine);
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(rec.timestamp.format("%Y-%m-%d %H:%M:%S").to_string());
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(format!("{:.1}", rec.temperature));
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(format!("{:.1}", rec.vibration));
                    });
                    row.col(|ui: &mut Ui| {
                        let text = if rec.is_failure_event() {
                            RichText::new(&rec.failure_type).color(Color32::RED)
                        } else {
                            RichText::new(&rec.failure_type)
                        };
                        ui.label(text);
                    });
                });
            }
        });
}
