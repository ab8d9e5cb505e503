use eframe::egui::{ScrollArea, TextEdit, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::export::ExportFormat;
use crate::data::model::Dataset;
use crate::state::AppState;
use crate::ui::panels;

/// Rows shown in the preview table before the list is cut off.
const PREVIEW_ROWS: usize = 100;

// ---------------------------------------------------------------------------
// Download tab
// ---------------------------------------------------------------------------

pub fn show(ui: &mut Ui, state: &mut AppState, dataset: &Dataset) {
    ui.heading("Download Filtered Data");
    ui.add_space(4.0);

    ui.strong("Export options");
    ui.horizontal(|ui: &mut Ui| {
        for format in ExportFormat::ALL {
            ui.radio_value(&mut state.export_format, format, format.label());
        }
    });
    ui.horizontal(|ui: &mut Ui| {
        ui.label("File name:");
        ui.add(TextEdit::singleline(&mut state.export_base_name).desired_width(220.0));
        ui.weak(format!(".{}", state.export_format.extension()));
        if ui.button("Save…").clicked() {
            panels::save_export_dialog(state);
        }
    });

    ui.separator();
    ui.label(format!(
        "Preview of the filtered readings ({} total):",
        state.visible_indices.len()
    ));

    let preview: Vec<usize> = state
        .visible_indices
        .iter()
        .copied()
        .take(PREVIEW_ROWS)
        .collect();
    let truncated = state.visible_indices.len().saturating_sub(preview.len());

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            preview_table(ui, dataset, &preview);
            if truncated > 0 {
                ui.weak(format!("… {truncated} more rows in the export"));
            }
        });
}

fn preview_table(ui: &mut Ui, dataset: &Dataset, rows: &[usize]) {
    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto().resizable(true))
        .column(Column::auto().resizable(true))
        .column(Column::auto().resizable(true))
        .column(Column::auto().resizable(true))
        .column(Column::auto().resizable(true))
        .column(Column::auto().resizable(true))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            for title in [
                "Machine",
                "Timestamp",
                "Status",
                "Temperature",
                "Vibration",
                "Failure type",
                "Maintenance",
            ] {
                header.col(|ui: &mut Ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for &idx in rows {
                let rec = &dataset.records[idx];
                body.row(18.0, |mut row| {
                    row.col(|ui: &mut Ui| {
                        ui.label(&rec.machine);
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(rec.timestamp.format("%Y-%m-%d %H:%M:%S").to_string());
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(rec.machine_status.to_string());
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(format!("{:.1}", rec.temperature));
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(format!("{:.1}", rec.vibration));
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(&rec.failure_type);
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(if rec.maintenance_required { "Yes" } else { "No" });
                    });
                });
            }
        });
}
