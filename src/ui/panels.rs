use anyhow::Context;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::export::{export_file_name, write_view};
use crate::data::filter::MaintenanceFilter;
use crate::data::model::MachineStatus;
use crate::state::{toggle_selection, AppState, StatusLine, Tab};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.label("No dataset loaded.");
            return;
        }
    };

    // Clone the facet lists so we can mutate state inside the loops.
    let machines = dataset.machines.clone();
    let failure_types = dataset.failure_types.clone();
    let date_span = dataset.date_span;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Machines ----
            let header = format!(
                "Machines  ({}/{})",
                state.criteria.machines.len(),
                machines.len()
            );
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("facet_machines")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            state.criteria.machines = machines.iter().cloned().collect();
                        }
                        if ui.small_button("None").clicked() {
                            state.criteria.machines.clear();
                        }
                    });
                    for machine in &machines {
                        let mut checked = state.criteria.machines.contains(machine);
                        let mut text = RichText::new(machine);
                        if let Some(colors) = &state.machine_colors {
                            text = text.color(colors.color_for(machine));
                        }
                        if ui.checkbox(&mut checked, text).changed() {
                            toggle_selection(&mut state.criteria.machines, machine);
                        }
                    }
                });

            ui.separator();

            // ---- Date range ----
            ui.strong("Date range");
            ui.horizontal(|ui: &mut Ui| {
                ui.label("From");
                let mut from = state.criteria.date_from;
                if ui
                    .add(DatePickerButton::new(&mut from).id_salt("date_from"))
                    .changed()
                {
                    state.criteria.date_from = from;
                }
            });
            ui.horizontal(|ui: &mut Ui| {
                ui.label("To");
                let mut to = state.criteria.date_to;
                if ui
                    .add(DatePickerButton::new(&mut to).id_salt("date_to"))
                    .changed()
                {
                    state.criteria.date_to = to;
                }
            });
            if let Some((min, max)) = date_span {
                if ui.small_button("Full range").clicked() {
                    state.criteria.date_from = min;
                    state.criteria.date_to = max;
                }
            }

            ui.separator();

            // ---- Status ----
            let header = format!(
                "Status  ({}/{})",
                state.criteria.statuses.len(),
                MachineStatus::ALL.len()
            );
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("facet_status")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    for status in MachineStatus::ALL {
                        let mut checked = state.criteria.statuses.contains(&status);
                        let text = RichText::new(status.to_string())
                            .color(crate::color::status_color(status));
                        if ui.checkbox(&mut checked, text).changed() {
                            toggle_selection(&mut state.criteria.statuses, &status);
                        }
                    }
                });

            ui.separator();

            // ---- Maintenance ----
            ui.strong("Maintenance");
            ui.radio_value(&mut state.criteria.maintenance, MaintenanceFilter::Any, "All readings");
            ui.radio_value(
                &mut state.criteria.maintenance,
                MaintenanceFilter::RequiredOnly,
                "Needs maintenance",
            );
            ui.radio_value(
                &mut state.criteria.maintenance,
                MaintenanceFilter::NotRequired,
                "No maintenance",
            );

            ui.separator();

            // ---- Failure type ----
            let header = format!(
                "Failure type  ({}/{})",
                state.criteria.failure_types.len(),
                failure_types.len()
            );
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("facet_failure_type")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            state.criteria.failure_types = failure_types.iter().cloned().collect();
                        }
                        if ui.small_button("None").clicked() {
                            state.criteria.failure_types.clear();
                        }
                    });
                    for failure_type in &failure_types {
                        let mut checked = state.criteria.failure_types.contains(failure_type);
                        if ui.checkbox(&mut checked, failure_type).changed() {
                            toggle_selection(&mut state.criteria.failure_types, failure_type);
                        }
                    }
                });
        });

    // Recompute the view after any widget changes.
    state.refilter();
    state.ensure_selected_machine();
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar with the tab switcher.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        for tab in Tab::ALL {
            if ui.selectable_label(state.tab == tab, tab.title()).clicked() {
                state.tab = tab;
            }
        }

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} readings loaded, {} after filters",
                ds.len(),
                state.visible_indices.len()
            ));
        }

        match &state.status_message {
            Some(StatusLine::Error(msg)) => {
                ui.label(RichText::new(msg).color(Color32::RED));
            }
            Some(StatusLine::Info(msg)) => {
                ui.label(RichText::new(msg).color(Color32::LIGHT_GREEN));
            }
            None => {}
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open sensor log")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        let result = state
            .cache
            .load(&path)
            .with_context(|| format!("loading {}", path.display()));
        match result {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} readings from {} machines",
                    dataset.len(),
                    dataset.machines.len()
                );
                state.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(StatusLine::Error(format!("Error: {e:#}")));
            }
        }
    }
}

/// Save the filtered view via the platform save dialog, in the format and
/// base name chosen on the download tab.
pub fn save_export_dialog(state: &mut AppState) {
    let Some(dataset) = state.dataset.clone() else {
        return;
    };

    let suggested = export_file_name(&state.export_base_name, state.export_format);
    let file = rfd::FileDialog::new()
        .set_title("Save filtered data")
        .set_file_name(&suggested)
        .save_file();

    if let Some(path) = file {
        let result = write_view(&dataset, &state.visible_indices, state.export_format, &path)
            .with_context(|| format!("writing {}", path.display()));
        match result {
            Ok(()) => {
                log::info!(
                    "Exported {} readings to {}",
                    state.visible_indices.len(),
                    path.display()
                );
                state.status_message = Some(StatusLine::Info(format!(
                    "Exported {} readings",
                    state.visible_indices.len()
                )));
            }
            Err(e) => {
                log::error!("Export failed: {e:#}");
                state.status_message = Some(StatusLine::Error(format!("Error: {e:#}")));
            }
        }
    }
}
