use eframe::egui::{self, Color32, RichText};

use crate::state::{AppState, Tab};
use crate::ui::{download, failures, machine, overview, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct PlantPulseApp {
    pub state: AppState,
}

impl Default for PlantPulseApp {
    fn default() -> Self {
        Self {
            state: AppState::default(),
        }
    }
}

impl eframe::App for PlantPulseApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar and tab switcher ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: active tab ----
        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(dataset) = self.state.dataset.clone() else {
                ui.centered_and_justified(|ui: &mut egui::Ui| {
                    ui.heading("Open a sensor log to begin  (File → Open…)");
                });
                return;
            };

            if self.state.visible_indices.is_empty() {
                ui.centered_and_justified(|ui: &mut egui::Ui| {
                    ui.label(
                        RichText::new(
                            "No readings match the current filters. Adjust the criteria in the side panel.",
                        )
                        .color(Color32::YELLOW),
                    );
                });
                return;
            }

            match self.state.tab {
                Tab::Overview => overview::show(ui, &mut self.state, &dataset),
                Tab::MachineAnalysis => machine::show(ui, &mut self.state, &dataset),
                Tab::FailureMonitoring => failures::show(ui, &mut self.state, &dataset),
                Tab::Download => download::show(ui, &mut self.state, &dataset),
            }
        });
    }
}
