use eframe::egui::{Color32, ComboBox, RichText, ScrollArea, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoints};

use crate::color::{generate_palette, status_color};
use crate::data::analysis::{
    aggregate, latest_record, machine_view, AggregateOp, GroupKey, GroupValue, Metric,
};
use crate::data::model::Dataset;
use crate::state::{toggle_selection, AppState};
use crate::ui::charts;

// ---------------------------------------------------------------------------
// Machine analysis tab
// ---------------------------------------------------------------------------

pub fn show(ui: &mut Ui, state: &mut AppState, dataset: &Dataset) {
    ui.heading("Detailed Machine Analysis");
    ui.add_space(4.0);

    // Only machines surviving the machine facet are offered.
    let selectable: Vec<String> = dataset
        .machines
        .iter()
        .filter(|m| state.criteria.machines.contains(*m))
        .cloned()
        .collect();
    if selectable.is_empty() {
        ui.label("No machines selected in the filter panel.");
        return;
    }

    let mut machine = state
        .selected_machine
        .clone()
        .unwrap_or_else(|| selectable[0].clone());
    ComboBox::from_id_salt("machine_selector")
        .selected_text(machine.clone())
        .show_ui(ui, |ui: &mut Ui| {
            for candidate in &selectable {
                if ui
                    .selectable_label(machine == *candidate, candidate)
                    .clicked()
                {
                    machine = candidate.clone();
                }
            }
        });
    state.selected_machine = Some(machine.clone());

    let sub_view = machine_view(dataset, &state.visible_indices, &machine);
    if sub_view.is_empty() {
        ui.label("No readings for this machine under the current filters.");
        return;
    }

    if let Some(latest) = latest_record(dataset, &state.visible_indices, &machine) {
        ui.add_space(4.0);
        ui.columns(4, |cols: &mut [Ui]| {
            cols[0].vertical(|ui: &mut Ui| {
                ui.label(RichText::new("Last status").small().weak());
                ui.label(
                    RichText::new(latest.machine_status.to_string())
                        .heading()
                        .color(status_color(latest.machine_status)),
                );
            });
            charts::metric_tile(&mut cols[1], "Temperature", format!("{:.1} °C", latest.temperature));
            charts::metric_tile(&mut cols[2], "Vibration", format!("{:.1}", latest.vibration));
            charts::metric_tile(
                &mut cols[3],
                "Remaining life",
                format!("{:.0} h", latest.predicted_remaining_life),
            );
        });
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.separator();
            ui.strong("Sensor time series");
            ui.horizontal_wrapped(|ui: &mut Ui| {
                for metric in Metric::ALL {
                    let mut checked = state.series_metrics.contains(&metric);
                    if ui.checkbox(&mut checked, metric.to_string()).changed() {
                        toggle_selection(&mut state.series_metrics, &metric);
                    }
                }
            });

            let palette = generate_palette(Metric::ALL.len());
            Plot::new("machine_time_series")
                .legend(Legend::default())
                .height(280.0)
                .x_axis_formatter(charts::timestamp_formatter)
                .show(ui, |plot_ui| {
                    for (i, metric) in Metric::ALL.into_iter().enumerate() {
                        if !state.series_metrics.contains(&metric) {
                            continue;
                        }
                        let points: PlotPoints = sub_view
                            .iter()
                            .map(|&idx| {
                                let rec = &dataset.records[idx];
                                [charts::epoch_seconds(rec), metric.value(rec)]
                            })
                            .collect();
                        plot_ui.line(
                            Line::new(points)
                                .name(metric.to_string())
                                .color(palette[i])
                                .width(1.5),
                        );
                    }
                });

            ui.separator();
            ui.strong("Daily pattern");
            ComboBox::from_id_salt("daily_metric")
                .selected_text(state.daily_metric.to_string())
                .show_ui(ui, |ui: &mut Ui| {
                    for metric in Metric::ALL {
                        if ui
                            .selectable_label(state.daily_metric == metric, metric.to_string())
                            .clicked()
                        {
                            state.daily_metric = metric;
                        }
                    }
                });

            let hourly = aggregate(
                dataset,
                &sub_view,
                GroupKey::Hour,
                state.daily_metric,
                AggregateOp::Mean,
            );
            let points: PlotPoints = hourly
                .iter()
                .map(|(key, value)| {
                    let hour = match key {
                        GroupValue::Hour(h) => *h as f64,
                        _ => 0.0,
                    };
                    [hour, *value]
                })
                .collect();
            Plot::new("hourly_pattern")
                .height(220.0)
                .x_axis_label("Hour of day")
                .y_axis_label(state.daily_metric.to_string())
                .show(ui, |plot_ui| {
                    plot_ui.line(
                        Line::new(points)
                            .name(state.daily_metric.to_string())
                            .color(Color32::LIGHT_BLUE)
                            .width(2.0),
                    );
                });

            ui.separator();
            ui.strong("Mean by day part");
            let by_part = aggregate(
                dataset,
                &sub_view,
                GroupKey::DayPart,
                state.daily_metric,
                AggregateOp::Mean,
            );
            let part_palette = generate_palette(by_part.len());
            charts::summary_bars(
                ui,
                "day_part_means",
                &by_part,
                &state.daily_metric.to_string(),
                |_, i| part_palette[i],
            );
        });
}
