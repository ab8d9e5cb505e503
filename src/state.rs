use std::collections::BTreeSet;
use std::sync::Arc;

use crate::color::MachineColors;
use crate::data::analysis::Metric;
use crate::data::export::ExportFormat;
use crate::data::filter::{filter_records, FilterCriteria};
use crate::data::loader::DatasetCache;
use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

/// Dashboard tab shown in the central panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Overview,
    MachineAnalysis,
    FailureMonitoring,
    Download,
}

impl Tab {
    pub const ALL: [Tab; 4] = [
        Tab::Overview,
        Tab::MachineAnalysis,
        Tab::FailureMonitoring,
        Tab::Download,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::MachineAnalysis => "Machine Analysis",
            Tab::FailureMonitoring => "Failure Monitoring",
            Tab::Download => "Download",
        }
    }
}

// ---------------------------------------------------------------------------
// Status line
// ---------------------------------------------------------------------------

/// Message shown at the right end of the top bar.
#[derive(Debug, Clone)]
pub enum StatusLine {
    Info(String),
    Error(String),
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Load-once cache; datasets stay alive for the process lifetime.
    pub cache: DatasetCache,

    /// Currently displayed dataset (None until the user opens a file).
    pub dataset: Option<Arc<Dataset>>,

    /// Facet selections applied to the dataset.
    pub criteria: FilterCriteria,

    /// Indices of records passing the current criteria (cached).
    pub visible_indices: Vec<usize>,

    /// Active tab.
    pub tab: Tab,

    /// Per-machine colours, rebuilt on every load.
    pub machine_colors: Option<MachineColors>,

    // ---- Overview tab ----
    pub overview_sensor: Metric,
    pub correlation_metrics: BTreeSet<Metric>,

    // ---- Machine analysis tab ----
    pub selected_machine: Option<String>,
    pub series_metrics: BTreeSet<Metric>,
    pub daily_metric: Metric,

    // ---- Failure monitoring tab ----
    pub temp_threshold: f64,
    pub vibration_threshold: f64,

    // ---- Download tab ----
    pub export_format: ExportFormat,
    pub export_base_name: String,

    /// Status / error message shown in the top bar.
    pub status_message: Option<StatusLine>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            cache: DatasetCache::default(),
            dataset: None,
            criteria: FilterCriteria::default(),
            visible_indices: Vec::new(),
            tab: Tab::default(),
            machine_colors: None,
            overview_sensor: Metric::Temperature,
            correlation_metrics: [Metric::Temperature, Metric::Vibration, Metric::EnergyConsumption]
                .into_iter()
                .collect(),
            selected_machine: None,
            series_metrics: [Metric::Temperature, Metric::Vibration].into_iter().collect(),
            daily_metric: Metric::Temperature,
            temp_threshold: 90.0,
            vibration_threshold: 70.0,
            export_format: ExportFormat::default(),
            export_base_name: "filtered_sensor_data".to_string(),
            status_message: None,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded dataset: reset criteria to select-all, show
    /// every row, rebuild colours.
    pub fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        self.criteria = FilterCriteria::select_all(&dataset);
        self.visible_indices = (0..dataset.len()).collect();
        self.machine_colors = Some(MachineColors::new(&dataset.machines));
        self.selected_machine = dataset.machines.first().cloned();
        self.dataset = Some(dataset);
        self.status_message = None;
    }

    /// Recompute `visible_indices` after a criteria change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.visible_indices = filter_records(ds, &self.criteria);
        }
    }

    /// Keep the machine selector valid when filters change the machine set.
    pub fn ensure_selected_machine(&mut self) {
        let Some(ds) = &self.dataset else { return };
        let valid = self
            .selected_machine
            .as_ref()
            .is_some_and(|m| self.criteria.machines.contains(m));
        if !valid {
            self.selected_machine = self.criteria.machines.iter().next().cloned().or_else(|| ds.machines.first().cloned());
        }
    }
}

/// Toggle `value` in a selection set.
pub fn toggle_selection<T: Ord + Clone>(set: &mut BTreeSet<T>, value: &T) {
    if !set.remove(value) {
        set.insert(value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::record_at;

    #[test]
    fn set_dataset_initialises_selection_state() {
        let ds = Arc::new(Dataset::from_records(vec![
            record_at("M1", "2024-01-01 02:00:00", 95.0, 10.0),
            record_at("M2", "2024-01-01 08:00:00", 50.0, 80.0),
        ]));

        let mut state = AppState::default();
        state.set_dataset(Arc::clone(&ds));

        assert_eq!(state.visible_indices, vec![0, 1]);
        assert_eq!(state.selected_machine.as_deref(), Some("M1"));
        assert_eq!(state.criteria.machines.len(), 2);

        state.criteria.machines.remove("M1");
        state.refilter();
        state.ensure_selected_machine();
        assert_eq!(state.visible_indices, vec![1]);
        assert_eq!(state.selected_machine.as_deref(), Some("M2"));
    }

    #[test]
    fn toggle_selection_flips_membership() {
        let mut set: BTreeSet<u32> = [1, 2].into_iter().collect();
        toggle_selection(&mut set, &2);
        assert!(!set.contains(&2));
        toggle_selection(&mut set, &2);
        assert!(set.contains(&2));
    }
}
