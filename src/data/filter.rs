use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::model::{Dataset, MachineStatus, Record};

// ---------------------------------------------------------------------------
// Filter criteria: which facet values are selected
// ---------------------------------------------------------------------------

/// Maintenance facet, a tri-state radio in the filter panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaintenanceFilter {
    /// No constraint on the maintenance flag.
    #[default]
    Any,
    /// Only readings flagged as needing maintenance.
    RequiredOnly,
    /// Only readings without the flag.
    NotRequired,
}

/// Conjunction of facet predicates applied to the dataset. All active
/// predicates combine with logical AND; the date range is inclusive on
/// both ends.
///
/// An empty selection set on a categorical facet matches nothing, same as
/// an empty multiselect in the filter panel. The panel starts from
/// [`FilterCriteria::select_all`] so that state is only reachable by
/// deselecting every value by hand.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub machines: BTreeSet<String>,
    pub statuses: BTreeSet<MachineStatus>,
    pub failure_types: BTreeSet<String>,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub maintenance: MaintenanceFilter,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid epoch date");
        FilterCriteria {
            machines: BTreeSet::new(),
            statuses: BTreeSet::new(),
            failure_types: BTreeSet::new(),
            date_from: epoch,
            date_to: epoch,
            maintenance: MaintenanceFilter::Any,
        }
    }
}

impl FilterCriteria {
    /// Criteria that let every row of `dataset` through, the panel's
    /// initial state after a load.
    pub fn select_all(dataset: &Dataset) -> Self {
        let default = FilterCriteria::default();
        let (date_from, date_to) = dataset
            .date_span
            .unwrap_or((default.date_from, default.date_to));

        FilterCriteria {
            machines: dataset.machines.iter().cloned().collect(),
            statuses: MachineStatus::ALL.into_iter().collect(),
            failure_types: dataset.failure_types.iter().cloned().collect(),
            date_from,
            date_to,
            maintenance: MaintenanceFilter::Any,
        }
    }

    fn matches(&self, rec: &Record) -> bool {
        if !self.machines.contains(&rec.machine) {
            return false;
        }
        if !self.statuses.contains(&rec.machine_status) {
            return false;
        }
        if !self.failure_types.contains(&rec.failure_type) {
            return false;
        }
        if rec.date < self.date_from || rec.date > self.date_to {
            return false;
        }
        match self.maintenance {
            MaintenanceFilter::Any => true,
            MaintenanceFilter::RequiredOnly => rec.maintenance_required,
            MaintenanceFilter::NotRequired => !rec.maintenance_required,
        }
    }
}

/// Indices of records passing every active predicate, in dataset row order.
/// An empty result is a valid view, never an error.
pub fn filter_records(dataset: &Dataset, criteria: &FilterCriteria) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| criteria.matches(rec))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::record_at;

    fn sample_dataset() -> Dataset {
        let mut records = vec![
            record_at("M1", "2024-01-01 02:00:00", 95.0, 10.0),
            record_at("M2", "2024-01-02 08:00:00", 50.0, 80.0),
            record_at("M1", "2024-01-03 14:00:00", 60.0, 20.0),
            record_at("M3", "2024-01-04 20:00:00", 40.0, 20.0),
            record_at("M2", "2024-01-05 11:00:00", 55.0, 30.0),
        ];
        records[1].machine_status = MachineStatus::Failure;
        records[1].failure_type = "Bearing Wear".to_string();
        records[3].maintenance_required = true;
        Dataset::from_records(records)
    }

    #[test]
    fn select_all_returns_everything() {
        let ds = sample_dataset();
        let criteria = FilterCriteria::select_all(&ds);
        assert_eq!(filter_records(&ds, &criteria), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn view_is_an_ordered_subset() {
        let ds = sample_dataset();
        let mut criteria = FilterCriteria::select_all(&ds);
        criteria.machines.remove("M2");
        let view = filter_records(&ds, &criteria);
        assert_eq!(view, vec![0, 2, 3]);
        assert!(view.windows(2).all(|w| w[0] < w[1]));
        assert!(view.iter().all(|&i| i < ds.len()));
    }

    #[test]
    fn empty_machine_selection_excludes_all_rows() {
        let ds = sample_dataset();
        let mut criteria = FilterCriteria::select_all(&ds);
        criteria.machines.clear();
        assert!(filter_records(&ds, &criteria).is_empty());
    }

    #[test]
    fn date_range_is_inclusive_on_both_ends() {
        let ds = sample_dataset();
        let mut criteria = FilterCriteria::select_all(&ds);
        criteria.date_from = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        criteria.date_to = NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();
        assert_eq!(filter_records(&ds, &criteria), vec![1, 2, 3]);
    }

    #[test]
    fn status_facet_filters_by_reported_state() {
        let ds = sample_dataset();
        let mut criteria = FilterCriteria::select_all(&ds);
        criteria.statuses = [MachineStatus::Failure].into_iter().collect();
        assert_eq!(filter_records(&ds, &criteria), vec![1]);
    }

    #[test]
    fn maintenance_filter_is_a_tri_state() {
        let ds = sample_dataset();
        let mut criteria = FilterCriteria::select_all(&ds);

        criteria.maintenance = MaintenanceFilter::RequiredOnly;
        assert_eq!(filter_records(&ds, &criteria), vec![3]);

        criteria.maintenance = MaintenanceFilter::NotRequired;
        assert_eq!(filter_records(&ds, &criteria), vec![0, 1, 2, 4]);

        criteria.maintenance = MaintenanceFilter::Any;
        assert_eq!(filter_records(&ds, &criteria).len(), ds.len());
    }

    #[test]
    fn failure_type_facet() {
        let ds = sample_dataset();
        let mut criteria = FilterCriteria::select_all(&ds);
        criteria.failure_types.remove("Bearing Wear");
        assert_eq!(filter_records(&ds, &criteria), vec![0, 2, 3, 4]);
    }

    #[test]
    fn no_match_yields_an_empty_view_not_an_error() {
        let ds = sample_dataset();
        let mut criteria = FilterCriteria::select_all(&ds);
        criteria.date_from = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        criteria.date_to = NaiveDate::from_ymd_opt(2030, 12, 31).unwrap();
        assert!(filter_records(&ds, &criteria).is_empty());
    }
}
