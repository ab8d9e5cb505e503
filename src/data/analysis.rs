use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;

use super::error::{DataError, Result};
use super::model::{Dataset, DayPart, MachineStatus, Record};

// ---------------------------------------------------------------------------
// Aggregation vocabulary
// ---------------------------------------------------------------------------

/// Column a summary groups over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Machine,
    Date,
    Hour,
    DayPart,
    Status,
    FailureType,
}

/// Numeric sensor column an aggregation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    Temperature,
    Vibration,
    Humidity,
    Pressure,
    EnergyConsumption,
    RemainingLife,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Temperature,
        Metric::Vibration,
        Metric::Humidity,
        Metric::Pressure,
        Metric::EnergyConsumption,
        Metric::RemainingLife,
    ];

    /// Read this metric's value off a record.
    pub fn value(self, rec: &Record) -> f64 {
        match self {
            Metric::Temperature => rec.temperature,
            Metric::Vibration => rec.vibration,
            Metric::Humidity => rec.humidity,
            Metric::Pressure => rec.pressure,
            Metric::EnergyConsumption => rec.energy_consumption,
            Metric::RemainingLife => rec.predicted_remaining_life,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Metric::Temperature => "Temperature",
            Metric::Vibration => "Vibration",
            Metric::Humidity => "Humidity",
            Metric::Pressure => "Pressure",
            Metric::EnergyConsumption => "Energy consumption",
            Metric::RemainingLife => "Remaining life",
        };
        write!(f, "{s}")
    }
}

/// Reduction applied within each group. `Count` ignores the metric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Mean,
    Sum,
    Count,
}

// ---------------------------------------------------------------------------
// GroupValue – one group's key within a summary
// ---------------------------------------------------------------------------

/// A distinct value of the grouping column. Ordered by the column's natural
/// order, so hours sort numerically rather than lexically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupValue {
    Text(String),
    Hour(u32),
    Date(NaiveDate),
    DayPart(DayPart),
    Status(MachineStatus),
}

impl PartialOrd for GroupValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GroupValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use GroupValue::*;
        fn discriminant(v: &GroupValue) -> u8 {
            match v {
                Text(_) => 0,
                Hour(_) => 1,
                Date(_) => 2,
                DayPart(_) => 3,
                Status(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Text(a), Text(b)) => a.cmp(b),
            (Hour(a), Hour(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            (DayPart(a), DayPart(b)) => a.cmp(b),
            (Status(a), Status(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl fmt::Display for GroupValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupValue::Text(s) => write!(f, "{s}"),
            GroupValue::Hour(h) => write!(f, "{h:02}h"),
            GroupValue::Date(d) => write!(f, "{d}"),
            GroupValue::DayPart(p) => write!(f, "{p}"),
            GroupValue::Status(s) => write!(f, "{s}"),
        }
    }
}

/// Grouped aggregation result: one `(group value, aggregate)` row per
/// distinct group value present in the view, ascending by group value.
pub type Summary = Vec<(GroupValue, f64)>;

fn group_value(rec: &Record, key: GroupKey) -> GroupValue {
    match key {
        GroupKey::Machine => GroupValue::Text(rec.machine.clone()),
        GroupKey::Date => GroupValue::Date(rec.date),
        GroupKey::Hour => GroupValue::Hour(rec.hour),
        GroupKey::DayPart => GroupValue::DayPart(rec.day_part),
        GroupKey::Status => GroupValue::Status(rec.machine_status),
        GroupKey::FailureType => GroupValue::Text(rec.failure_type.clone()),
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Group the view by `key` and reduce `metric` with `op` within each group.
/// An empty view produces an empty summary.
pub fn aggregate(
    dataset: &Dataset,
    view: &[usize],
    key: GroupKey,
    metric: Metric,
    op: AggregateOp,
) -> Summary {
    let mut groups: BTreeMap<GroupValue, (f64, usize)> = BTreeMap::new();

    for &idx in view {
        let rec = &dataset.records[idx];
        let entry = groups.entry(group_value(rec, key)).or_insert((0.0, 0));
        entry.0 += metric.value(rec);
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|(k, (sum, n))| {
            let value = match op {
                AggregateOp::Mean => sum / n as f64,
                AggregateOp::Sum => sum,
                AggregateOp::Count => n as f64,
            };
            (k, value)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Anomaly detection
// ---------------------------------------------------------------------------

/// Readings whose temperature or vibration strictly exceeds its threshold,
/// in view order. A reading exactly at a threshold is not anomalous.
pub fn detect_anomalies(
    dataset: &Dataset,
    view: &[usize],
    temp_threshold: f64,
    vibration_threshold: f64,
) -> Vec<usize> {
    view.iter()
        .copied()
        .filter(|&idx| {
            let rec = &dataset.records[idx];
            rec.temperature > temp_threshold || rec.vibration > vibration_threshold
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// Symmetric Pearson correlation matrix over the chosen metrics within a
/// view. Entries involving a zero-variance column are NaN.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub metrics: Vec<Metric>,
    values: Vec<f64>,
}

impl CorrelationMatrix {
    /// Correlation between `metrics[i]` and `metrics[j]`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.metrics.len() + j]
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// Compute the correlation matrix. Fails when fewer than two metrics are
/// requested; a single column correlates with nothing.
pub fn correlation_matrix(
    dataset: &Dataset,
    view: &[usize],
    metrics: &[Metric],
) -> Result<CorrelationMatrix> {
    if metrics.len() < 2 {
        return Err(DataError::InsufficientInput(format!(
            "correlation needs at least 2 metrics, got {}",
            metrics.len()
        )));
    }

    let columns: Vec<Vec<f64>> = metrics
        .iter()
        .map(|m| view.iter().map(|&idx| m.value(&dataset.records[idx])).collect())
        .collect();

    let n = metrics.len();
    let mut values = vec![0.0; n * n];
    for i in 0..n {
        for j in i..n {
            let r = pearson(&columns[i], &columns[j]);
            values[i * n + j] = r;
            values[j * n + i] = r;
        }
    }

    Ok(CorrelationMatrix {
        metrics: metrics.to_vec(),
        values,
    })
}

/// Pearson's r. NaN for an empty view or when either column has zero
/// variance.
fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len();
    if n == 0 {
        return f64::NAN;
    }
    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return f64::NAN;
    }
    cov / (var_a.sqrt() * var_b.sqrt())
}

// ---------------------------------------------------------------------------
// Dashboard summaries
// ---------------------------------------------------------------------------

/// Headline numbers for the overview tab. `failure_rate` is a percentage,
/// zero for an empty view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverviewStats {
    pub machines: usize,
    pub records: usize,
    pub failures: usize,
    pub failure_rate: f64,
}

pub fn overview_stats(dataset: &Dataset, view: &[usize]) -> OverviewStats {
    let mut machines: BTreeSet<&str> = BTreeSet::new();
    let mut failures = 0usize;
    for &idx in view {
        let rec = &dataset.records[idx];
        machines.insert(rec.machine.as_str());
        if rec.machine_status == MachineStatus::Failure {
            failures += 1;
        }
    }
    let records = view.len();
    let failure_rate = if records == 0 {
        0.0
    } else {
        failures as f64 / records as f64 * 100.0
    };
    OverviewStats {
        machines: machines.len(),
        records,
        failures,
        failure_rate,
    }
}

/// Sub-view restricted to one machine, preserving view order.
pub fn machine_view(dataset: &Dataset, view: &[usize], machine: &str) -> Vec<usize> {
    view.iter()
        .copied()
        .filter(|&idx| dataset.records[idx].machine == machine)
        .collect()
}

/// Last reading of `machine` within the view, in row order.
pub fn latest_record<'a>(dataset: &'a Dataset, view: &[usize], machine: &str) -> Option<&'a Record> {
    view.iter()
        .rev()
        .map(|&idx| &dataset.records[idx])
        .find(|rec| rec.machine == machine)
}

/// Count per failure type over readings carrying an actual failure type.
pub fn failure_type_counts(dataset: &Dataset, view: &[usize]) -> Summary {
    let failing: Vec<usize> = view
        .iter()
        .copied()
        .filter(|&idx| dataset.records[idx].is_failure_event())
        .collect();
    aggregate(dataset, &failing, GroupKey::FailureType, Metric::Temperature, AggregateOp::Count)
}

/// Readings flagged for maintenance, counted per machine.
pub fn maintenance_counts(dataset: &Dataset, view: &[usize]) -> Summary {
    let flagged: Vec<usize> = view
        .iter()
        .copied()
        .filter(|&idx| dataset.records[idx].maintenance_required)
        .collect();
    aggregate(dataset, &flagged, GroupKey::Machine, Metric::Temperature, AggregateOp::Count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::record_at;

    fn scenario_dataset() -> Dataset {
        // The three-machine scenario: one hot reading, one shaky reading,
        // one quiet reading.
        Dataset::from_records(vec![
            record_at("M1", "2024-01-01 02:00:00", 95.0, 10.0),
            record_at("M2", "2024-01-01 08:00:00", 50.0, 80.0),
            record_at("M3", "2024-01-01 20:00:00", 40.0, 20.0),
        ])
    }

    fn full_view(ds: &Dataset) -> Vec<usize> {
        (0..ds.len()).collect()
    }

    #[test]
    fn threshold_scan_finds_hot_and_shaky_readings() {
        let ds = scenario_dataset();
        let view = full_view(&ds);
        assert_eq!(detect_anomalies(&ds, &view, 90.0, 70.0), vec![0, 1]);
        assert_eq!(ds.records[0].day_part, DayPart::Madrugada);
        assert_eq!(ds.records[1].day_part, DayPart::Manha);
        assert_eq!(ds.records[2].day_part, DayPart::Noite);
    }

    #[test]
    fn threshold_is_strict() {
        let ds = scenario_dataset();
        let view = full_view(&ds);
        // Thresholds sitting exactly on the readings exclude them.
        assert_eq!(detect_anomalies(&ds, &view, 95.0, 80.0), Vec::<usize>::new());
    }

    #[test]
    fn raising_a_threshold_never_grows_the_result() {
        let ds = scenario_dataset();
        let view = full_view(&ds);
        let base = detect_anomalies(&ds, &view, 45.0, 15.0);
        for (t, v) in [(60.0, 15.0), (45.0, 50.0), (100.0, 100.0)] {
            let tighter = detect_anomalies(&ds, &view, t, v);
            assert!(tighter.len() <= base.len());
            assert!(tighter.iter().all(|idx| base.contains(idx)));
        }
    }

    #[test]
    fn mean_by_machine_sorted_ascending_by_key() {
        let mut records = vec![
            record_at("M2", "2024-01-01 10:00:00", 30.0, 0.0),
            record_at("M1", "2024-01-01 11:00:00", 10.0, 0.0),
            record_at("M2", "2024-01-01 12:00:00", 50.0, 0.0),
        ];
        records[2].machine_status = MachineStatus::Idle;
        let ds = Dataset::from_records(records);
        let view = full_view(&ds);

        let summary = aggregate(&ds, &view, GroupKey::Machine, Metric::Temperature, AggregateOp::Mean);
        assert_eq!(
            summary,
            vec![
                (GroupValue::Text("M1".to_string()), 10.0),
                (GroupValue::Text("M2".to_string()), 40.0),
            ]
        );
    }

    #[test]
    fn hours_group_numerically_not_lexically() {
        let ds = Dataset::from_records(vec![
            record_at("M1", "2024-01-01 23:00:00", 1.0, 0.0),
            record_at("M1", "2024-01-01 02:00:00", 2.0, 0.0),
            record_at("M1", "2024-01-01 10:00:00", 3.0, 0.0),
        ]);
        let view = full_view(&ds);
        let summary = aggregate(&ds, &view, GroupKey::Hour, Metric::Temperature, AggregateOp::Mean);
        let keys: Vec<_> = summary.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(
            keys,
            vec![GroupValue::Hour(2), GroupValue::Hour(10), GroupValue::Hour(23)]
        );
    }

    #[test]
    fn count_and_sum_ops() {
        let ds = scenario_dataset();
        let view = full_view(&ds);
        let counts = aggregate(&ds, &view, GroupKey::DayPart, Metric::Vibration, AggregateOp::Count);
        assert_eq!(
            counts,
            vec![
                (GroupValue::DayPart(DayPart::Madrugada), 1.0),
                (GroupValue::DayPart(DayPart::Manha), 1.0),
                (GroupValue::DayPart(DayPart::Noite), 1.0),
            ]
        );

        let sums = aggregate(&ds, &view, GroupKey::Machine, Metric::Vibration, AggregateOp::Sum);
        assert_eq!(sums[0], (GroupValue::Text("M1".to_string()), 10.0));
    }

    #[test]
    fn empty_view_aggregates_to_empty_summary() {
        let ds = scenario_dataset();
        let summary = aggregate(&ds, &[], GroupKey::Machine, Metric::Temperature, AggregateOp::Mean);
        assert!(summary.is_empty());
    }

    #[test]
    fn correlation_requires_two_metrics() {
        let ds = scenario_dataset();
        let view = full_view(&ds);
        assert!(matches!(
            correlation_matrix(&ds, &view, &[Metric::Temperature]),
            Err(DataError::InsufficientInput(_))
        ));
    }

    #[test]
    fn correlation_diagonal_is_one() {
        let ds = scenario_dataset();
        let view = full_view(&ds);
        let matrix =
            correlation_matrix(&ds, &view, &[Metric::Temperature, Metric::Vibration]).unwrap();
        assert_eq!(matrix.len(), 2);
        assert!((matrix.get(0, 0) - 1.0).abs() < 1e-12);
        assert!((matrix.get(1, 1) - 1.0).abs() < 1e-12);
        assert_eq!(matrix.get(0, 1), matrix.get(1, 0));
    }

    #[test]
    fn perfectly_linear_columns_correlate_to_one() {
        // vibration = 2 * temperature → r == 1; humidity is constant → NaN.
        let ds = Dataset::from_records(vec![
            record_at("M1", "2024-01-01 01:00:00", 10.0, 20.0),
            record_at("M1", "2024-01-01 02:00:00", 20.0, 40.0),
            record_at("M1", "2024-01-01 03:00:00", 30.0, 60.0),
        ]);
        let view = full_view(&ds);
        let matrix = correlation_matrix(
            &ds,
            &view,
            &[Metric::Temperature, Metric::Vibration, Metric::Humidity],
        )
        .unwrap();
        assert!((matrix.get(0, 1) - 1.0).abs() < 1e-12);
        assert!(matrix.get(0, 2).is_nan());
        assert!(matrix.get(2, 2).is_nan());
    }

    #[test]
    fn overview_stats_count_failures() {
        let mut records = vec![
            record_at("M1", "2024-01-01 01:00:00", 10.0, 0.0),
            record_at("M1", "2024-01-01 02:00:00", 10.0, 0.0),
            record_at("M2", "2024-01-01 03:00:00", 10.0, 0.0),
            record_at("M3", "2024-01-01 04:00:00", 10.0, 0.0),
        ];
        records[1].machine_status = MachineStatus::Failure;
        let ds = Dataset::from_records(records);
        let view = full_view(&ds);

        let stats = overview_stats(&ds, &view);
        assert_eq!(stats.machines, 3);
        assert_eq!(stats.records, 4);
        assert_eq!(stats.failures, 1);
        assert!((stats.failure_rate - 25.0).abs() < 1e-12);

        let empty = overview_stats(&ds, &[]);
        assert_eq!(empty.records, 0);
        assert_eq!(empty.failure_rate, 0.0);
    }

    #[test]
    fn latest_record_follows_view_order() {
        let ds = Dataset::from_records(vec![
            record_at("M1", "2024-01-01 01:00:00", 10.0, 0.0),
            record_at("M2", "2024-01-01 02:00:00", 20.0, 0.0),
            record_at("M1", "2024-01-01 03:00:00", 30.0, 0.0),
        ]);
        let view = full_view(&ds);
        assert_eq!(latest_record(&ds, &view, "M1").unwrap().temperature, 30.0);
        assert_eq!(machine_view(&ds, &view, "M1"), vec![0, 2]);
        assert!(latest_record(&ds, &view, "M9").is_none());
    }

    #[test]
    fn failure_and_maintenance_summaries_skip_clean_rows() {
        let mut records = vec![
            record_at("M1", "2024-01-01 01:00:00", 10.0, 0.0),
            record_at("M2", "2024-01-01 02:00:00", 20.0, 0.0),
            record_at("M2", "2024-01-01 03:00:00", 30.0, 0.0),
        ];
        records[1].failure_type = "Overheating".to_string();
        records[2].failure_type = "Overheating".to_string();
        records[2].maintenance_required = true;
        let ds = Dataset::from_records(records);
        let view = full_view(&ds);

        assert_eq!(
            failure_type_counts(&ds, &view),
            vec![(GroupValue::Text("Overheating".to_string()), 2.0)]
        );
        assert_eq!(
            maintenance_counts(&ds, &view),
            vec![(GroupValue::Text("M2".to_string()), 1.0)]
        );
        assert!(failure_type_counts(&ds, &[]).is_empty());
    }
}
