use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize};

use super::error::{DataError, Result};

/// `failure_type` value marking a reading with no failure.
pub const NO_FAILURE: &str = "Normal";

// ---------------------------------------------------------------------------
// MachineStatus – operational state reported with each reading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MachineStatus {
    Running,
    Idle,
    Failure,
}

impl MachineStatus {
    pub const ALL: [MachineStatus; 3] = [
        MachineStatus::Running,
        MachineStatus::Idle,
        MachineStatus::Failure,
    ];

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim() {
            "Running" => Ok(MachineStatus::Running),
            "Idle" => Ok(MachineStatus::Idle),
            "Failure" => Ok(MachineStatus::Failure),
            other => Err(DataError::Load(format!("unknown machine_status '{other}'"))),
        }
    }
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MachineStatus::Running => "Running",
            MachineStatus::Idle => "Idle",
            MachineStatus::Failure => "Failure",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// DayPart – six-hour bucket of the reading's hour of day
// ---------------------------------------------------------------------------

/// Part of the day a reading falls in, by right-open six-hour intervals:
/// [0,6) Madrugada, [6,12) Manhã, [12,18) Tarde, [18,24) Noite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayPart {
    Madrugada,
    #[serde(rename = "Manhã")]
    Manha,
    Tarde,
    Noite,
}

impl DayPart {
    pub const ALL: [DayPart; 4] = [
        DayPart::Madrugada,
        DayPart::Manha,
        DayPart::Tarde,
        DayPart::Noite,
    ];

    /// Bucket an hour of day. Hours outside [0,24) cannot come from a
    /// well-formed timestamp and are rejected.
    pub fn from_hour(hour: u32) -> Result<Self> {
        match hour {
            0..=5 => Ok(DayPart::Madrugada),
            6..=11 => Ok(DayPart::Manha),
            12..=17 => Ok(DayPart::Tarde),
            18..=23 => Ok(DayPart::Noite),
            other => Err(DataError::Validation(format!(
                "hour {other} outside the 0..24 range"
            ))),
        }
    }
}

impl fmt::Display for DayPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DayPart::Madrugada => "Madrugada",
            DayPart::Manha => "Manhã",
            DayPart::Tarde => "Tarde",
            DayPart::Noite => "Noite",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// RawRecord – one row as it appears in the source table (wire format)
// ---------------------------------------------------------------------------

/// Raw reading as parsed from a source file, before typing and derivation.
/// Mirrors the source columns 1:1; `into_record` produces the typed
/// [`Record`] used everywhere downstream.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    pub machine: String,
    pub timestamp: String,
    pub machine_status: String,
    pub temperature: f64,
    pub vibration: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub energy_consumption: f64,
    pub failure_type: String,
    #[serde(deserialize_with = "bool_from_yes_no")]
    pub maintenance_required: bool,
    pub predicted_remaining_life: f64,
}

/// Accept the source data's `Yes`/`No` convention alongside JSON booleans.
fn bool_from_yes_no<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum YesNo {
        Flag(bool),
        Text(String),
    }

    match YesNo::deserialize(deserializer)? {
        YesNo::Flag(b) => Ok(b),
        YesNo::Text(s) => match s.trim() {
            "Yes" | "yes" | "true" | "True" => Ok(true),
            "No" | "no" | "false" | "False" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "invalid maintenance_required value '{other}'"
            ))),
        },
    }
}

impl RawRecord {
    /// Type the raw row and derive the calendar fields. `row` is only used
    /// for error context.
    pub fn into_record(self, row: usize) -> Result<Record> {
        let timestamp = parse_timestamp(&self.timestamp).ok_or_else(|| {
            DataError::Parse(format!(
                "row {row}: cannot parse timestamp '{}'",
                self.timestamp
            ))
        })?;
        let machine_status = MachineStatus::parse(&self.machine_status)
            .map_err(|e| DataError::Load(format!("row {row}: {e}")))?;

        let date = timestamp.date();
        let time = timestamp.time();
        let hour = timestamp.hour();
        let day_part = DayPart::from_hour(hour)?;

        Ok(Record {
            machine: self.machine,
            timestamp,
            machine_status,
            temperature: self.temperature,
            vibration: self.vibration,
            humidity: self.humidity,
            pressure: self.pressure,
            energy_consumption: self.energy_consumption,
            failure_type: self.failure_type,
            maintenance_required: self.maintenance_required,
            predicted_remaining_life: self.predicted_remaining_life,
            date,
            time,
            hour,
            day_part,
        })
    }
}

/// Parse a source timestamp. Space-separated and ISO-8601 `T` forms are
/// both accepted; anything else rejects the load.
fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

// ---------------------------------------------------------------------------
// Record – one typed sensor reading
// ---------------------------------------------------------------------------

/// A single sensor reading (one row of the dataset). The calendar fields
/// after `predicted_remaining_life` are derived from `timestamp` exactly
/// once, at load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub machine: String,
    pub timestamp: NaiveDateTime,
    pub machine_status: MachineStatus,
    pub temperature: f64,
    pub vibration: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub energy_consumption: f64,
    pub failure_type: String,
    pub maintenance_required: bool,
    pub predicted_remaining_life: f64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub hour: u32,
    pub day_part: DayPart,
}

impl Record {
    /// Whether this reading carries an actual failure type.
    pub fn is_failure_event(&self) -> bool {
        self.failure_type != NO_FAILURE
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset, immutable after load, with precomputed facet
/// indices for the filter panel.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// All readings, in source row order.
    pub records: Vec<Record>,
    /// Sorted unique machine ids.
    pub machines: Vec<String>,
    /// Sorted unique failure types (including the no-failure marker).
    pub failure_types: Vec<String>,
    /// Earliest and latest calendar date present, `None` when empty.
    pub date_span: Option<(NaiveDate, NaiveDate)>,
}

impl Dataset {
    /// Build the facet indices from the loaded records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut machines: BTreeSet<String> = BTreeSet::new();
        let mut failure_types: BTreeSet<String> = BTreeSet::new();
        let mut date_span: Option<(NaiveDate, NaiveDate)> = None;

        for rec in &records {
            machines.insert(rec.machine.clone());
            failure_types.insert(rec.failure_type.clone());
            date_span = Some(match date_span {
                None => (rec.date, rec.date),
                Some((min, max)) => (min.min(rec.date), max.max(rec.date)),
            });
        }

        Dataset {
            records,
            machines: machines.into_iter().collect(),
            failure_types: failure_types.into_iter().collect(),
            date_span,
        }
    }

    /// Number of readings.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Test fixtures
// ---------------------------------------------------------------------------

/// Reading fixture with neutral defaults; tests mutate the stored fields
/// they care about on the returned record.
#[cfg(test)]
pub(crate) fn record_at(machine: &str, timestamp: &str, temperature: f64, vibration: f64) -> Record {
    RawRecord {
        machine: machine.to_string(),
        timestamp: timestamp.to_string(),
        machine_status: "Running".to_string(),
        temperature,
        vibration,
        humidity: 45.0,
        pressure: 101.3,
        energy_consumption: 3.5,
        failure_type: NO_FAILURE.to_string(),
        maintenance_required: false,
        predicted_remaining_life: 120.0,
    }
    .into_record(0)
    .expect("fixture record")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_part_interval_bounds() {
        assert_eq!(DayPart::from_hour(0).unwrap(), DayPart::Madrugada);
        assert_eq!(DayPart::from_hour(5).unwrap(), DayPart::Madrugada);
        assert_eq!(DayPart::from_hour(6).unwrap(), DayPart::Manha);
        assert_eq!(DayPart::from_hour(11).unwrap(), DayPart::Manha);
        assert_eq!(DayPart::from_hour(12).unwrap(), DayPart::Tarde);
        assert_eq!(DayPart::from_hour(17).unwrap(), DayPart::Tarde);
        assert_eq!(DayPart::from_hour(18).unwrap(), DayPart::Noite);
        assert_eq!(DayPart::from_hour(23).unwrap(), DayPart::Noite);
    }

    #[test]
    fn day_part_rejects_out_of_range_hour() {
        assert!(matches!(
            DayPart::from_hour(24),
            Err(DataError::Validation(_))
        ));
    }

    #[test]
    fn status_parse_round_trip() {
        for status in MachineStatus::ALL {
            assert_eq!(MachineStatus::parse(&status.to_string()).unwrap(), status);
        }
        assert!(MachineStatus::parse("Exploded").is_err());
    }

    #[test]
    fn raw_record_derives_calendar_fields() {
        let rec = record_at("M1", "2024-03-15 14:30:00", 60.0, 20.0);
        assert_eq!(rec.date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(rec.hour, 14);
        assert_eq!(rec.day_part, DayPart::Tarde);
        assert_eq!(rec.time, NaiveTime::from_hms_opt(14, 30, 0).unwrap());
    }

    #[test]
    fn iso_t_separator_accepted() {
        let rec = record_at("M1", "2024-03-15T02:00:00", 60.0, 20.0);
        assert_eq!(rec.hour, 2);
        assert_eq!(rec.day_part, DayPart::Madrugada);
    }

    #[test]
    fn bad_timestamp_is_a_parse_error() {
        let mut raw = RawRecord {
            machine: "M1".to_string(),
            timestamp: "15/03/2024 14:30".to_string(),
            machine_status: "Running".to_string(),
            temperature: 60.0,
            vibration: 20.0,
            humidity: 45.0,
            pressure: 101.3,
            energy_consumption: 3.5,
            failure_type: NO_FAILURE.to_string(),
            maintenance_required: false,
            predicted_remaining_life: 120.0,
        };
        assert!(matches!(
            raw.clone().into_record(7),
            Err(DataError::Parse(msg)) if msg.contains("row 7")
        ));

        raw.timestamp = "2024-03-15 14:30:00".to_string();
        raw.machine_status = "Broken".to_string();
        assert!(matches!(raw.into_record(0), Err(DataError::Load(_))));
    }

    #[test]
    fn dataset_builds_facet_indices() {
        let records = vec![
            record_at("M2", "2024-01-03 10:00:00", 50.0, 10.0),
            record_at("M1", "2024-01-01 10:00:00", 50.0, 10.0),
            record_at("M2", "2024-01-05 10:00:00", 50.0, 10.0),
        ];
        let ds = Dataset::from_records(records);
        assert_eq!(ds.machines, vec!["M1".to_string(), "M2".to_string()]);
        assert_eq!(
            ds.date_span,
            Some((
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
            ))
        );
        assert_eq!(ds.len(), 3);
        assert!(Dataset::from_records(Vec::new()).date_span.is_none());
    }
}
