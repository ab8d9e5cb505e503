use std::path::Path;

use super::error::{DataError, Result};
use super::model::{Dataset, Record};

// ---------------------------------------------------------------------------
// Export formats
// ---------------------------------------------------------------------------

/// Output format offered on the download tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Csv, ExportFormat::Json];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Json => "JSON",
        }
    }
}

/// Caller-supplied base name plus the extension belonging to the format.
pub fn export_file_name(base: &str, format: ExportFormat) -> String {
    format!("{base}.{}", format.extension())
}

/// Exported column set: the stored fields followed by the derived ones,
/// in record order.
pub const EXPORT_COLUMNS: [&str; 15] = [
    "machine",
    "timestamp",
    "machine_status",
    "temperature",
    "vibration",
    "humidity",
    "pressure",
    "energy_consumption",
    "failure_type",
    "maintenance_required",
    "predicted_remaining_life",
    "date",
    "time",
    "hour",
    "day_part",
];

// ---------------------------------------------------------------------------
// Serializers
// ---------------------------------------------------------------------------

/// Delimited-text serialization: header row, one line per record, view
/// order preserved. Loading the output back yields the same record set.
pub fn view_to_csv(dataset: &Dataset, view: &[usize]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_COLUMNS)?;
    for &idx in view {
        writer.write_record(csv_row(&dataset.records[idx]))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| DataError::Load(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| DataError::Load(e.to_string()))
}

fn csv_row(rec: &Record) -> [String; 15] {
    [
        rec.machine.clone(),
        rec.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        rec.machine_status.to_string(),
        rec.temperature.to_string(),
        rec.vibration.to_string(),
        rec.humidity.to_string(),
        rec.pressure.to_string(),
        rec.energy_consumption.to_string(),
        rec.failure_type.clone(),
        if rec.maintenance_required { "Yes" } else { "No" }.to_string(),
        rec.predicted_remaining_life.to_string(),
        rec.date.to_string(),
        rec.time.to_string(),
        rec.hour.to_string(),
        rec.day_part.to_string(),
    ]
}

/// Structured-record serialization: a pretty-printed array of objects with
/// the same field set as the CSV form.
pub fn view_to_json(dataset: &Dataset, view: &[usize]) -> Result<String> {
    let rows: Vec<&Record> = view.iter().map(|&idx| &dataset.records[idx]).collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

/// Write the view to `path` in the chosen format.
pub fn write_view(
    dataset: &Dataset,
    view: &[usize],
    format: ExportFormat,
    path: &Path,
) -> Result<()> {
    let payload = match format {
        ExportFormat::Csv => view_to_csv(dataset, view)?,
        ExportFormat::Json => view_to_json(dataset, view)?,
    };
    std::fs::write(path, payload)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_file;
    use crate::data::model::record_at;

    fn sample_dataset() -> Dataset {
        let mut records = vec![
            record_at("M1", "2024-01-01 02:00:00", 95.5, 10.25),
            record_at("M2", "2024-01-01 08:00:00", 50.0, 80.0),
            record_at("M3", "2024-01-02 20:00:00", 40.0, 20.0),
        ];
        records[1].failure_type = "Power Surge".to_string();
        records[1].maintenance_required = true;
        Dataset::from_records(records)
    }

    #[test]
    fn file_name_carries_the_format_extension() {
        assert_eq!(export_file_name("shift_report", ExportFormat::Csv), "shift_report.csv");
        assert_eq!(export_file_name("shift_report", ExportFormat::Json), "shift_report.json");
    }

    #[test]
    fn csv_export_reloads_to_the_same_records() {
        let ds = sample_dataset();
        let view = vec![0, 1, 2];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        write_view(&ds, &view, ExportFormat::Csv, &path).unwrap();

        let reloaded = load_file(&path).unwrap();
        assert_eq!(reloaded.records, ds.records);
    }

    #[test]
    fn csv_export_respects_the_view_subset_and_order() {
        let ds = sample_dataset();
        let text = view_to_csv(&ds, &[2, 0]).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("machine,timestamp,"));
        assert!(lines[1].starts_with("M3,"));
        assert!(lines[2].starts_with("M1,"));
    }

    #[test]
    fn json_export_reloads_to_the_same_records() {
        let ds = sample_dataset();
        let view = vec![0, 1, 2];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        write_view(&ds, &view, ExportFormat::Json, &path).unwrap();

        let reloaded = load_file(&path).unwrap();
        assert_eq!(reloaded.records, ds.records);
    }

    #[test]
    fn json_rows_carry_the_full_field_set() {
        let ds = sample_dataset();
        let text = view_to_json(&ds, &[1]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let row = &value.as_array().unwrap()[0];

        for column in EXPORT_COLUMNS {
            assert!(row.get(column).is_some(), "missing column {column}");
        }
        assert_eq!(row["machine"], "M2");
        assert_eq!(row["maintenance_required"], true);
        assert_eq!(row["failure_type"], "Power Surge");
        assert_eq!(row["day_part"], "Manhã");
    }

    #[test]
    fn empty_view_exports_header_only() {
        let ds = sample_dataset();
        let text = view_to_csv(&ds, &[]).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert_eq!(view_to_json(&ds, &[]).unwrap().trim(), "[]");
    }
}
