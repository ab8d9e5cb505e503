use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::error::{DataError, Result};
use super::model::{Dataset, RawRecord};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a sensor log from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the columns listed on [`RawRecord`]
/// * `.json`    – records orientation: `[{ "machine": ..., ... }, ...]`
/// * `.parquet` – flat scalar columns, `timestamp` stored as a string
///
/// Any unparseable timestamp rejects the whole load; a partial dataset is
/// never returned.
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(DataError::Load(format!(
            "unsupported file extension: .{other}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Dataset cache
// ---------------------------------------------------------------------------

/// Process-lifetime cache of loaded datasets, keyed by canonical path.
/// Lives in the application state; repeated loads of the same path hand
/// back the same dataset. A failed load caches nothing.
#[derive(Debug, Default)]
pub struct DatasetCache {
    loaded: BTreeMap<PathBuf, Arc<Dataset>>,
}

impl DatasetCache {
    /// Load `path`, or hand back the dataset already loaded from it.
    pub fn load(&mut self, path: &Path) -> Result<Arc<Dataset>> {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if let Some(dataset) = self.loaded.get(&key) {
            return Ok(Arc::clone(dataset));
        }
        let dataset = Arc::new(load_file(path)?);
        self.loaded.insert(key, Arc::clone(&dataset));
        Ok(dataset)
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row naming the [`RawRecord`] columns. Extra columns
/// (e.g. the derived ones written by the export) are ignored, so exported
/// files load back unchanged.
fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::Reader::from_path(path)?;

    let mut records = Vec::new();
    for (row_no, result) in reader.deserialize::<RawRecord>().enumerate() {
        let raw = result.map_err(|e| DataError::Load(format!("csv row {row_no}: {e}")))?;
        records.push(raw.into_record(row_no)?);
    }

    Ok(Dataset::from_records(records))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default
/// `df.to_json(orient='records')` and what the export writes):
///
/// ```json
/// [
///   {
///     "machine": "M1",
///     "timestamp": "2024-01-01 02:00:00",
///     "machine_status": "Running",
///     "temperature": 61.2,
///     ...
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path)?;
    let raws: Vec<RawRecord> =
        serde_json::from_str(&text).map_err(|e| DataError::Load(format!("parsing JSON: {e}")))?;

    let records = raws
        .into_iter()
        .enumerate()
        .map(|(row_no, raw)| raw.into_record(row_no))
        .collect::<Result<Vec<_>>>()?;

    Ok(Dataset::from_records(records))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet sensor log. One scalar column per [`RawRecord`] field;
/// `timestamp` as Utf8 so all formats share one parse path. Works with
/// files written by `generate_sample` as well as Pandas' `df.to_parquet()`
/// when the timestamp is stringified.
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let reader = builder.build()?;

    let mut records = Vec::new();
    let mut row_no = 0usize;

    for batch_result in reader {
        let batch = batch_result?;

        let machine = named_column(&batch, "machine")?;
        let timestamp = named_column(&batch, "timestamp")?;
        let machine_status = named_column(&batch, "machine_status")?;
        let temperature = named_column(&batch, "temperature")?;
        let vibration = named_column(&batch, "vibration")?;
        let humidity = named_column(&batch, "humidity")?;
        let pressure = named_column(&batch, "pressure")?;
        let energy = named_column(&batch, "energy_consumption")?;
        let failure_type = named_column(&batch, "failure_type")?;
        let maintenance = named_column(&batch, "maintenance_required")?;
        let remaining_life = named_column(&batch, "predicted_remaining_life")?;

        for row in 0..batch.num_rows() {
            let raw = RawRecord {
                machine: string_cell(machine, row, "machine")?,
                timestamp: string_cell(timestamp, row, "timestamp")?,
                machine_status: string_cell(machine_status, row, "machine_status")?,
                temperature: numeric_cell(temperature, row, "temperature")?,
                vibration: numeric_cell(vibration, row, "vibration")?,
                humidity: numeric_cell(humidity, row, "humidity")?,
                pressure: numeric_cell(pressure, row, "pressure")?,
                energy_consumption: numeric_cell(energy, row, "energy_consumption")?,
                failure_type: string_cell(failure_type, row, "failure_type")?,
                maintenance_required: bool_cell(maintenance, row, "maintenance_required")?,
                predicted_remaining_life: numeric_cell(remaining_life, row, "predicted_remaining_life")?,
            };
            records.push(raw.into_record(row_no)?);
            row_no += 1;
        }
    }

    Ok(Dataset::from_records(records))
}

// -- Parquet / Arrow helpers --

fn named_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| DataError::Load(format!("parquet file missing '{name}' column")))?;
    Ok(batch.column(idx))
}

fn null_cell(name: &str, row: usize) -> DataError {
    DataError::Load(format!("null value in '{name}' at row {row}"))
}

/// Extract a string from a Utf8 or LargeUtf8 column.
fn string_cell(col: &ArrayRef, row: usize, name: &str) -> Result<String> {
    if col.is_null(row) {
        return Err(null_cell(name, row));
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col.as_any().downcast_ref::<StringArray>().unwrap();
            Ok(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => {
            let arr = col.as_string::<i64>();
            Ok(arr.value(row).to_string())
        }
        other => Err(DataError::Load(format!(
            "'{name}' has type {other:?}, expected Utf8"
        ))),
    }
}

/// Extract an `f64` from any numeric column type the writers produce.
fn numeric_cell(col: &ArrayRef, row: usize, name: &str) -> Result<f64> {
    if col.is_null(row) {
        return Err(null_cell(name, row));
    }
    match col.data_type() {
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>().unwrap();
            Ok(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>().unwrap();
            Ok(arr.value(row) as f64)
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().unwrap();
            Ok(arr.value(row) as f64)
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>().unwrap();
            Ok(arr.value(row) as f64)
        }
        other => Err(DataError::Load(format!(
            "'{name}' has type {other:?}, expected a numeric column"
        ))),
    }
}

/// Extract the maintenance flag from a Boolean column, or from a Utf8 one
/// using the source data's `Yes`/`No` convention.
fn bool_cell(col: &ArrayRef, row: usize, name: &str) -> Result<bool> {
    if col.is_null(row) {
        return Err(null_cell(name, row));
    }
    match col.data_type() {
        DataType::Boolean => {
            let arr = col.as_any().downcast_ref::<BooleanArray>().unwrap();
            Ok(arr.value(row))
        }
        DataType::Utf8 => match string_cell(col, row, name)?.trim() {
            "Yes" | "yes" | "true" | "True" => Ok(true),
            "No" | "no" | "false" | "False" => Ok(false),
            other => Err(DataError::Load(format!(
                "invalid '{name}' value '{other}' at row {row}"
            ))),
        },
        other => Err(DataError::Load(format!(
            "'{name}' has type {other:?}, expected Boolean or Utf8"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{DayPart, MachineStatus};
    use std::io::Write;

    const CSV_HEADER: &str = "machine,timestamp,machine_status,temperature,vibration,humidity,pressure,energy_consumption,failure_type,maintenance_required,predicted_remaining_life";

    fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_load_derives_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(
            &dir,
            "data.csv",
            &format!(
                "{CSV_HEADER}\n\
                 M1,2024-01-01 02:00:00,Running,95.0,10.0,40.0,101.3,3.2,Normal,No,150.0\n\
                 M2,2024-01-01 08:30:00,Failure,50.0,80.0,42.0,99.8,4.1,Bearing Wear,Yes,12.5\n"
            ),
        );

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.machines, vec!["M1".to_string(), "M2".to_string()]);

        let first = &ds.records[0];
        assert_eq!(first.hour, 2);
        assert_eq!(first.day_part, DayPart::Madrugada);
        assert!(!first.maintenance_required);

        let second = &ds.records[1];
        assert_eq!(second.machine_status, MachineStatus::Failure);
        assert_eq!(second.failure_type, "Bearing Wear");
        assert!(second.maintenance_required);
        assert_eq!(second.day_part, DayPart::Manha);
    }

    #[test]
    fn missing_column_rejects_the_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(
            &dir,
            "data.csv",
            "machine,timestamp\nM1,2024-01-01 02:00:00\n",
        );
        assert!(matches!(load_file(&path), Err(DataError::Load(_))));
    }

    #[test]
    fn one_bad_timestamp_rejects_the_whole_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(
            &dir,
            "data.csv",
            &format!(
                "{CSV_HEADER}\n\
                 M1,2024-01-01 02:00:00,Running,95.0,10.0,40.0,101.3,3.2,Normal,No,150.0\n\
                 M2,not-a-timestamp,Running,50.0,80.0,42.0,99.8,4.1,Normal,No,12.5\n"
            ),
        );
        assert!(matches!(load_file(&path), Err(DataError::Parse(_))));
    }

    #[test]
    fn json_records_orientation_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(
            &dir,
            "data.json",
            r#"[{
                "machine": "M3",
                "timestamp": "2024-01-01T20:00:00",
                "machine_status": "Idle",
                "temperature": 40.0,
                "vibration": 20.0,
                "humidity": 41.0,
                "pressure": 100.2,
                "energy_consumption": 1.1,
                "failure_type": "Normal",
                "maintenance_required": false,
                "predicted_remaining_life": 300.0
            }]"#,
        );

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].day_part, DayPart::Noite);
        assert_eq!(ds.records[0].machine_status, MachineStatus::Idle);
    }

    #[test]
    fn missing_file_and_unknown_extension_are_load_errors() {
        assert!(matches!(
            load_file(Path::new("/nonexistent/data.csv")),
            Err(DataError::Load(_))
        ));
        assert!(matches!(
            load_file(Path::new("data.xlsx")),
            Err(DataError::Load(_))
        ));
    }

    #[test]
    fn cache_returns_the_same_dataset_for_a_repeated_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(
            &dir,
            "data.csv",
            &format!("{CSV_HEADER}\nM1,2024-01-01 02:00:00,Running,95.0,10.0,40.0,101.3,3.2,Normal,No,150.0\n"),
        );

        let mut cache = DatasetCache::default();
        let first = cache.load(&path).unwrap();
        let second = cache.load(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn cache_keeps_failed_loads_out() {
        let mut cache = DatasetCache::default();
        let missing = Path::new("/nonexistent/data.csv");
        assert!(cache.load(missing).is_err());
        assert!(cache.load(missing).is_err());
    }

    #[test]
    fn parquet_round_trip_through_arrow_writer() {
        use arrow::datatypes::{Field, Schema};
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("machine", DataType::Utf8, false),
            Field::new("timestamp", DataType::Utf8, false),
            Field::new("machine_status", DataType::Utf8, false),
            Field::new("temperature", DataType::Float64, false),
            Field::new("vibration", DataType::Float64, false),
            Field::new("humidity", DataType::Float64, false),
            Field::new("pressure", DataType::Float64, false),
            Field::new("energy_consumption", DataType::Float64, false),
            Field::new("failure_type", DataType::Utf8, false),
            Field::new("maintenance_required", DataType::Boolean, false),
            Field::new("predicted_remaining_life", DataType::Float64, false),
        ]));

        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["M1", "M2"])),
                Arc::new(StringArray::from(vec![
                    "2024-01-01 02:00:00",
                    "2024-01-01 14:00:00",
                ])),
                Arc::new(StringArray::from(vec!["Running", "Idle"])),
                Arc::new(Float64Array::from(vec![95.0, 50.0])),
                Arc::new(Float64Array::from(vec![10.0, 80.0])),
                Arc::new(Float64Array::from(vec![40.0, 42.0])),
                Arc::new(Float64Array::from(vec![101.3, 99.8])),
                Arc::new(Float64Array::from(vec![3.2, 4.1])),
                Arc::new(StringArray::from(vec!["Normal", "Normal"])),
                Arc::new(BooleanArray::from(vec![false, true])),
                Arc::new(Float64Array::from(vec![150.0, 12.5])),
            ],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].machine, "M1");
        assert_eq!(ds.records[0].day_part, DayPart::Madrugada);
        assert_eq!(ds.records[1].day_part, DayPart::Tarde);
        assert!(ds.records[1].maintenance_required);
    }
}
