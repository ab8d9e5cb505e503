use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{BooleanArray, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One generated row, kept in column-friendly shape for both writers.
struct Reading {
    machine: String,
    timestamp: NaiveDateTime,
    machine_status: &'static str,
    temperature: f64,
    vibration: f64,
    humidity: f64,
    pressure: f64,
    energy_consumption: f64,
    failure_type: &'static str,
    maintenance_required: bool,
    predicted_remaining_life: f64,
}

const COLUMNS: [&str; 11] = [
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
];

fn generate(days: i64, rng: &mut SimpleRng) -> Vec<Reading> {
    let machines = ["M1", "M2", "M3", "M4", "M5", "M6"];
    let temp_baseline = [58.0, 62.0, 55.0, 65.0, 60.0, 57.0];
    let vib_baseline = [22.0, 30.0, 18.0, 35.0, 25.0, 20.0];
    let service_interval_hours = 500.0;

    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .expect("valid start date")
        .and_hms_opt(0, 0, 0)
        .expect("valid start time");

    let mut readings = Vec::new();
    let mut remaining: Vec<f64> = machines
        .iter()
        .enumerate()
        .map(|(i, _)| service_interval_hours - i as f64 * 60.0)
        .collect();

    for step in 0..(days * 24) {
        let timestamp = start + Duration::hours(step);
        let hour = (step % 24) as f64;
        // Afternoon temperature bump, office-hours energy load.
        let diurnal = ((hour - 14.0) / 24.0 * std::f64::consts::TAU).cos();

        for (m, machine) in machines.iter().enumerate() {
            let mut temperature = rng.gauss(temp_baseline[m] + 6.0 * diurnal, 4.0);
            let mut vibration = rng.gauss(vib_baseline[m], 7.0).max(0.0);

            // Rare hot or shaky excursions.
            if rng.next_f64() < 0.015 {
                temperature += rng.gauss(35.0, 6.0);
            }
            if rng.next_f64() < 0.015 {
                vibration += rng.gauss(45.0, 8.0);
            }

            let humidity = rng.gauss(45.0 - 5.0 * diurnal, 6.0).clamp(5.0, 95.0);
            let pressure = rng.gauss(101.3, 1.1);
            let working_hours = (8.0..=18.0).contains(&hour);
            let energy_consumption = rng
                .gauss(if working_hours { 5.5 } else { 2.0 }, 0.8)
                .max(0.1);

            remaining[m] -= 1.0;

            let overheating = temperature > 90.0;
            let shaking = vibration > 70.0;
            let worn_out = remaining[m] <= 0.0;

            let (machine_status, failure_type) = if overheating {
                ("Failure", "Overheating")
            } else if shaking {
                ("Failure", "Bearing Wear")
            } else if worn_out {
                ("Failure", "Power Surge")
            } else if !working_hours && rng.next_f64() < 0.35 {
                ("Idle", "Normal")
            } else if rng.next_f64() < 0.005 {
                ("Failure", "Sensor Fault")
            } else {
                ("Running", "Normal")
            };

            if worn_out {
                remaining[m] = service_interval_hours;
            }

            let maintenance_required =
                failure_type != "Normal" || remaining[m] < 48.0;

            readings.push(Reading {
                machine: machine.to_string(),
                timestamp,
                machine_status,
                temperature,
                vibration,
                humidity,
                pressure,
                energy_consumption,
                failure_type,
                maintenance_required,
                predicted_remaining_life: remaining[m].max(0.0),
            });
        }
    }

    readings
}

fn write_csv(path: &Path, readings: &[Reading]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV output")?;
    writer.write_record(COLUMNS)?;
    for r in readings {
        writer.write_record([
            r.machine.clone(),
            r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            r.machine_status.to_string(),
            format!("{:.2}", r.temperature),
            format!("{:.2}", r.vibration),
            format!("{:.2}", r.humidity),
            format!("{:.2}", r.pressure),
            format!("{:.2}", r.energy_consumption),
            r.failure_type.to_string(),
            if r.maintenance_required { "Yes" } else { "No" }.to_string(),
            format!("{:.1}", r.predicted_remaining_life),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, readings: &[Reading]) -> Result<()> {
    let string_col = |f: &dyn Fn(&Reading) -> String| -> StringArray {
        readings.iter().map(|r| Some(f(r))).collect()
    };
    let float_col = |f: &dyn Fn(&Reading) -> f64| -> Float64Array {
        readings.iter().map(|r| Some(f(r))).collect()
    };

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
            Arc::new(string_col(&|r| r.machine.clone())),
            Arc::new(string_col(&|r| {
                r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
            })),
            Arc::new(string_col(&|r| r.machine_status.to_string())),
            Arc::new(float_col(&|r| r.temperature)),
            Arc::new(float_col(&|r| r.vibration)),
            Arc::new(float_col(&|r| r.humidity)),
            Arc::new(float_col(&|r| r.pressure)),
            Arc::new(float_col(&|r| r.energy_consumption)),
            Arc::new(string_col(&|r| r.failure_type.to_string())),
            Arc::new(BooleanArray::from(
                readings.iter().map(|r| r.maintenance_required).collect::<Vec<_>>(),
            )),
            Arc::new(float_col(&|r| r.predicted_remaining_life)),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet output")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_manufacturing_data.csv".to_string());
    let path = Path::new(&output);

    let mut rng = SimpleRng::new(42);
    let readings = generate(30, &mut rng);

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "csv" => write_csv(path, &readings)?,
        "parquet" | "pq" => write_parquet(path, &readings)?,
        other => bail!("unsupported output extension: .{other} (use .csv or .parquet)"),
    }

    println!(
        "Wrote {} readings across 6 machines to {}",
        readings.len(),
        path.display()
    );
    Ok(())
}
