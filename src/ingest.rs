//! Pressure Log Ingest
//!
//! Reads delimited gauge logs into [`Sample`]s. Two layouts are accepted:
//!
//! - a combined date-time column (`DateTime,Press`)
//! - separate date and time columns (`Date,Time,Press`)
//!
//! Column names come from the `[ingest]` config section. Rows are returned
//! sorted by timestamp; repeated timestamps are rejected because elapsed
//! time must be strictly increasing downstream.

use chrono::NaiveDateTime;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::IngestConfig;
use crate::types::Sample;

/// Timestamp layouts tried in order.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
];

/// Output layout used by [`write_pressure_log`].
const WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Unparseable timestamp '{value}' at row {row}")]
    Timestamp { row: usize, value: String },

    #[error("Unparseable pressure '{value}' at row {row}")]
    Pressure { row: usize, value: String },

    #[error("Pressure log contains no samples")]
    Empty,

    #[error("Duplicate timestamp {0}")]
    DuplicateTimestamp(NaiveDateTime),
}

/// Parse a timestamp in any of the accepted layouts.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

enum TimestampColumns {
    Combined(usize),
    Split { date: usize, time: usize },
}

/// Read a pressure log from a file.
pub fn read_pressure_log(path: &Path, config: &IngestConfig) -> Result<Vec<Sample>, IngestError> {
    let file = std::fs::File::open(path)?;
    let samples = parse_pressure_log(file, config)?;
    info!(path = %path.display(), samples = samples.len(), "Pressure log loaded");
    Ok(samples)
}

/// Parse a pressure log from any reader.
pub fn parse_pressure_log<R: Read>(reader: R, config: &IngestConfig) -> Result<Vec<Sample>, IngestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let find = |name: &str| headers.iter().position(|h| h == name);

    let ts_cols = if let Some(i) = find(&config.timestamp_column) {
        TimestampColumns::Combined(i)
    } else {
        match (find(&config.date_column), find(&config.time_column)) {
            (Some(date), Some(time)) => TimestampColumns::Split { date, time },
            _ => {
                return Err(IngestError::MissingColumn(format!(
                    "'{}' or '{}' + '{}'",
                    config.timestamp_column, config.date_column, config.time_column
                )))
            }
        }
    };
    let p_col = find(&config.pressure_column)
        .ok_or_else(|| IngestError::MissingColumn(config.pressure_column.clone()))?;

    let mut samples = Vec::new();
    let mut skipped = 0usize;

    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        // 1-based data row, header excluded
        let row = row + 1;

        let raw_ts = match ts_cols {
            TimestampColumns::Combined(i) => record.get(i).unwrap_or_default().to_string(),
            TimestampColumns::Split { date, time } => format!(
                "{} {}",
                record.get(date).unwrap_or_default(),
                record.get(time).unwrap_or_default()
            ),
        };
        let raw_p = record.get(p_col).unwrap_or_default();

        if raw_p.is_empty() {
            skipped += 1;
            continue;
        }

        let timestamp = parse_timestamp(&raw_ts)
            .ok_or_else(|| IngestError::Timestamp { row, value: raw_ts.clone() })?;
        let pressure: f64 = raw_p
            .parse()
            .ok()
            .filter(|p: &f64| p.is_finite())
            .ok_or_else(|| IngestError::Pressure { row, value: raw_p.to_string() })?;

        samples.push(Sample::new(timestamp, pressure));
    }

    if skipped > 0 {
        warn!(skipped, "Rows without a pressure value were skipped");
    }
    if samples.is_empty() {
        return Err(IngestError::Empty);
    }

    samples.sort_by_key(|s| s.timestamp);
    if let Some(w) = samples.windows(2).find(|w| w[0].timestamp == w[1].timestamp) {
        return Err(IngestError::DuplicateTimestamp(w[0].timestamp));
    }

    debug!(
        samples = samples.len(),
        first = %samples[0].timestamp,
        last = %samples[samples.len() - 1].timestamp,
        "Pressure log parsed"
    );
    Ok(samples)
}

/// Write samples as a `DateTime,Press` log readable by [`read_pressure_log`]
/// with the default column names.
pub fn write_pressure_log<W: Write>(writer: W, samples: &[Sample]) -> Result<(), IngestError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["DateTime", "Press"])?;
    for s in samples {
        wtr.write_record([
            s.timestamp.format(WRITE_FORMAT).to_string(),
            format!("{:.4}", s.pressure),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
