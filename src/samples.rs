//! # Sample Files
//!
//! Observed heights come as CSV with a `timestamp,height` header and
//! RFC 3339 timestamps:
//!
//! ```text
//! timestamp,height
//! 2024-06-16T00:00:00Z,3.21
//! 2024-06-16T00:15:00Z,3.05
//! ```
//!
//! A timestamp without an offset is rejected with its line number rather
//! than read as UTC.

use crate::error::{Result, TideError};
use crate::model::Model;
use crate::Sample;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct Row {
    timestamp: String,
    height: f64,
}

/// Read every sample of a CSV file.
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Sample>> {
    let samples = from_reader(File::open(&path)?)?;
    info!(path = %path.as_ref().display(), count = samples.len(), "samples loaded");
    Ok(samples)
}

/// Read samples from any CSV source.
pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Sample>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = reader.headers()?.clone();
    let mut record = csv::StringRecord::new();
    let mut samples = Vec::new();

    while reader.read_record(&mut record)? {
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let row: Row = record.deserialize(Some(&headers))?;
        let sample = Sample::new(row.timestamp.as_str(), row.height).map_err(|e| match e {
            TideError::NaiveTimestamp(_) | TideError::InvalidTimestamp(_) => TideError::Line {
                line,
                reason: e.to_string(),
            },
            other => other,
        })?;
        samples.push(sample);
    }
    Ok(samples)
}

/// Write samples in the format [`from_reader`] reads.
pub fn to_writer<W: Write>(writer: W, samples: &[Sample]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(["timestamp", "height"])?;
    for sample in samples {
        writer.write_record([sample.time().to_rfc3339(), sample.height().to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Evaluate `model` on the half-open grid `[start, end)` every `step`.
pub fn synthesize(
    model: &Model,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
) -> Result<Vec<Sample>> {
    if step <= Duration::zero() {
        return Err(TideError::InvalidTimestamp(format!(
            "sampling step must be positive, got {step}"
        )));
    }
    let mut samples = Vec::new();
    let mut t = start;
    while t < end {
        samples.push(Sample::new(&t, model.height(&t)?)?);
        t += step;
    }
    Ok(samples)
}
