//! # Tide Fit Core Library
//!
//! Predicts and fits tide heights as a sum of fixed-frequency sinusoids whose
//! speeds derive from astronomical rotation rates (Darwin/Doodson harmonics).
//!
//! ## Data Flow
//! 1. **Rates**: [`astro::AstronomicalRates`] are derived once from a
//!    [`astro::RateConfig`] and passed to everything that needs a speed
//! 2. **Catalog**: [`harmonics::Harmonic`] constituents (M2, S2, K1, ...)
//! 3. **Model**: [`model::Model`] pairs a harmonic list with cosine and sine
//!    amplitudes and predicts height at any aware instant
//! 4. **Fit**: [`compute::fourier_transform`] resets every amplitude from a
//!    sample set, **in place**
//! 5. **Tune**: [`compute::tune_grid`], [`compute::tune_amplitude`] and
//!    [`compute::tune_angular`] propose a better copy, never touching their
//!    input
//! 6. **Score**: [`metrics::ErrorMetric`] summarizes residuals after every change
//!
//! ## Mutation Shapes
//! Fitting and tuning deliberately differ. `fourier_transform` takes
//! `&mut Model` and overwrites all coefficients. The tuners take `&Model` and
//! return a new `(Model, ErrorMetric)`. Keep this in mind when chaining them.
//!
//! ## Core Types
//! - [`Sample`]: one observed height at an aware instant
//! - [`model::Model`]: harmonic list plus amplitudes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod astro;
pub mod compute;
pub mod config;
pub mod error;
pub mod harmonics;
pub mod metrics;
pub mod model;
pub mod persist;
pub mod renderer;
pub mod samples;
pub mod time;

#[cfg(test)]
mod tests;

pub use error::{HarmonicError, Result, TideError};

use time::Timestamp;

/// A single observed tide height.
///
/// The timestamp is validated on construction: only timezone-aware inputs
/// are accepted. The elapsed hours since T0 are computed once here since
/// every fit and tuning pass reads them.
///
/// # Example
/// ```
/// use tide_fit_lib::Sample;
///
/// let high = Sample::new("2024-06-16T15:00:00-04:00", 3.2).unwrap();
/// assert_eq!(high.height(), 3.2);
/// assert!(Sample::new("2024-06-16T15:00:00", 3.2).is_err());
/// ```
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(try_from = "SampleRecord", into = "SampleRecord")]
pub struct Sample {
    time: DateTime<Utc>,
    hours: f64,
    height: f64,
}

impl Sample {
    pub fn new<T: Timestamp + ?Sized>(time: &T, height: f64) -> Result<Self> {
        let time = time.to_utc()?;
        Ok(Self {
            time,
            hours: time::hours_since_epoch_utc(&time),
            height,
        })
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// Hours since T0
    pub fn hours(&self) -> f64 {
        self.hours
    }

    /// Observed height
    pub fn height(&self) -> f64 {
        self.height
    }
}

impl PartialEq for Sample {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.height == other.height
    }
}

/// Wire form of a [`Sample`].
#[derive(Clone, Debug, Serialize, Deserialize)]
struct SampleRecord {
    time: String,
    height: f64,
}

impl TryFrom<SampleRecord> for Sample {
    type Error = TideError;

    fn try_from(record: SampleRecord) -> Result<Self> {
        Sample::new(record.time.as_str(), record.height)
    }
}

impl From<Sample> for SampleRecord {
    fn from(sample: Sample) -> Self {
        Self {
            time: sample.time.to_rfc3339(),
            height: sample.height,
        }
    }
}

/// Crate version, as packaged.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
