//! # Residual Statistics
//!
//! [`ErrorMetric`] is a snapshot of `predicted - observed` over a sample set.
//! It is never updated in place: build a new one after every coefficient
//! change.

use crate::error::{Result, TideError};
use crate::model::Model;
use crate::Sample;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Percentile steps reported, p10 through p90.
pub const PERCENTILE_STEPS: [u8; 9] = [10, 20, 30, 40, 50, 60, 70, 80, 90];

/// Residual summary of one model against one sample set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorMetric {
    /// Mean signed residual
    pub mean: f64,
    /// Most negative residual
    pub min: f64,
    /// Most positive residual
    pub max: f64,
    /// Population variance of signed residuals
    pub variance: f64,
    /// Mean of |residual|
    pub mean_absolute: f64,
    /// |residual| at p10, p20, ... p90
    pub percentiles: [f64; 9],
}

impl ErrorMetric {
    /// Score `model` against `samples`.
    pub fn evaluate(model: &Model, samples: &[Sample]) -> Result<Self> {
        if samples.is_empty() {
            return Err(TideError::EmptySamples);
        }
        let residuals: Vec<f64> = samples
            .iter()
            .map(|s| model.height_at_hours(s.hours()) - s.height())
            .collect();
        Ok(Self::from_residuals(&residuals))
    }

    fn from_residuals(residuals: &[f64]) -> Self {
        let n = residuals.len() as f64;
        let mean = residuals.iter().sum::<f64>() / n;
        let (min, max) = residuals
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &r| {
                (min.min(r), max.max(r))
            });
        let variance = residuals.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;

        let mut absolute: Vec<f64> = residuals.iter().map(|r| r.abs()).collect();
        let mean_absolute = absolute.iter().sum::<f64>() / n;
        absolute.sort_by(f64::total_cmp);
        let percentiles = PERCENTILE_STEPS.map(|p| interpolate(&absolute, f64::from(p)));

        Self {
            mean,
            min,
            max,
            variance,
            mean_absolute,
            percentiles,
        }
    }

    /// Largest residual magnitude in either direction.
    pub fn max_absolute(&self) -> f64 {
        self.max.max(self.min.abs())
    }

    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    /// |residual| at percentile `p` (10, 20, ... 90).
    pub fn percentile(&self, p: u8) -> Option<f64> {
        PERCENTILE_STEPS
            .iter()
            .position(|&step| step == p)
            .map(|i| self.percentiles[i])
    }
}

/// Linear interpolation between closest ranks, rank = p/100 * (n - 1).
fn interpolate(sorted: &[f64], p: f64) -> f64 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let below = rank.floor() as usize;
    let above = (below + 1).min(sorted.len() - 1);
    let fraction = rank - below as f64;
    sorted[below] + (sorted[above] - sorted[below]) * fraction
}

impl fmt::Display for ErrorMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mean={:.4} min={:.4} max={:.4} var={:.4} mae={:.4} p50={:.4} p90={:.4}",
            self.mean,
            self.min,
            self.max,
            self.variance,
            self.mean_absolute,
            self.percentiles[4],
            self.percentiles[8]
        )
    }
}

/// What a tuner minimizes when ranking candidates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// `max(max, |min|)`, outliers on both sides weigh the same
    #[default]
    MaxAbsolute,
    MeanAbsolute,
    Variance,
}

impl Criterion {
    pub fn score(&self, error: &ErrorMetric) -> f64 {
        match self {
            Criterion::MaxAbsolute => error.max_absolute(),
            Criterion::MeanAbsolute => error.mean_absolute,
            Criterion::Variance => error.variance,
        }
    }
}
