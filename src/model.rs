//! # Harmonic Model
//!
//! A [`Model`] is a fixed, ordered list of harmonics plus two coefficient
//! arrays aligned with it:
//!
//! ```text
//! height(t) = Σᵢ [ cosᵢ · cos(speedᵢ · t) + sinᵢ · sin(speedᵢ · t) ]
//! ```
//!
//! with `t` in hours since T0 and speeds in degrees per hour. The harmonic
//! list never changes after construction; cloning a model shares it and
//! duplicates only the coefficients.
//!
//! Named harmonic sets are plain data in [`Catalog`].

use crate::astro::AstronomicalRates;
use crate::error::{HarmonicError, Result, TideError};
use crate::harmonics::{self as h, Harmonic};
use crate::time::{hours_since_epoch, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Default minimum speed separation between two harmonics of a model (deg/h).
pub const DEFAULT_MIN_DELTA: f64 = 0.5;

/// Harmonic list with its cosine and sine amplitudes.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(into = "ModelRecord", try_from = "ModelRecord")]
pub struct Model {
    harmonics: Arc<[Harmonic]>,
    speeds: Arc<[f64]>,
    rates: AstronomicalRates,
    min_delta: f64,
    amplitudes_cos: Vec<f64>,
    amplitudes_sin: Vec<f64>,
}

impl Model {
    /// Build a model with zeroed amplitudes.
    ///
    /// Fails with [`HarmonicError::TooClose`] when two harmonics rotate less
    /// than `min_delta` deg/h apart.
    pub fn new(
        harmonics: impl Into<Arc<[Harmonic]>>,
        rates: &AstronomicalRates,
        min_delta: f64,
    ) -> Result<Self> {
        let harmonics = harmonics.into();
        let speeds: Arc<[f64]> = harmonics.iter().map(|h| h.speed(rates)).collect();

        for i in 0..speeds.len() {
            for j in (i + 1)..speeds.len() {
                let delta = (speeds[i] - speeds[j]).abs();
                if delta < min_delta {
                    return Err(HarmonicError::TooClose {
                        first: harmonics[i].to_string(),
                        second: harmonics[j].to_string(),
                        delta,
                        min_delta,
                    }
                    .into());
                }
            }
        }

        debug!(count = harmonics.len(), min_delta, "model created");
        let len = harmonics.len();
        Ok(Self {
            harmonics,
            speeds,
            rates: *rates,
            min_delta,
            amplitudes_cos: vec![0.0; len],
            amplitudes_sin: vec![0.0; len],
        })
    }

    /// [`Model::new`] with [`DEFAULT_MIN_DELTA`].
    pub fn with_harmonics(
        harmonics: impl Into<Arc<[Harmonic]>>,
        rates: &AstronomicalRates,
    ) -> Result<Self> {
        Self::new(harmonics, rates, DEFAULT_MIN_DELTA)
    }

    pub fn harmonics(&self) -> &[Harmonic] {
        &self.harmonics
    }

    /// Speeds in deg/h, aligned with [`Model::harmonics`].
    pub fn speeds(&self) -> &[f64] {
        &self.speeds
    }

    pub fn rates(&self) -> &AstronomicalRates {
        &self.rates
    }

    pub fn min_delta(&self) -> f64 {
        self.min_delta
    }

    pub fn len(&self) -> usize {
        self.harmonics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.harmonics.is_empty()
    }

    pub fn amplitudes_cos(&self) -> &[f64] {
        &self.amplitudes_cos
    }

    pub fn amplitudes_sin(&self) -> &[f64] {
        &self.amplitudes_sin
    }

    /// Both coefficient arrays, writable but fixed in length.
    pub fn amplitudes_mut(&mut self) -> (&mut [f64], &mut [f64]) {
        (&mut self.amplitudes_cos, &mut self.amplitudes_sin)
    }

    /// Cosine and sine amplitude of harmonic `index`.
    pub fn coefficients(&self, index: usize) -> Result<(f64, f64)> {
        self.check_index(index)?;
        Ok((self.amplitudes_cos[index], self.amplitudes_sin[index]))
    }

    pub fn set_coefficients(&mut self, index: usize, cos: f64, sin: f64) -> Result<()> {
        self.check_index(index)?;
        self.amplitudes_cos[index] = cos;
        self.amplitudes_sin[index] = sin;
        Ok(())
    }

    /// `sqrt(cos² + sin²)` of harmonic `index`.
    pub fn amplitude(&self, index: usize) -> Result<f64> {
        let (c, s) = self.coefficients(index)?;
        Ok(c.hypot(s))
    }

    /// Phase lag of harmonic `index` in degrees, `atan2(sin, cos)`.
    pub fn phase(&self, index: usize) -> Result<f64> {
        let (c, s) = self.coefficients(index)?;
        Ok(s.atan2(c).to_degrees())
    }

    pub(crate) fn check_index(&self, index: usize) -> Result<()> {
        if index < self.len() {
            Ok(())
        } else {
            Err(TideError::HarmonicIndex {
                index,
                len: self.len(),
            })
        }
    }

    /// Predicted height at an aware instant.
    pub fn height<T: Timestamp + ?Sized>(&self, t: &T) -> Result<f64> {
        Ok(self.height_at_hours(hours_since_epoch(t)?))
    }

    /// Predicted height `hours` after T0.
    pub fn height_at_hours(&self, hours: f64) -> f64 {
        self.speeds
            .iter()
            .zip(&self.amplitudes_cos)
            .zip(&self.amplitudes_sin)
            .map(|((speed, c), s)| {
                let angle = (speed * hours).to_radians();
                c * angle.cos() + s * angle.sin()
            })
            .sum()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<18} {:>12} {:>10} {:>10} {:>10} {:>8}",
            "harmonic", "speed", "cos", "sin", "amplitude", "phase"
        )?;
        for (i, harmonic) in self.harmonics.iter().enumerate() {
            let (c, s) = (self.amplitudes_cos[i], self.amplitudes_sin[i]);
            writeln!(
                f,
                "{:<18} {:>12.7} {:>10.4} {:>10.4} {:>10.4} {:>8.2}",
                harmonic.to_string(),
                self.speeds[i],
                c,
                s,
                c.hypot(s),
                s.atan2(c).to_degrees()
            )?;
        }
        Ok(())
    }
}

/// Persisted form of a [`Model`].
///
/// Speeds are not stored; they are recomputed from the stored rates, which
/// reproduces them bit for bit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelRecord {
    pub harmonics: Vec<Harmonic>,
    pub rates: AstronomicalRates,
    pub min_delta: f64,
    pub amplitudes_cos: Vec<f64>,
    pub amplitudes_sin: Vec<f64>,
}

impl From<Model> for ModelRecord {
    fn from(model: Model) -> Self {
        Self {
            harmonics: model.harmonics.to_vec(),
            rates: model.rates,
            min_delta: model.min_delta,
            amplitudes_cos: model.amplitudes_cos,
            amplitudes_sin: model.amplitudes_sin,
        }
    }
}

impl TryFrom<ModelRecord> for Model {
    type Error = TideError;

    fn try_from(record: ModelRecord) -> Result<Self> {
        let len = record.harmonics.len();
        if record.amplitudes_cos.len() != len || record.amplitudes_sin.len() != len {
            return Err(TideError::Record(format!(
                "{} harmonics but {} cosine and {} sine amplitudes",
                len,
                record.amplitudes_cos.len(),
                record.amplitudes_sin.len()
            )));
        }
        let mut model = Model::new(record.harmonics, &record.rates, record.min_delta)?;
        model.amplitudes_cos = record.amplitudes_cos;
        model.amplitudes_sin = record.amplitudes_sin;
        Ok(model)
    }
}

/// Named harmonic sets, each a superset of the previous one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Catalog {
    N3,
    N6,
    N10,
    N16,
    N24,
    N32,
}

const N3: &[Harmonic] = &[h::M0, h::M2, h::S2, h::N2];
const N6: &[Harmonic] = &[h::K1, h::M4, h::O1];
const N10: &[Harmonic] = &[h::M6, h::MK3, h::S4, h::MN4];
const N16: &[Harmonic] = &[h::NU2, h::MU2, h::TWO_N2, h::OO1, h::LAMBDA2];
const N24: &[Harmonic] = &[h::S1, h::M1, h::J1, h::MM, h::SSA, h::SA, h::MSF, h::MF];
const N32: &[Harmonic] = &[h::RHO1, h::Q1, h::T2, h::R2, h::TWO_Q1, h::P1, h::TWO_SM2, h::M3];

impl Catalog {
    pub const ALL: [Catalog; 6] = [
        Catalog::N3,
        Catalog::N6,
        Catalog::N10,
        Catalog::N16,
        Catalog::N24,
        Catalog::N32,
    ];

    /// Harmonics of this catalog, in model order.
    pub fn harmonics(&self) -> Vec<Harmonic> {
        let groups: &[&[Harmonic]] = match self {
            Catalog::N3 => &[N3],
            Catalog::N6 => &[N3, N6],
            Catalog::N10 => &[N3, N6, N10],
            Catalog::N16 => &[N3, N6, N10, N16],
            Catalog::N24 => &[N3, N6, N10, N16, N24],
            Catalog::N32 => &[N3, N6, N10, N16, N24, N32],
        };
        groups.concat()
    }

    /// Closest admissible separation. The larger sets hold constituents only
    /// 0.041 deg/h apart (S2/T2, M0/Sa).
    pub fn min_delta(&self) -> f64 {
        match self {
            Catalog::N3 | Catalog::N6 | Catalog::N10 => DEFAULT_MIN_DELTA,
            Catalog::N16 => 0.05,
            Catalog::N24 | Catalog::N32 => 0.03,
        }
    }

    /// A zeroed model of this catalog.
    pub fn model(&self, rates: &AstronomicalRates) -> Result<Model> {
        Model::new(self.harmonics(), rates, self.min_delta())
    }
}

impl FromStr for Catalog {
    type Err = TideError;

    fn from_str(s: &str) -> Result<Self> {
        Catalog::ALL
            .into_iter()
            .find(|c| c.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TideError::UnknownCatalog(s.to_string()))
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
