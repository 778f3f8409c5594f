//! # Astronomical Argument Speeds
//!
//! The Doodson arguments, with T in Julian centuries of 36 525 days since T0:
//!
//! ```text
//! tau = 15 deg * t + h - s          mean lunar time
//! s   = 277.0248 + 481267.8906 T + 0.0020 T^2   mean longitude of the Moon
//! h   = 280.1895 +  36000.7689 T + 0.0003 T^2   mean longitude of the Sun
//! p   = 334.3853 +   4069.0340 T + 0.0103 T^2   longitude of the lunar perigee
//! N   = 100.8432 +   1934.4200 T + 0.0021 T^2   negative lunar node longitude
//! p1  = 281.2209 +      1.7192 T + 0.0005 T^2   longitude of the solar perigee
//! ```
//!
//! Only the time derivatives matter for harmonic speeds. With the
//! second-order correction enabled, each speed gains `2 * c2 * T` where T is
//! the whole-day age of the reference instant in centuries; without it the
//! speeds are the pure linear rates.

use crate::time::epoch;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

const DAYS_PER_CENTURY: f64 = 36_525.0;
const HOURS_PER_CENTURY: f64 = DAYS_PER_CENTURY * 24.0;

/// Switches that decide how the argument speeds are derived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RateConfig {
    /// Apply the T^2 correction to every speed
    #[serde(default)]
    pub time_correction: bool,
    /// Instant at which T is measured when correcting; `None` means now
    #[serde(default)]
    pub reference: Option<DateTime<Utc>>,
}

impl RateConfig {
    /// Linear rates only. Catalog speeds are tabulated in this mode.
    pub fn uncorrected() -> Self {
        Self::default()
    }

    /// Same reference, with the correction switched on when `force` is set.
    pub fn forcing_correction(self, force: bool) -> Self {
        Self {
            time_correction: self.time_correction || force,
            ..self
        }
    }

    /// Corrected rates pinned to a fixed instant.
    pub fn corrected_at(reference: DateTime<Utc>) -> Self {
        Self {
            time_correction: true,
            reference: Some(reference),
        }
    }
}

/// Speeds of the six astronomical arguments, in degrees per hour.
///
/// Built once from a [`RateConfig`] and handed to every speed computation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AstronomicalRates {
    pub tau_speed: f64,
    pub s_speed: f64,
    pub h_speed: f64,
    pub p_speed: f64,
    #[serde(rename = "N_speed")]
    pub n_speed: f64,
    pub p1_speed: f64,
}

impl AstronomicalRates {
    pub fn new(config: &RateConfig) -> Self {
        let centuries = if config.time_correction {
            let at = config.reference.unwrap_or_else(Utc::now);
            // Whole days only, the fraction of a day is far below the
            // resolution of the quadratic terms.
            at.signed_duration_since(epoch()).num_days() as f64 / DAYS_PER_CENTURY
        } else {
            0.0
        };
        let rates = Self::at_centuries(centuries);
        debug!(
            time_correction = config.time_correction,
            centuries,
            tau = rates.tau_speed,
            "astronomical rates"
        );
        rates
    }

    /// Linear rates, no time correction.
    pub fn uncorrected() -> Self {
        Self::at_centuries(0.0)
    }

    fn at_centuries(t: f64) -> Self {
        let rate = |linear: f64, quadratic: f64| (linear + 2.0 * quadratic * t) / HOURS_PER_CENTURY;
        let s_speed = rate(481_267.890_6, 0.0020);
        let h_speed = rate(36_000.768_9, 0.0003);
        Self {
            tau_speed: 15.0 + h_speed - s_speed,
            s_speed,
            h_speed,
            p_speed: rate(4_069.034_0, 0.0103),
            n_speed: rate(1_934.420, 0.0021),
            p1_speed: rate(1.719_20, 0.0005),
        }
    }

    /// Speeds in Doodson order, ready for a dot product.
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.tau_speed,
            self.s_speed,
            self.h_speed,
            self.p_speed,
            self.n_speed,
            self.p1_speed,
        ]
    }
}

impl Default for AstronomicalRates {
    fn default() -> Self {
        Self::uncorrected()
    }
}
