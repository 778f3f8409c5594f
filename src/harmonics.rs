//! # Harmonic Constituents
//!
//! A harmonic is identified by its six Doodson numbers `[n0..n5]`. Its speed
//! is the dot product of those numbers with the argument speeds
//! `[tau, s, h, p, N, p1]` from [`AstronomicalRates`].
//!
//! Doodson numbers are usually written as six digits, `n0 (n1+5) (n2+5) .
//! (n3+5) (n4+5) (n5+5)`, so M2 = `[2, 0, 0, 0, 0, 0]` reads `255.555`.
//!
//! | Argument | Period          | Mean longitude  |
//! | -------- | --------------- | --------------- |
//! | tau      | 1.035 days      | Mean lunar time |
//! | s        | 27.321582 days  | Moon            |
//! | h        | 365.242199 days | Sun             |
//! | p        | 8.847 years     | Lunar perigee   |
//! | N        | 18.613 years    | Lunar node      |
//! | p1       | 20940 years     | Solar perigee   |
//!
//! Constituent sources:
//! - Fabien Lefèvre, *Le potentiel générateur des marées*, chap. 4
//! - *Theory of tides*, Wikipedia
//! - Myrl Hendershott, *Introduction to ocean tides*, lecture 1

use crate::astro::AstronomicalRates;
use crate::error::{HarmonicError, Result, TideError};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Offset added to n1..n5 in the digit notation.
const DIGIT_OFFSET: i32 = 5;

/// One tidal constituent, as six Doodson numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<i32>", into = "Vec<i32>")]
pub struct Harmonic {
    n: [i32; 6],
}

impl Harmonic {
    /// Validate and build a harmonic from raw Doodson numbers.
    ///
    /// `n0 >= 0` and `-5 <= n1..n5 < 5`.
    pub fn new(n: &[i32]) -> std::result::Result<Self, HarmonicError> {
        debug!(?n, "building harmonic");
        let n: [i32; 6] = n
            .try_into()
            .map_err(|_| HarmonicError::WrongLength(n.len()))?;
        if n[0] < 0 {
            return Err(HarmonicError::NegativeSpeedNumber(n[0]));
        }
        for (index, &value) in n.iter().enumerate().skip(1) {
            if !(-DIGIT_OFFSET..DIGIT_OFFSET).contains(&value) {
                return Err(HarmonicError::OutOfBounds { index, value });
            }
        }
        Ok(Self { n })
    }

    /// Build from six digits 0-9, subtracting 5 from the last five.
    pub fn from_digits(
        d0: i32,
        d1: i32,
        d2: i32,
        d3: i32,
        d4: i32,
        d5: i32,
    ) -> std::result::Result<Self, HarmonicError> {
        Self::new(&[
            d0,
            d1 - DIGIT_OFFSET,
            d2 - DIGIT_OFFSET,
            d3 - DIGIT_OFFSET,
            d4 - DIGIT_OFFSET,
            d5 - DIGIT_OFFSET,
        ])
    }

    /// Build from a packed Doodson number, e.g. `255555` for M2.
    ///
    /// Digits are read most significant first. Negative input surfaces as a
    /// negative first number.
    pub fn from_number(number: i64) -> std::result::Result<Self, HarmonicError> {
        let digit = |scale: i64| (number.rem_euclid(scale * 10) / scale) as i32;
        let d0 = number.div_euclid(100_000);
        let d0 = i32::try_from(d0).map_err(|_| HarmonicError::NumberOutOfRange(number))?;
        Self::from_digits(
            d0,
            digit(10_000),
            digit(1_000),
            digit(100),
            digit(10),
            digit(1),
        )
    }

    /// Catalog constants are written in digit notation and checked by tests.
    const fn digits(d0: i32, d1: i32, d2: i32, d3: i32, d4: i32, d5: i32) -> Self {
        Self {
            n: [
                d0,
                d1 - DIGIT_OFFSET,
                d2 - DIGIT_OFFSET,
                d3 - DIGIT_OFFSET,
                d4 - DIGIT_OFFSET,
                d5 - DIGIT_OFFSET,
            ],
        }
    }

    /// The six Doodson numbers.
    pub fn numbers(&self) -> [i32; 6] {
        self.n
    }

    /// Rotation speed in degrees per hour.
    pub fn speed(&self, rates: &AstronomicalRates) -> f64 {
        let n = self.n.map(f64::from);
        n[0] * rates.tau_speed
            + n[1] * rates.s_speed
            + n[2] * rates.h_speed
            + n[3] * rates.p_speed
            + n[4] * rates.n_speed
            + n[5] * rates.p1_speed
    }

    /// Catalog name, when the harmonic is a named constituent.
    ///
    /// M0 and S0 share their numbers, the first one listed wins.
    pub fn name(&self) -> Option<&'static str> {
        CATALOG
            .iter()
            .find(|(_, h)| h == self)
            .map(|(name, _)| *name)
    }
}

impl TryFrom<Vec<i32>> for Harmonic {
    type Error = HarmonicError;

    fn try_from(n: Vec<i32>) -> std::result::Result<Self, Self::Error> {
        Self::new(&n)
    }
}

impl From<Harmonic> for Vec<i32> {
    fn from(h: Harmonic) -> Self {
        h.n.to_vec()
    }
}

impl fmt::Display for Harmonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = |i: usize| self.n[i] + DIGIT_OFFSET;
        write!(
            f,
            "{}{}{}.{}{}{}",
            self.n[0],
            d(1),
            d(2),
            d(3),
            d(4),
            d(5)
        )?;
        if let Some(name) = self.name() {
            write!(f, " ({name})")?;
        }
        Ok(())
    }
}

/// Resolve a constituent by catalog name (case sensitive, `"2N2"`, `"nu2"`).
pub fn by_name(name: &str) -> Result<Harmonic> {
    CATALOG
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, h)| *h)
        .ok_or_else(|| TideError::UnknownHarmonic(name.to_string()))
}

// Long period
pub const M0: Harmonic = Harmonic::digits(0, 5, 5, 5, 5, 5);
pub const S0: Harmonic = Harmonic::digits(0, 5, 5, 5, 5, 5);
pub const SA: Harmonic = Harmonic::digits(0, 5, 6, 5, 5, 4);
pub const SSA: Harmonic = Harmonic::digits(0, 5, 7, 5, 5, 5);
pub const STA: Harmonic = Harmonic::digits(0, 5, 8, 5, 5, 4);
pub const MSM: Harmonic = Harmonic::digits(0, 6, 3, 6, 5, 5);
pub const MM: Harmonic = Harmonic::digits(0, 6, 5, 4, 5, 5);
pub const MSF: Harmonic = Harmonic::digits(0, 7, 3, 5, 5, 5);
pub const MF: Harmonic = Harmonic::digits(0, 7, 5, 5, 5, 5);
pub const MSTM: Harmonic = Harmonic::digits(0, 8, 3, 6, 5, 5);
pub const MTM: Harmonic = Harmonic::digits(0, 8, 5, 4, 5, 5);
pub const MSQM: Harmonic = Harmonic::digits(0, 9, 3, 5, 5, 5);
/// 18.613 years, lunar node precession
pub const NODAL_M0_1: Harmonic = Harmonic::digits(0, 5, 5, 5, 6, 5);
pub const NODAL_M0_2: Harmonic = Harmonic::digits(0, 7, 5, 5, 6, 5);

// Diurnal
pub const TWO_Q1: Harmonic = Harmonic::digits(1, 2, 5, 7, 5, 5);
pub const SIGMA1: Harmonic = Harmonic::digits(1, 2, 7, 5, 5, 5);
pub const Q1: Harmonic = Harmonic::digits(1, 3, 5, 6, 5, 5);
pub const RHO1: Harmonic = Harmonic::digits(1, 3, 7, 4, 5, 5);
pub const O1: Harmonic = Harmonic::digits(1, 4, 5, 5, 5, 5);
pub const TAU1: Harmonic = Harmonic::digits(1, 4, 7, 5, 5, 5);
pub const M1: Harmonic = Harmonic::digits(1, 5, 5, 5, 5, 5);
pub const CHI1: Harmonic = Harmonic::digits(1, 5, 7, 4, 5, 5);
pub const PI1: Harmonic = Harmonic::digits(1, 6, 2, 5, 5, 6);
pub const P1: Harmonic = Harmonic::digits(1, 6, 3, 5, 5, 5);
pub const S1: Harmonic = Harmonic::digits(1, 6, 4, 5, 5, 5);
pub const K1: Harmonic = Harmonic::digits(1, 6, 5, 5, 5, 5);
pub const PSI1: Harmonic = Harmonic::digits(1, 6, 6, 5, 5, 4);
pub const PHI1: Harmonic = Harmonic::digits(1, 6, 7, 5, 5, 5);
pub const THETA1: Harmonic = Harmonic::digits(1, 7, 3, 6, 5, 5);
pub const J1: Harmonic = Harmonic::digits(1, 7, 5, 4, 5, 5);
pub const OO1: Harmonic = Harmonic::digits(1, 8, 5, 5, 5, 5);
pub const NU1: Harmonic = Harmonic::digits(1, 9, 5, 4, 5, 5);

// Semi-diurnal
pub const TWO_N2: Harmonic = Harmonic::digits(2, 3, 5, 7, 5, 5);
pub const MU2: Harmonic = Harmonic::digits(2, 3, 7, 5, 5, 5);
pub const N2: Harmonic = Harmonic::digits(2, 4, 5, 6, 5, 5);
pub const NU2: Harmonic = Harmonic::digits(2, 4, 7, 4, 5, 5);
pub const M2: Harmonic = Harmonic::digits(2, 5, 5, 5, 5, 5);
pub const LAMBDA2: Harmonic = Harmonic::digits(2, 6, 3, 6, 5, 5);
pub const L2: Harmonic = Harmonic::digits(2, 6, 5, 4, 5, 5);
pub const T2: Harmonic = Harmonic::digits(2, 7, 2, 5, 5, 6);
pub const S2: Harmonic = Harmonic::digits(2, 7, 3, 5, 5, 5);
pub const R2: Harmonic = Harmonic::digits(2, 7, 4, 5, 5, 4);
pub const K2: Harmonic = Harmonic::digits(2, 7, 5, 5, 5, 5);
pub const TWO_SM2: Harmonic = Harmonic::digits(2, 9, 1, 5, 5, 5);

// Shallow water and short period
pub const M3: Harmonic = Harmonic::digits(3, 5, 5, 5, 5, 5);
pub const TWO_MK3: Harmonic = Harmonic::digits(3, 4, 5, 5, 5, 5);
pub const MK3: Harmonic = Harmonic::digits(3, 6, 5, 5, 5, 5);
pub const MN4: Harmonic = Harmonic::digits(4, 4, 5, 6, 5, 5);
pub const M4: Harmonic = Harmonic::digits(4, 5, 5, 5, 5, 5);
pub const MS4: Harmonic = Harmonic::digits(4, 7, 3, 5, 5, 5);
pub const S4: Harmonic = Harmonic::digits(4, 9, 1, 5, 5, 5);
pub const M6: Harmonic = Harmonic::digits(6, 5, 5, 5, 5, 5);
pub const M8: Harmonic = Harmonic::digits(8, 5, 5, 5, 5, 5);

/// Every named constituent, grouped by species.
pub const CATALOG: &[(&str, Harmonic)] = &[
    ("M0", M0),
    ("S0", S0),
    ("Sa", SA),
    ("Ssa", SSA),
    ("Sta", STA),
    ("Msm", MSM),
    ("Mm", MM),
    ("Msf", MSF),
    ("Mf", MF),
    ("Mstm", MSTM),
    ("Mtm", MTM),
    ("Msqm", MSQM),
    ("nodal_M0_1", NODAL_M0_1),
    ("nodal_M0_2", NODAL_M0_2),
    ("2Q1", TWO_Q1),
    ("sigma1", SIGMA1),
    ("Q1", Q1),
    ("rho1", RHO1),
    ("O1", O1),
    ("tau1", TAU1),
    ("M1", M1),
    ("chi1", CHI1),
    ("pi1", PI1),
    ("P1", P1),
    ("S1", S1),
    ("K1", K1),
    ("psi1", PSI1),
    ("phi1", PHI1),
    ("theta1", THETA1),
    ("J1", J1),
    ("OO1", OO1),
    ("nu1", NU1),
    ("2N2", TWO_N2),
    ("mu2", MU2),
    ("N2", N2),
    ("nu2", NU2),
    ("M2", M2),
    ("lambda2", LAMBDA2),
    ("L2", L2),
    ("T2", T2),
    ("S2", S2),
    ("R2", R2),
    ("K2", K2),
    ("2SM2", TWO_SM2),
    ("M3", M3),
    ("2MK3", TWO_MK3),
    ("MK3", MK3),
    ("MN4", MN4),
    ("M4", M4),
    ("MS4", MS4),
    ("S4", S4),
    ("M6", M6),
    ("M8", M8),
];

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn speed(h: Harmonic) -> f64 {
        h.speed(&AstronomicalRates::uncorrected())
    }

    #[test]
    fn test_create_harmonic() {
        let h = Harmonic::new(&[1, 0, 0, 1, 0, 0]).unwrap();
        assert_eq!(h.numbers(), [1, 0, 0, 1, 0, 0]);
    }

    #[test]
    fn test_wrong_length() {
        assert_eq!(
            Harmonic::new(&[0, 0, 0, 0, 0]),
            Err(HarmonicError::WrongLength(5))
        );
        assert_eq!(
            Harmonic::new(&[0, 0, 0, 0, 0, 0, 0]),
            Err(HarmonicError::WrongLength(7))
        );
    }

    #[test]
    fn test_value_limits() {
        assert_eq!(
            Harmonic::new(&[-1, 0, 0, 0, 0, 0]),
            Err(HarmonicError::NegativeSpeedNumber(-1))
        );
        for index in 1..6 {
            for value in [-6, 5] {
                let mut n = [0; 6];
                n[index] = value;
                assert_eq!(
                    Harmonic::new(&n),
                    Err(HarmonicError::OutOfBounds { index, value }),
                    "n{index}={value} should be rejected"
                );
            }
            let mut n = [0; 6];
            n[index] = -5;
            assert!(Harmonic::new(&n).is_ok());
            n[index] = 4;
            assert!(Harmonic::new(&n).is_ok());
        }
    }

    #[test]
    fn test_speed_samples() {
        let h = Harmonic::new(&[1, -2, 0, 1, 0, 0]).unwrap();
        assert_abs_diff_eq!(speed(h), 13.39866, epsilon = 1e-5);
        let cases = [
            (55_555, 0.0),
            (56_554, 0.041_066_7),
            (63_655, 0.471_521_1),
            (125_755, 12.854_286_2),
            (127_555, 12.927_139_8),
            (173_655, 15.512_589_7),
        ];
        for (number, expected) in cases {
            let h = Harmonic::from_number(number).unwrap();
            assert_abs_diff_eq!(speed(h), expected, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_from_digits() {
        let h = Harmonic::from_digits(2, 7, 3, 5, 5, 9).unwrap();
        assert_eq!(h.numbers(), [2, 2, -2, 0, 0, 4]);
        assert!(Harmonic::from_digits(0, 0, 0, 0, 0, 10).is_err());
    }

    #[test]
    fn test_from_number() {
        assert_eq!(
            Harmonic::from_number(155_555).unwrap().numbers(),
            [1, 0, 0, 0, 0, 0]
        );
        assert_eq!(
            Harmonic::from_number(266_444).unwrap().numbers(),
            [2, 1, 1, -1, -1, -1]
        );
        assert!(matches!(
            Harmonic::from_number(-1),
            Err(HarmonicError::NegativeSpeedNumber(_))
        ));
    }

    #[test]
    fn test_from_number_overflow_names_input() {
        let err = Harmonic::from_number(999_999_999_999_999).unwrap_err();
        assert_eq!(err, HarmonicError::NumberOutOfRange(999_999_999_999_999));
        assert!(err.to_string().contains("999999999999999"), "{err}");
        assert_eq!(
            Harmonic::from_number(i64::MIN),
            Err(HarmonicError::NumberOutOfRange(i64::MIN))
        );
    }

    #[test]
    fn test_number_and_digits_agree() {
        // Walk a spread of codes instead of all million.
        for d0 in 0..4 {
            for d1 in 0..10 {
                for d3 in [0, 4, 9] {
                    for d5 in [1, 5, 8] {
                        let number = d0 * 100_000 + d1 * 10_000 + 5_000 + d3 * 100 + 50 + d5;
                        let packed = Harmonic::from_number(number as i64).unwrap();
                        let digits = Harmonic::from_digits(d0, d1, 5, d3, 5, d5).unwrap();
                        assert_eq!(packed, digits, "code {number:06}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_speed_is_pure() {
        let rates = AstronomicalRates::uncorrected();
        for (_, h) in CATALOG {
            assert_eq!(h.speed(&rates).to_bits(), h.speed(&rates).to_bits());
        }
    }

    #[test]
    fn test_constants_are_valid() {
        for (name, h) in CATALOG {
            assert_eq!(
                Harmonic::new(&h.numbers()).as_ref(),
                Ok(h),
                "{name} has invalid numbers"
            );
        }
    }

    #[test]
    fn test_constant_speeds() {
        let expected = [
            (M0, 0.0),
            (S0, 0.0),
            (SA, 0.041_066_7),
            (SSA, 0.082_137_3),
            (STA, 0.123_204_0),
            (MSM, 0.471_521_1),
            (MM, 0.544_374_7),
            (MSF, 1.015_895_8),
            (MF, 1.098_033_1),
            (MSTM, 1.569_554_8),
            (MTM, 1.642_407_8),
            (MSQM, 2.113_928_8),
            (NODAL_M0_1, 0.002_206_7),
            (NODAL_M0_2, 1.100_24),
            (TWO_Q1, 12.854_286_2),
            (SIGMA1, 12.927_139_8),
            (Q1, 13.398_660_9),
            (RHO1, 13.471_514_5),
            (O1, 13.943_035_6),
            (TAU1, 14.025_172_9),
            (CHI1, 14.569_547_6),
            (PI1, 14.917_864_7),
            (P1, 14.958_931_4),
            (K1, 15.041_068_6),
            (PSI1, 15.082_135_3),
            (PHI1, 15.123_205_9),
            (THETA1, 15.512_589_7),
            (J1, 15.585_443_3),
            (OO1, 16.139_101_7),
            (NU1, 16.683_476_4),
            (S1, 15.0),
            (M1, 14.492_052_1),
            (TWO_N2, 27.895_354_8),
            (MU2, 27.968_208_4),
            (N2, 28.439_729_5),
            (NU2, 28.512_583),
            (M2, 28.984_104_2),
            (LAMBDA2, 29.455_625_3),
            (L2, 29.528_478_9),
            (T2, 29.958_933_3),
            (S2, 30.0),
            (R2, 30.041_066_7),
            (K2, 30.082_137_3),
            (TWO_SM2, 31.015_895_8),
            (M4, 57.968_208_4),
            (M6, 86.952_312_7),
            (MK3, 44.025_172_9),
            (S4, 60.0),
            (MN4, 57.423_833_74),
            (M3, 43.476_156_3),
            (TWO_MK3, 42.927_139_8),
            (M8, 115.936_416_6),
            (MS4, 58.984_104_2),
        ];
        for (h, value) in expected {
            assert_abs_diff_eq!(speed(h), value, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_names() {
        assert_eq!(by_name("M2").unwrap(), M2);
        assert_eq!(by_name("2N2").unwrap(), TWO_N2);
        assert!(matches!(by_name("X9"), Err(TideError::UnknownHarmonic(_))));
        assert_eq!(K1.name(), Some("K1"));
        assert_eq!(S0.name(), Some("M0"));
        assert_eq!(M2.to_string(), "255.555 (M2)");
    }

    #[test]
    fn test_serde_validates() {
        let json = serde_json::to_string(&N2).unwrap();
        assert_eq!(json, "[2,-1,0,1,0,0]");
        assert_eq!(serde_json::from_str::<Harmonic>(&json).unwrap(), N2);
        assert!(serde_json::from_str::<Harmonic>("[2,-1,0,9,0,0]").is_err());
    }
}
