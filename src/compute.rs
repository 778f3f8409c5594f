//! # Fitting and Tuning
//!
//! Two operation shapes live here and must not be confused:
//!
//! - [`fourier_transform`] **resets and fits in place**: it takes
//!   `&mut Model` and overwrites every coefficient.
//! - The tuners ([`tune_grid`], [`tune_amplitude`], [`tune_angular`]) are
//!   **copy-on-write**: they take `&Model`, score candidates on independent
//!   copies, and return the best `(Model, ErrorMetric)`. Their input is
//!   never modified.
//!
//! ## Fourier estimate
//! ```text
//! Cᵢ = 2/N · Σ h(t) · cos(wᵢ t)      Sᵢ = 2/N · Σ h(t) · sin(wᵢ t)
//! ```
//! with the factor 2 dropped for a harmonic whose speed is exactly zero.
//! Assumes the samples span enough periods for the harmonics to be close to
//! orthogonal.
//!
//! ## Tuning
//! Each tuner walks a finite candidate set for one harmonic, in a fixed
//! order, and keeps a candidate only when it strictly lowers the score.
//! Ties keep the earlier candidate, starting with the untouched input.

use crate::error::{Result, TideError};
use crate::metrics::{Criterion, ErrorMetric};
use crate::model::Model;
use crate::Sample;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use tracing::{debug, info};

/// Fit every amplitude of `model` from `samples`. **Mutates `model`.**
///
/// Any previous coefficients are discarded. Fails before touching the model
/// when `samples` is empty.
pub fn fourier_transform(model: &mut Model, samples: &[Sample]) -> Result<ErrorMetric> {
    if samples.is_empty() {
        return Err(TideError::EmptySamples);
    }
    let n = samples.len() as f64;
    let speeds = model.speeds().to_vec();
    let mut sum_cos = vec![0.0; speeds.len()];
    let mut sum_sin = vec![0.0; speeds.len()];

    for sample in samples {
        let hours = sample.hours();
        for (i, speed) in speeds.iter().enumerate() {
            let angle = (speed * hours).to_radians();
            sum_cos[i] += sample.height() * angle.cos();
            sum_sin[i] += sample.height() * angle.sin();
        }
    }

    let (cos, sin) = model.amplitudes_mut();
    for (i, &speed) in speeds.iter().enumerate() {
        // Exact comparison: only a true mean level gets the DC normalization.
        let scale = if speed != 0.0 { 2.0 / n } else { 1.0 / n };
        cos[i] = sum_cos[i] * scale;
        sin[i] = sum_sin[i] * scale;
    }

    let error = ErrorMetric::evaluate(model, samples)?;
    info!(samples = samples.len(), harmonics = speeds.len(), %error, "fourier fit");
    Ok(error)
}

/// Local search strategies over one harmonic's coefficients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TunerKind {
    /// Independent steps on both coefficients
    Grid,
    /// Radial scaling, phase preserved
    Amplitude,
    /// Rotation at constant amplitude
    Angular,
}

impl TunerKind {
    pub const ALL: [TunerKind; 3] = [TunerKind::Grid, TunerKind::Amplitude, TunerKind::Angular];

    pub fn tune(
        &self,
        model: &Model,
        index: usize,
        radius: f64,
        steps: usize,
        samples: &[Sample],
        criterion: Criterion,
    ) -> Result<(Model, ErrorMetric)> {
        match self {
            TunerKind::Grid => tune_grid_with(model, index, radius, steps, samples, criterion),
            TunerKind::Amplitude => {
                tune_amplitude_with(model, index, radius, steps, samples, criterion)
            }
            TunerKind::Angular => tune_angular_with(model, index, radius, steps, samples, criterion),
        }
    }
}

impl fmt::Display for TunerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TunerKind::Grid => "grid",
            TunerKind::Amplitude => "amplitude",
            TunerKind::Angular => "angular",
        };
        f.write_str(name)
    }
}

/// Grid search: `c = c0 + n·d`, `s = s0 + m·d` for `n, m ∈ [-N, N]`, with
/// `d = radius / N · |(c0, s0)|`. Outer loop on `n`, inner on `m`.
pub fn tune_grid(
    model: &Model,
    index: usize,
    radius: f64,
    steps: usize,
    samples: &[Sample],
) -> Result<(Model, ErrorMetric)> {
    tune_grid_with(model, index, radius, steps, samples, Criterion::default())
}

pub fn tune_grid_with(
    model: &Model,
    index: usize,
    radius: f64,
    steps: usize,
    samples: &[Sample],
    criterion: Criterion,
) -> Result<(Model, ErrorMetric)> {
    let Some((c0, s0)) = start(model, index, steps, samples)? else {
        return unchanged(model, samples);
    };
    let d = radius / steps as f64 * c0.hypot(s0);
    let candidates = offsets(steps)
        .flat_map(|n| offsets(steps).map(move |m| (c0 + n * d, s0 + m * d)));
    search(model, index, samples, criterion, TunerKind::Grid, candidates)
}

/// Amplitude search: `(c, s) = (c0, s0) · (1 + n·d)` for `n ∈ [-N, N]`,
/// with `d = radius / N`.
pub fn tune_amplitude(
    model: &Model,
    index: usize,
    radius: f64,
    steps: usize,
    samples: &[Sample],
) -> Result<(Model, ErrorMetric)> {
    tune_amplitude_with(model, index, radius, steps, samples, Criterion::default())
}

pub fn tune_amplitude_with(
    model: &Model,
    index: usize,
    radius: f64,
    steps: usize,
    samples: &[Sample],
    criterion: Criterion,
) -> Result<(Model, ErrorMetric)> {
    let Some((c0, s0)) = start(model, index, steps, samples)? else {
        return unchanged(model, samples);
    };
    let d = radius / steps as f64;
    let candidates = offsets(steps).map(|n| (c0 * (1.0 + n * d), s0 * (1.0 + n * d)));
    search(
        model,
        index,
        samples,
        criterion,
        TunerKind::Amplitude,
        candidates,
    )
}

/// Angular search at constant amplitude `M0 = |(c0, s0)|`: with
/// `a0 = atan2(c0, s0)` and `d = radius / N`, candidates are
/// `a = a0 + π·(1 + n·d)`, `(c, s) = (M0·cos a, M0·sin a)` for `n ∈ [-N, N]`.
pub fn tune_angular(
    model: &Model,
    index: usize,
    radius: f64,
    steps: usize,
    samples: &[Sample],
) -> Result<(Model, ErrorMetric)> {
    tune_angular_with(model, index, radius, steps, samples, Criterion::default())
}

pub fn tune_angular_with(
    model: &Model,
    index: usize,
    radius: f64,
    steps: usize,
    samples: &[Sample],
    criterion: Criterion,
) -> Result<(Model, ErrorMetric)> {
    let Some((c0, s0)) = start(model, index, steps, samples)? else {
        return unchanged(model, samples);
    };
    let d = radius / steps as f64;
    let magnitude = c0.hypot(s0);
    let a0 = c0.atan2(s0);
    let candidates = offsets(steps).map(|n| {
        let a = a0 + PI * (1.0 + n * d);
        (magnitude * a.cos(), magnitude * a.sin())
    });
    search(
        model,
        index,
        samples,
        criterion,
        TunerKind::Angular,
        candidates,
    )
}

/// Validates tuner inputs. `None` means there is nothing to search (N = 0).
fn start(model: &Model, index: usize, steps: usize, samples: &[Sample]) -> Result<Option<(f64, f64)>> {
    let coefficients = model.coefficients(index)?;
    if samples.is_empty() {
        return Err(TideError::EmptySamples);
    }
    Ok((steps > 0).then_some(coefficients))
}

fn unchanged(model: &Model, samples: &[Sample]) -> Result<(Model, ErrorMetric)> {
    Ok((model.clone(), ErrorMetric::evaluate(model, samples)?))
}

/// `-N..=N` as floats, ascending.
fn offsets(steps: usize) -> impl Iterator<Item = f64> + Clone {
    let steps = steps as i64;
    (-steps..=steps).map(|n| n as f64)
}

/// Score each candidate on its own copy of `model`; first strict minimum wins.
fn search(
    model: &Model,
    index: usize,
    samples: &[Sample],
    criterion: Criterion,
    kind: TunerKind,
    candidates: impl Iterator<Item = (f64, f64)>,
) -> Result<(Model, ErrorMetric)> {
    let mut best_error = ErrorMetric::evaluate(model, samples)?;
    let mut best_score = criterion.score(&best_error);
    let mut best = model.clone();
    let start_score = best_score;

    for (c, s) in candidates {
        let mut candidate = model.clone();
        candidate.set_coefficients(index, c, s)?;
        let error = ErrorMetric::evaluate(&candidate, samples)?;
        let score = criterion.score(&error);
        if score < best_score {
            best = candidate;
            best_error = error;
            best_score = score;
        }
    }

    if best_score < start_score {
        debug!(
            tuner = %kind,
            index,
            from = start_score,
            to = best_score,
            "tuning improved harmonic"
        );
    }
    Ok((best, best_error))
}

/// How [`refine`] alternates the tuners.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TuningPlan {
    pub passes: usize,
    pub radius: f64,
    pub steps: usize,
    pub criterion: Criterion,
    pub variants: Vec<TunerKind>,
}

impl Default for TuningPlan {
    fn default() -> Self {
        Self {
            passes: 3,
            radius: 0.2,
            steps: 4,
            criterion: Criterion::MaxAbsolute,
            variants: TunerKind::ALL.to_vec(),
        }
    }
}

/// Caller-side refinement: for each pass, each harmonic, each variant, keep
/// the tuner's best model. Never worse than its input by `plan.criterion`.
pub fn refine(model: Model, samples: &[Sample], plan: &TuningPlan) -> Result<(Model, ErrorMetric)> {
    let mut error = ErrorMetric::evaluate(&model, samples)?;
    let mut model = model;
    for pass in 0..plan.passes {
        for index in 0..model.len() {
            for kind in &plan.variants {
                let (tuned, tuned_error) = kind.tune(
                    &model,
                    index,
                    plan.radius,
                    plan.steps,
                    samples,
                    plan.criterion,
                )?;
                model = tuned;
                error = tuned_error;
            }
        }
        info!(
            pass = pass + 1,
            score = plan.criterion.score(&error),
            %error,
            "refinement pass"
        );
    }
    Ok((model, error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astro::AstronomicalRates;
    use crate::harmonics::{M0, SA};
    use crate::model::Catalog;
    use crate::samples::synthesize;
    use chrono::{Duration, TimeZone, Utc};

    fn reference() -> Model {
        let mut m = Catalog::N3.model(&AstronomicalRates::uncorrected()).unwrap();
        let (cos, sin) = m.amplitudes_mut();
        cos.copy_from_slice(&[1.5, 1.0, 0.3, 0.2]);
        sin.copy_from_slice(&[0.0, 0.4, -0.2, 0.1]);
        m
    }

    /// Thirty days of hourly samples from the reference model
    fn month() -> Vec<Sample> {
        let start = Utc.with_ymd_and_hms(2021, 3, 1, 0, 0, 0).unwrap();
        synthesize(&reference(), start, start + Duration::days(30), Duration::hours(1)).unwrap()
    }

    fn perturbed() -> Model {
        let mut m = reference();
        m.set_coefficients(1, 0.8, 0.55).unwrap();
        m
    }

    #[test]
    fn test_offsets_order() {
        assert_eq!(offsets(2).collect::<Vec<_>>(), vec![-2.0, -1.0, 0.0, 1.0, 2.0]);
        assert_eq!(offsets(0).collect::<Vec<_>>(), vec![0.0]);
    }

    #[test]
    fn test_tuners_never_regress() {
        let samples = month();
        let model = perturbed();
        let before = ErrorMetric::evaluate(&model, &samples).unwrap();
        for kind in TunerKind::ALL {
            let (_, after) = kind
                .tune(&model, 1, 0.5, 3, &samples, Criterion::MaxAbsolute)
                .unwrap();
            assert!(
                after.max_absolute() <= before.max_absolute(),
                "{kind} regressed"
            );
        }
    }

    #[test]
    fn test_tuners_leave_input_alone() {
        let samples = month();
        let model = perturbed();
        let cos = model.amplitudes_cos().to_vec();
        let sin = model.amplitudes_sin().to_vec();
        for kind in TunerKind::ALL {
            kind.tune(&model, 1, 0.5, 3, &samples, Criterion::MaxAbsolute)
                .unwrap();
            assert_eq!(model.amplitudes_cos(), cos.as_slice());
            assert_eq!(model.amplitudes_sin(), sin.as_slice());
        }
    }

    #[test]
    fn test_zero_steps_is_identity() {
        let samples = month();
        let model = perturbed();
        for kind in TunerKind::ALL {
            let (tuned, error) = kind
                .tune(&model, 1, 0.5, 0, &samples, Criterion::MaxAbsolute)
                .unwrap();
            assert_eq!(tuned.amplitudes_cos(), model.amplitudes_cos());
            assert_eq!(tuned.amplitudes_sin(), model.amplitudes_sin());
            assert_eq!(error, ErrorMetric::evaluate(&model, &samples).unwrap());
        }
    }

    #[test]
    fn test_grid_improves_perturbed_harmonic() {
        let samples = month();
        let model = perturbed();
        let before = ErrorMetric::evaluate(&model, &samples).unwrap();
        let (tuned, after) = tune_grid(&model, 1, 0.5, 4, &samples).unwrap();
        assert!(after.max_absolute() < before.max_absolute());
        let (c, s) = tuned.coefficients(1).unwrap();
        // Closer to (1.0, 0.4) than where it started
        assert!((c - 1.0).hypot(s - 0.4) < (0.8f64 - 1.0).hypot(0.55 - 0.4));
    }

    #[test]
    fn test_exact_model_is_kept() {
        // Nothing beats a perfect fit, so the untouched input wins every tie.
        let samples = month();
        let model = reference();
        for kind in TunerKind::ALL {
            let (tuned, error) = kind
                .tune(&model, 2, 0.3, 2, &samples, Criterion::MaxAbsolute)
                .unwrap();
            assert_eq!(tuned.amplitudes_cos(), model.amplitudes_cos());
            assert_eq!(tuned.amplitudes_sin(), model.amplitudes_sin());
            assert!(error.max_absolute() < 1e-9);
        }
    }

    #[test]
    fn test_amplitude_preserves_phase() {
        let samples = month();
        let mut model = reference();
        model.set_coefficients(1, 0.5, 0.2).unwrap();
        let (tuned, _) = tune_amplitude(&model, 1, 1.0, 4, &samples).unwrap();
        let phase_before = model.phase(1).unwrap();
        let phase_after = tuned.phase(1).unwrap();
        assert!((phase_before - phase_after).abs() < 1e-9);
        assert!(tuned.amplitude(1).unwrap() > model.amplitude(1).unwrap());
    }

    #[test]
    fn test_angular_preserves_amplitude() {
        let samples = month();
        let mut model = reference();
        model.set_coefficients(1, -0.4, -1.0).unwrap();
        let (tuned, _) = tune_angular(&model, 1, 0.5, 4, &samples).unwrap();
        let before = model.amplitude(1).unwrap();
        assert!((tuned.amplitude(1).unwrap() - before).abs() < 1e-9);
    }

    #[test]
    fn test_precondition_errors() {
        let samples = month();
        let model = reference();
        for kind in TunerKind::ALL {
            assert!(matches!(
                kind.tune(&model, 4, 0.5, 2, &samples, Criterion::MaxAbsolute),
                Err(TideError::HarmonicIndex { index: 4, len: 4 })
            ));
            assert!(matches!(
                kind.tune(&model, 0, 0.5, 2, &[], Criterion::MaxAbsolute),
                Err(TideError::EmptySamples)
            ));
        }
    }

    #[test]
    fn test_fourier_empty_leaves_model() {
        let mut model = reference();
        assert!(matches!(
            fourier_transform(&mut model, &[]),
            Err(TideError::EmptySamples)
        ));
        assert_eq!(model.amplitudes_cos(), reference().amplitudes_cos());
    }

    #[test]
    fn test_refine_never_regresses() {
        let samples = month();
        let model = perturbed();
        let before = ErrorMetric::evaluate(&model, &samples).unwrap();
        let plan = TuningPlan {
            passes: 2,
            radius: 0.4,
            steps: 3,
            ..TuningPlan::default()
        };
        let (_, after) = refine(model, &samples, &plan).unwrap();
        assert!(after.max_absolute() < before.max_absolute());
    }

    /// Mean level alone at (1, 0), observed flat at zero. Only the cosine
    /// coefficient moves the residual, so every sine step ties.
    fn mean_level() -> (Model, Vec<Sample>) {
        let mut m = Model::with_harmonics(vec![M0], &AstronomicalRates::uncorrected()).unwrap();
        m.set_coefficients(0, 1.0, 0.0).unwrap();
        let start = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        let samples = (0..6)
            .map(|i| Sample::new(&(start + Duration::hours(i)), 0.0).unwrap())
            .collect();
        (m, samples)
    }

    #[test]
    fn test_grid_first_tie_wins() {
        let (model, samples) = mean_level();
        let (tuned, error) = tune_grid(&model, 0, 0.5, 2, &samples).unwrap();
        assert_eq!(tuned.coefficients(0).unwrap(), (0.5, -0.5));
        assert_eq!(error.max_absolute(), 0.5);
    }

    #[test]
    fn test_amplitude_candidate_scaling() {
        let (model, samples) = mean_level();
        let (tuned, _) = tune_amplitude(&model, 0, 0.5, 2, &samples).unwrap();
        assert_eq!(tuned.coefficients(0).unwrap(), (0.5, 0.0));
    }

    #[test]
    fn test_angular_candidate_rotation() {
        // a0 = atan2(1, 0) = pi/2, best at n = 0: a = 3pi/2
        let (model, samples) = mean_level();
        let (tuned, error) = tune_angular(&model, 0, 0.5, 2, &samples).unwrap();
        let (c, s) = tuned.coefficients(0).unwrap();
        assert!(c.abs() < 1e-12, "{c}");
        assert!((s + 1.0).abs() < 1e-12, "{s}");
        assert!(error.max_absolute() < 1e-12);
    }

    #[test]
    fn test_fourier_scale_only_for_zero_speed() {
        let rates = AstronomicalRates::uncorrected();
        let mut reference = Model::new(vec![M0, SA], &rates, 0.03).unwrap();
        reference.set_coefficients(0, 1.0, 0.0).unwrap();
        reference.set_coefficients(1, 0.5, 0.2).unwrap();
        assert!(reference.speeds()[1] > 0.0 && reference.speeds()[1] < 0.05);

        let start = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let samples = synthesize(&reference, start, end, Duration::hours(3)).unwrap();

        let mut model = Model::new(vec![M0, SA], &rates, 0.03).unwrap();
        fourier_transform(&mut model, &samples).unwrap();
        let (m0, _) = model.coefficients(0).unwrap();
        let (c, s) = model.coefficients(1).unwrap();
        assert!((m0 - 1.0).abs() < 1e-3, "{m0}");
        assert!((c - 0.5).abs() < 1e-3, "{c}");
        assert!((s - 0.2).abs() < 1e-3, "{s}");
    }

    #[test]
    fn test_criteria_rank_differently_shaped_errors() {
        let samples = month();
        let model = perturbed();
        for criterion in [Criterion::MeanAbsolute, Criterion::Variance] {
            let before = criterion.score(&ErrorMetric::evaluate(&model, &samples).unwrap());
            let (_, after) = tune_grid_with(&model, 1, 0.5, 3, &samples, criterion).unwrap();
            assert!(criterion.score(&after) <= before);
        }
    }
}
