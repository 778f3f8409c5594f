//! # Error Types
//!
//! Every fallible operation in the library returns [`TideError`]. Harmonic
//! construction problems have their own [`HarmonicError`] so callers that
//! only build catalogs can match on them directly.

use std::io;
use thiserror::Error;

/// Malformed Doodson numbers or a harmonic list that violates the model's
/// frequency separation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HarmonicError {
    /// Doodson arrays always carry exactly six numbers
    #[error("Doodson array of numbers is wrong length: {0}")]
    WrongLength(usize),

    /// The first Doodson number multiplies tau and cannot be negative
    #[error("Doodson s number is negative: {0}")]
    NegativeSpeedNumber(i32),

    /// A packed Doodson number whose first digit group does not fit an `i32`
    #[error("Doodson number out of range: {0}")]
    NumberOutOfRange(i64),

    /// Numbers n1..n5 must lie in [-5, 5)
    #[error("Doodson value out of bounds: n{index}={value}")]
    OutOfBounds { index: usize, value: i32 },

    /// Two harmonics of a model rotate at nearly the same speed
    #[error(
        "harmonics {first} and {second} are {delta:.7} deg/h apart (minimum {min_delta} deg/h)"
    )]
    TooClose {
        first: String,
        second: String,
        delta: f64,
        min_delta: f64,
    },
}

/// Errors raised while building, fitting, tuning or persisting a model.
#[derive(Error, Debug)]
pub enum TideError {
    /// Invalid harmonic or harmonic list
    #[error("harmonic error: {0}")]
    Harmonic(#[from] HarmonicError),

    /// A time value without timezone/offset information
    #[error("timestamp is not timezone aware: {0}")]
    NaiveTimestamp(String),

    /// A time value that could not be parsed at all
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Tuner asked for a harmonic the model does not have
    #[error("harmonic index {index} out of range for model of {len} harmonics")]
    HarmonicIndex { index: usize, len: usize },

    /// Error statistics and Fourier sums are undefined over zero samples
    #[error("sample set is empty")]
    EmptySamples,

    /// Name lookup in the constituent catalog failed
    #[error("unknown harmonic: {0}")]
    UnknownHarmonic(String),

    /// Name lookup in the model catalogs failed
    #[error("unknown model catalog: {0}")]
    UnknownCatalog(String),

    /// A persisted model whose arrays do not line up
    #[error("model record is inconsistent: {0}")]
    Record(String),

    /// A sample file line that could not be turned into a sample
    #[error("line {line}: {reason}")]
    Line { line: u64, reason: String },

    /// File operations failed
    #[error("IO: {0}")]
    Io(#[from] io::Error),

    /// Model (de)serialization failed
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Sample file could not be read as CSV
    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Library-wide result alias.
pub type Result<T> = std::result::Result<T, TideError>;
