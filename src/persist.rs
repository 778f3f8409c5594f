//! # Model Persistence
//!
//! Fitted models are stored as JSON. Coefficients survive the round trip bit
//! for bit (`serde_json` is built with `float_roundtrip`), and the harmonic
//! list is validated again on load.

use crate::error::Result;
use crate::model::Model;
use std::fs;
use std::path::Path;
use tracing::info;

/// Serialize `model` to bytes.
pub fn to_bytes(model: &Model) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(model)?)
}

/// Rebuild a model from [`to_bytes`] output.
pub fn from_bytes(data: &[u8]) -> Result<Model> {
    Ok(serde_json::from_slice(data)?)
}

pub fn save<P: AsRef<Path>>(model: &Model, path: P) -> Result<()> {
    fs::write(&path, to_bytes(model)?)?;
    info!(path = %path.as_ref().display(), harmonics = model.len(), "model saved");
    Ok(())
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<Model> {
    let model = from_bytes(&fs::read(&path)?)?;
    info!(path = %path.as_ref().display(), harmonics = model.len(), "model loaded");
    Ok(model)
}
