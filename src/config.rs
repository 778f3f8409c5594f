//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! tide-fit.toml file: which astronomical rates to derive, which harmonic
//! catalog to fit, how to tune it and how to chart predictions.

use crate::astro::{AstronomicalRates, RateConfig};
use crate::compute::{TunerKind, TuningPlan};
use crate::error::Result;
use crate::metrics::Criterion;
use crate::model::{Catalog, Model};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "tide-fit.toml";

/// Application configuration loaded from tide-fit.toml
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Astronomical argument speeds
    #[serde(default)]
    pub rates: RateConfig,
    /// Harmonic catalog selection
    #[serde(default)]
    pub model: ModelConfig,
    /// Refinement after the Fourier fit
    #[serde(default)]
    pub tuning: TuningConfig,
    /// ASCII chart window
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Which harmonics make up the fitted model
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Catalog name, "N3" through "N32"
    pub catalog: String,
    /// Overrides the catalog's own minimum speed separation (deg/h)
    pub min_delta: Option<f64>,
}

/// Tuner alternation after the Fourier fit
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct TuningConfig {
    /// Rounds over every harmonic; 0 disables tuning
    pub passes: usize,
    /// Search radius as a fraction of the step base
    pub radius: f64,
    /// Half-width of the integer step range
    pub steps: usize,
    /// What the tuners minimize
    pub criterion: Criterion,
    /// Tuners applied to each harmonic, in order
    pub variants: Vec<TunerKind>,
}

/// Prediction chart configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Time window in hours (shows -window to +window around the centre)
    pub window_hours: i64,
    /// Minutes between plotted samples
    pub step_minutes: i64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            catalog: Catalog::N6.to_string(),
            min_delta: None,
        }
    }
}

impl Default for TuningConfig {
    fn default() -> Self {
        let plan = TuningPlan::default();
        TuningConfig {
            passes: plan.passes,
            radius: plan.radius,
            steps: plan.steps,
            criterion: plan.criterion,
            variants: plan.variants,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            window_hours: 12,
            step_minutes: 10,
        }
    }
}

impl TuningConfig {
    pub fn plan(&self) -> TuningPlan {
        TuningPlan {
            passes: self.passes,
            radius: self.radius,
            steps: self.steps,
            criterion: self.criterion,
            variants: self.variants.clone(),
        }
    }
}

impl ModelConfig {
    pub fn catalog(&self) -> Result<Catalog> {
        self.catalog.parse()
    }

    /// Zeroed model of the configured catalog.
    pub fn build(&self, rates: &AstronomicalRates) -> Result<Model> {
        let catalog = self.catalog()?;
        let min_delta = self.min_delta.unwrap_or_else(|| catalog.min_delta());
        Model::new(catalog.harmonics(), rates, min_delta)
    }
}

impl Config {
    /// Load configuration from tide-fit.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), catalog = %config.model.catalog, "configuration loaded");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), "invalid config file format: {e}");
                    warn!("using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no config file found, using default configuration");
                Self::default()
            }
        }
    }

    /// Save current configuration to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }
}
