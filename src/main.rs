//! # Tide Fit Application Entry Point
//!
//! Command-line front end for the harmonic tide model: fit a model from a
//! sample file, chart its predictions, or list the constituent catalog.
//! Logs go to stderr (`RUST_LOG`, default `info`); charts and tables go to
//! stdout.

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use tide_fit_lib::astro::AstronomicalRates;
use tide_fit_lib::compute::{fourier_transform, refine};
use tide_fit_lib::config::Config;
use tide_fit_lib::harmonics::CATALOG;
use tide_fit_lib::renderer::{draw_ascii, predict_window};
use tide_fit_lib::{persist, samples, time};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "tide-fit", version, about = "Harmonic tide model fitting")]
struct Cli {
    /// Configuration file (defaults to ./tide-fit.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit the configured catalog to a CSV of timestamp,height samples
    Fit {
        /// Sample file
        #[arg(long)]
        samples: PathBuf,
        /// Where to write the fitted model
        #[arg(long)]
        output: PathBuf,
    },
    /// Chart the predictions of a saved model
    Predict {
        /// Saved model
        #[arg(long)]
        model: PathBuf,
        /// Chart centre, RFC 3339 (defaults to now)
        #[arg(long)]
        at: Option<String>,
    },
    /// List every named constituent and its speed under the configured rates
    Catalog {
        /// Apply the second-order time correction even if the config does not
        #[arg(long)]
        time_correction: bool,
    },
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_writer(io::stderr).with_env_filter(filter).init();

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };

    match cli.command {
        Command::Fit { samples, output } => fit(&config, &samples, &output),
        Command::Predict { model, at } => predict(&config, &model, at.as_deref()),
        Command::Catalog { time_correction } => {
            catalog(&config, time_correction);
            Ok(())
        }
    }
}

fn fit(config: &Config, samples_path: &Path, output: &Path) -> anyhow::Result<()> {
    let samples = samples::read_csv(samples_path)
        .with_context(|| format!("reading samples from {}", samples_path.display()))?;
    let rates = AstronomicalRates::new(&config.rates);
    let mut model = config
        .model
        .build(&rates)
        .context("building catalog model")?;

    let fourier_error = fourier_transform(&mut model, &samples).context("fourier fit")?;
    println!("fourier: {fourier_error}");

    let plan = config.tuning.plan();
    let (model, error) = refine(model, &samples, &plan).context("tuning")?;
    if plan.passes > 0 {
        println!("tuned:   {error}");
    }

    print!("{model}");
    persist::save(&model, output)
        .with_context(|| format!("saving model to {}", output.display()))?;
    info!(output = %output.display(), "fit complete");
    Ok(())
}

fn predict(config: &Config, model_path: &Path, at: Option<&str>) -> anyhow::Result<()> {
    let model = persist::load(model_path)
        .with_context(|| format!("loading model from {}", model_path.display()))?;
    let center: DateTime<Utc> = match at {
        Some(text) => time::parse_aware(text)
            .with_context(|| format!("parsing --at {text}"))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    let points = predict_window(&model, center, &config.display)?;
    draw_ascii(&points, config.display.window_hours);
    Ok(())
}

fn catalog(config: &Config, time_correction: bool) {
    let rates = AstronomicalRates::new(&config.rates.forcing_correction(time_correction));
    println!("{:<12} {:<10} {:>14}", "name", "doodson", "speed (deg/h)");
    for (name, harmonic) in CATALOG {
        let digits: String = harmonic.to_string().chars().take(7).collect();
        println!(
            "{:<12} {:<10} {:>14.7}",
            name,
            digits,
            harmonic.speed(&rates)
        );
    }
}
