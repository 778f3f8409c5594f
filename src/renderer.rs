//! # Prediction Chart Rendering
//!
//! Renders predicted heights around a centre instant as an ASCII chart, the
//! development view of a fitted model.

use crate::config::DisplayConfig;
use crate::error::Result;
use crate::model::Model;
use chrono::{DateTime, Duration, Utc};

const ROWS: usize = 24;
const Y_AXIS_WIDTH: usize = 6; // Space for Y-axis labels

/// Predicted height at a time relative to the chart centre.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChartPoint {
    /// Minutes relative to the centre, negative in the past
    pub mins_rel: i64,
    /// Predicted height
    pub height: f64,
}

/// Predict `-window..=+window` hours around `center`, every `step_minutes`.
pub fn predict_window(
    model: &Model,
    center: DateTime<Utc>,
    display: &DisplayConfig,
) -> Result<Vec<ChartPoint>> {
    let window = display.window_hours * 60;
    let step = display.step_minutes.max(1) as usize;
    (-window..=window)
        .step_by(step)
        .map(|mins_rel| {
            let t = center + Duration::minutes(mins_rel);
            Ok(ChartPoint {
                mins_rel,
                height: model.height(&t)?,
            })
        })
        .collect()
}

/// Draw `points` into text rows, with an `X` at the centre column.
pub fn render_ascii(points: &[ChartPoint], window_hours: i64) -> String {
    let sample_count = points.len();
    if sample_count == 0 {
        return String::new();
    }

    let (min_height, max_height) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), p| {
            (min.min(p.height), max.max(p.height))
        });
    let range = (max_height - min_height).max(f64::EPSILON);

    let height_to_row = |height: f64| {
        let normalized = (height - min_height) / range;
        (((1.0 - normalized) * (ROWS as f64 - 1.0)).round() as usize).min(ROWS - 1)
    };

    let mut grid = vec![vec![' '; sample_count + Y_AXIS_WIDTH]; ROWS];

    // Y-axis labels on a round step, at most one per row
    if min_height.is_finite() && max_height.is_finite() {
        let round_step = if range > 4.0 { 1.0 } else if range > 1.0 { 0.5 } else { 0.1 };
        let per_row = range / ROWS as f64;
        let height_step = if per_row > round_step { per_row.ceil() } else { round_step };
        let first = (min_height / height_step).ceil();
        for k in 0..=ROWS {
            let label_height = (first + k as f64) * height_step;
            if label_height > max_height {
                break;
            }
            let row = height_to_row(label_height);
            let label = format!("{:<width$.1}", label_height, width = Y_AXIS_WIDTH - 1);
            for (i, ch) in label.chars().take(Y_AXIS_WIDTH - 1).enumerate() {
                grid[row][i] = ch;
            }
            grid[row][Y_AXIS_WIDTH - 1] = '│';
        }
    }

    // Centre of the window is "now"
    let center_index = sample_count / 2;
    for (column, point) in points.iter().enumerate() {
        let row = height_to_row(point.height);
        grid[row][column + Y_AXIS_WIDTH] = if column == center_index { 'X' } else { '•' };
    }

    let mut out = String::new();
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }

    let padding = " ".repeat(Y_AXIS_WIDTH);
    let time_markers: String = (0..sample_count)
        .map(|i| if i % 6 == 0 { '|' } else { ' ' })
        .collect();
    out.push_str(&format!("{}{}\n", padding, time_markers.trim_end()));

    let now_text = "Now";
    let left = format!("-{window_hours}h");
    let right = format!("+{window_hours}h");
    let now_offset = now_text.len() / 2;
    let left_width = center_index.saturating_sub(now_offset);
    let right_width = sample_count.saturating_sub(center_index + now_text.len() - now_offset);
    out.push_str(&format!(
        "{}{:<lw$}{}{:>rw$}\n",
        padding,
        left,
        now_text,
        right,
        lw = left_width,
        rw = right_width
    ));
    out
}

/// Print the chart to stdout.
pub fn draw_ascii(points: &[ChartPoint], window_hours: i64) {
    print!("{}", render_ascii(points, window_hours));
}
