//! report.rs - Renders the status text posted for a detected change.
//!
//! ```text
//! As of Wednesday, January 3, 2024:
//! 70.0% approve
//! █▁ (-1.0% since Jan 2)
//! 25.0% disapprove
//! ▁█ (+1.0%)
//! https://example.org/approval/
//! ```

use std::fmt::Write as _;

use anyhow::{anyhow, Result};

use crate::parse::Record;
use crate::sources::SourceConfig;

/// Rendered instead of a signed delta when the move rounds to zero.
pub const UNCHANGED: &str = "unchanged";

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Round to one decimal place, halves away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `+0.1%`, `-1.3%`, or `unchanged` when |delta| rounds below 0.1.
pub fn format_delta(delta: f64) -> String {
    let r = round1(delta);
    if r == 0.0 {
        UNCHANGED.to_string()
    } else {
        format!("{r:+.1}%")
    }
}

/// One bar per value, left to right; taller bar means higher value.
pub fn sparkline(values: &[f64]) -> String {
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = hi - lo;

    values
        .iter()
        .map(|v| {
            if range <= f64::EPSILON {
                return BARS[BARS.len() / 2 - 1];
            }
            let step = ((v - lo) / range * (BARS.len() - 1) as f64).round() as usize;
            BARS[step.min(BARS.len() - 1)]
        })
        .collect()
}

fn metric_value(rec: &Record, metric: &str) -> Result<f64> {
    rec.value(metric)
        .ok_or_else(|| anyhow!("record for {} has no value for {metric}", rec.date))
}

/// Build the final message from the newest record, its baseline and the
/// history window (newest first, as built by `history::build_history`).
pub fn render(
    source: &SourceConfig,
    latest: &Record,
    baseline: &Record,
    history: &[Record],
) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "As of {}:", latest.date.format("%A, %B %-d, %Y"))?;

    for (i, m) in source.metrics.iter().enumerate() {
        let now = metric_value(latest, &m.name)?;
        let then = metric_value(baseline, &m.name)?;

        let series = history
            .iter()
            .rev()
            .map(|r| metric_value(r, &m.name))
            .collect::<Result<Vec<_>>>()?;

        writeln!(out, "{} {}", m.format.render(now), m.name)?;
        write!(out, "{} ({}", sparkline(&series), format_delta(now - then))?;
        if i == 0 {
            write!(out, " since {}", baseline.date.format("%b %-d"))?;
        }
        writeln!(out, ")")?;
    }

    out.push_str(&source.link_url);
    Ok(out)
}
