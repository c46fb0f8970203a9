//! Terminal rendering: scoreboard table, trend sparklines, field heatmap
//!
//! Colors go through `colored`, so `colored::control::set_override(false)`
//! turns all of this into plain text.

use colored::Colorize;

use crate::core::query_log::QueryLog;
use crate::types::{Field, Trends};

const SPARK: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const SHADES: [char; 10] = [' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];
const QUERY_WIDTH: usize = 40;

/// Query scoreboard, one row per record in insertion order
pub fn render_table(log: &QueryLog) -> String {
    let mut out = format!(
        "{}\n",
        format!(
            "{:>3}  {:<width$}  {:>8}  {:>8}  {:>10}",
            "#",
            "Query",
            "μ",
            "Entropy",
            "Variance",
            width = QUERY_WIDTH
        )
        .bold()
    );
    for (i, record) in log.as_table().iter().enumerate() {
        out.push_str(&format!(
            "{:>3}  {:<width$}  {:>8.4}  {:>8.3}  {:>10.6}\n",
            i + 1,
            truncate(&record.text, QUERY_WIDTH),
            record.mu,
            record.entropy,
            record.variance,
            width = QUERY_WIDTH
        ));
    }
    out
}

/// One sparkline per metric over query index
pub fn render_trends(trends: &Trends) -> String {
    format!(
        "{} {}\n{} {}\n{} {}\n",
        "μ       ".cyan(),
        sparkline(&trends.mu),
        "Entropy ".magenta(),
        sparkline(&trends.entropy),
        "Variance".yellow(),
        sparkline(&trends.variance),
    )
}

/// Min-max scaled sparkline; non-finite samples render as `·`
pub fn sparkline(values: &[f64]) -> String {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    values
        .iter()
        .map(|&v| {
            if !v.is_finite() {
                '·'
            } else if hi - lo <= f64::EPSILON {
                SPARK[SPARK.len() / 2]
            } else {
                let t = (v - lo) / (hi - lo);
                SPARK[((t * (SPARK.len() - 1) as f64).round() as usize).min(SPARK.len() - 1)]
            }
        })
        .collect()
}

/// Top-down shaded view of the field, downsampled to at most `max_cols`
/// columns. Rows are printed with +y at the top.
pub fn render_heatmap(field: &Field, max_cols: usize) -> String {
    let n = field.grid_size;
    if n == 0 || max_cols == 0 {
        return String::new();
    }
    let stride = n.div_ceil(max_cols).max(1);
    let mut out = String::new();
    for row in field.z.iter().rev().step_by(stride) {
        for &v in row.iter().step_by(stride) {
            out.push_str(&shade(v));
        }
        out.push('\n');
    }
    out
}

fn shade(v: f64) -> String {
    if v.is_nan() {
        return "?".dimmed().to_string();
    }
    let idx = ((v * SHADES.len() as f64) as usize).min(SHADES.len() - 1);
    let c = SHADES[idx].to_string();
    // plasma-like ramp: indigo → magenta → amber
    let colored = if v < 0.33 {
        c.truecolor(72, 30, 160)
    } else if v < 0.66 {
        c.truecolor(200, 60, 140)
    } else {
        c.truecolor(250, 190, 40)
    };
    colored.to_string()
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut s: String = text.chars().take(width - 1).collect();
        s.push('…');
        s
    }
}
