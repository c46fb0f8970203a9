//! Per-submission output

use colored::Colorize;
use serde::Serialize;

use crate::types::{Field, NarrativeOutcome, QueryRecord};

/// Everything one accepted query produced
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    /// Position of the record in the session log (0-based)
    pub index: usize,
    pub record: QueryRecord,
    pub field: Field,
    /// `None` when no narrative service is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<NarrativeOutcome>,
}

impl Submission {
    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let mut out = format!(
            "{} {} {} | {} | {}",
            format!("#{}", self.index + 1).bold(),
            format!("μ={:.4}", self.record.mu).cyan(),
            format!("H={:.3}", self.record.entropy).magenta(),
            format!("Var={:.4}", self.record.variance).yellow(),
            self.field_summary().dimmed(),
        );
        match &self.narrative {
            Some(NarrativeOutcome::Ok { text }) => {
                out.push_str(&format!("\n{} {}", "insight:".green().bold(), text));
            }
            Some(failed) => {
                if let Some(warning) = failed.warning() {
                    out.push_str(&format!("\n{} {}", "⚠".yellow(), warning.yellow()));
                }
            }
            None => {}
        }
        out
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        let mut out = format!(
            "index={} | mu={:.4} | entropy={:.3} | variance={:.4} | {}",
            self.index + 1,
            self.record.mu,
            self.record.entropy,
            self.record.variance,
            self.field_summary()
        );
        match &self.narrative {
            Some(NarrativeOutcome::Ok { text }) => out.push_str(&format!("\ninsight={}", text)),
            Some(NarrativeOutcome::Failed { kind, .. }) => {
                out.push_str(&format!("\nwarning=insight unavailable ({})", kind))
            }
            None => {}
        }
        out
    }

    fn field_summary(&self) -> String {
        match self.field.range() {
            Some((lo, hi)) => format!(
                "field {}x{} z∈[{:.3}, {:.3}] mean {:.3}",
                self.field.grid_size,
                self.field.grid_size,
                lo,
                hi,
                self.field.mean()
            ),
            None => format!("field {}x{} z=NaN", self.field.grid_size, self.field.grid_size),
        }
    }
}
