//! Query records and the metric triple

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The three coherence metrics computed for one query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Alignment (Zeno) score, sigmoid of the embedding norm's fractional part
    pub mu: f64,
    /// Normalized token entropy
    pub entropy: f64,
    /// Population variance of the embedding components
    pub variance: f64,
}

impl Metrics {
    pub fn new(mu: f64, entropy: f64, variance: f64) -> Self {
        Self { mu, entropy, variance }
    }

    /// One-line summary, e.g. `μ=0.5000, H=1.000, Var=0.0000`
    pub fn summary(&self) -> String {
        format!("μ={:.4}, H={:.3}, Var={:.4}", self.mu, self.entropy, self.variance)
    }
}

/// One accepted query and its metrics. Never mutated after creation.
///
/// Serialize-only: `serde_json` writes non-finite metrics as `null`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRecord {
    pub text: String,
    pub mu: f64,
    pub entropy: f64,
    pub variance: f64,
    /// When the record was appended
    pub timestamp: DateTime<Utc>,
}

impl QueryRecord {
    pub fn new(text: impl Into<String>, metrics: Metrics) -> Self {
        Self {
            text: text.into(),
            mu: metrics.mu,
            entropy: metrics.entropy,
            variance: metrics.variance,
            timestamp: Utc::now(),
        }
    }

    pub fn metrics(&self) -> Metrics {
        Metrics::new(self.mu, self.entropy, self.variance)
    }
}

/// Per-metric series over query index, for the trend chart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trends {
    pub mu: Vec<f64>,
    pub entropy: Vec<f64>,
    pub variance: Vec<f64>,
}

impl Trends {
    pub fn len(&self) -> usize {
        self.mu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mu.is_empty()
    }
}
