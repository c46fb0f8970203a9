//! MetricExtractor: query text + embedding → (μ, H, σ²)
//!
//! All three functions are pure apart from the tokenizer call. Degenerate
//! inputs are not special-cased: whatever IEEE-754 produces is returned.

use crate::core::tokenizer::Tokenizer;
use crate::types::{Metrics, ZenomeResult};
use crate::ENTROPY_EPSILON;

/// Logistic function 1 / (1 + e^-x)
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Euclidean norm
pub fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Alignment μ = sigmoid(‖e‖ mod 1).
///
/// The fractional part lies in [0, 1), so μ lies in [0.5, 0.7311).
pub fn compute_alignment(embedding: &[f64]) -> f64 {
    sigmoid(l2_norm(embedding) % 1.0)
}

/// Population variance of the components. Empty input yields NaN.
pub fn compute_variance(embedding: &[f64]) -> f64 {
    let n = embedding.len() as f64;
    let mean = embedding.iter().sum::<f64>() / n;
    embedding.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n
}

/// Shannon entropy (nats) of the token-ID histogram, divided by
/// ln(token_count + ε).
///
/// Bins are indexed by raw token ID, so the histogram spans
/// `max(id) + 1` slots; empty bins are skipped.
pub fn entropy_from_tokens(tokens: &[u32]) -> f64 {
    let total = tokens.len();
    let mut counts = vec![0u64; tokens.iter().max().map_or(0, |&m| m as usize + 1)];
    for &id in tokens {
        counts[id as usize] += 1;
    }

    let entropy: f64 = -counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total as f64;
            p * p.ln()
        })
        .sum::<f64>();

    entropy / (total as f64 + ENTROPY_EPSILON).ln()
}

/// Tokenize `text` and compute its normalized token entropy
pub fn compute_token_entropy(text: &str, tokenizer: &dyn Tokenizer) -> ZenomeResult<f64> {
    let tokens = tokenizer.tokenize(text)?;
    Ok(entropy_from_tokens(&tokens))
}

impl Metrics {
    /// Compute all three metrics for one query
    pub fn extract(text: &str, embedding: &[f64], tokenizer: &dyn Tokenizer) -> ZenomeResult<Self> {
        Ok(Self {
            mu: compute_alignment(embedding),
            entropy: compute_token_entropy(text, tokenizer)?,
            variance: compute_variance(embedding),
        })
    }
}
