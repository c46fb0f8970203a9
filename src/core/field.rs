//! FieldGenerator: (μ, H, σ²) → Zeno field surface
//!
//! Z = sigmoid(sin(3R) + cos(2X)·sin(2Y) + bias), R = √(X² + Y²)
//! bias = 4(μ-0.5) + 2(H-0.5) + 3(σ²-0.1)
//!
//! Pure function of its inputs: no randomness, no cached state.

use crate::core::metrics::sigmoid;
use crate::types::{ChannelOverlay, Field, Metrics};
use crate::{
    FIELD_CENTER_ENTROPY, FIELD_CENTER_MU, FIELD_CENTER_VARIANCE, FIELD_DOMAIN_MAX,
    FIELD_DOMAIN_MIN, FIELD_WEIGHT_ENTROPY, FIELD_WEIGHT_MU, FIELD_WEIGHT_VARIANCE,
};

/// Smallest value the field may take
const Z_FLOOR: f64 = f64::MIN_POSITIVE;
/// Largest f64 strictly below 1.0
const Z_CEIL: f64 = 1.0 - f64::EPSILON / 2.0;

/// `n` evenly spaced samples over `[start, stop]`, endpoints included
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|k| if k == n - 1 { stop } else { start + k as f64 * step })
                .collect()
        }
    }
}

/// Base ripple pattern sin(3R) + cos(2x)·sin(2y), range roughly [-2, 2]
pub fn ripple(x: f64, y: f64) -> f64 {
    let r = (x * x + y * y).sqrt();
    (3.0 * r).sin() + (2.0 * x).cos() * (2.0 * y).sin()
}

/// Generates field surfaces with a fixed set of overlaid channels
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldGenerator {
    overlay: ChannelOverlay,
}

impl FieldGenerator {
    /// Generator with every channel overlaid
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overlay(overlay: ChannelOverlay) -> Self {
        Self { overlay }
    }

    /// Metric offset added to the ripple before squashing
    pub fn bias(&self, metrics: &Metrics) -> f64 {
        let mut bias = FIELD_WEIGHT_MU * (metrics.mu - FIELD_CENTER_MU);
        if self.overlay.entropy {
            bias += FIELD_WEIGHT_ENTROPY * (metrics.entropy - FIELD_CENTER_ENTROPY);
        }
        if self.overlay.variance {
            bias += FIELD_WEIGHT_VARIANCE * (metrics.variance - FIELD_CENTER_VARIANCE);
        }
        bias
    }

    /// Sample the surface on a `grid_size × grid_size` grid over [-2, 2]²
    pub fn generate(&self, metrics: &Metrics, grid_size: usize) -> Field {
        let axis = linspace(FIELD_DOMAIN_MIN, FIELD_DOMAIN_MAX, grid_size);
        let bias = self.bias(metrics);

        let mut x = Vec::with_capacity(grid_size);
        let mut y = Vec::with_capacity(grid_size);
        let mut z = Vec::with_capacity(grid_size);

        for &yi in &axis {
            x.push(axis.clone());
            y.push(vec![yi; grid_size]);
            z.push(
                axis.iter()
                    .map(|&xj| squash(ripple(xj, yi) + bias))
                    .collect(),
            );
        }

        Field { grid_size, x, y, z }
    }
}

/// Convenience: all channels overlaid
pub fn generate_field(mu: f64, entropy: f64, variance: f64, grid_size: usize) -> Field {
    FieldGenerator::new().generate(&Metrics::new(mu, entropy, variance), grid_size)
}

/// Logistic squash pinned inside the open interval (0, 1). NaN passes through.
fn squash(t: f64) -> f64 {
    sigmoid(t).clamp(Z_FLOOR, Z_CEIL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn all_strictly_inside(field: &Field) -> bool {
        field.values().all(|v| v > 0.0 && v < 1.0)
    }

    #[test]
    fn test_linspace_endpoints() {
        let xs = linspace(-2.0, 2.0, 5);
        assert_eq!(xs, vec![-2.0, -1.0, 0.0, 1.0, 2.0]);
        assert_eq!(linspace(-2.0, 2.0, 1), vec![-2.0]);
        assert!(linspace(-2.0, 2.0, 0).is_empty());
    }

    #[test]
    fn test_grid_shape_and_coordinates() {
        let field = generate_field(0.5, 1.0, 0.0, 40);
        assert_eq!(field.grid_size, 40);
        assert_eq!(field.z.len(), 40);
        assert!(field.z.iter().all(|row| row.len() == 40));
        // x varies along columns, y along rows
        assert_eq!(field.x[0][0], -2.0);
        assert_eq!(field.x[0][39], 2.0);
        assert_eq!(field.x[17][39], 2.0);
        assert_eq!(field.y[0][39], -2.0);
        assert_eq!(field.y[39][0], 2.0);
    }

    #[test]
    fn test_deterministic() {
        let a = generate_field(0.61, 0.87, 0.0007, 50);
        let b = generate_field(0.61, 0.87, 0.0007, 50);
        assert_eq!(a, b);
    }

    #[test]
    fn test_values_inside_unit_interval() {
        let cases = [
            (0.5, 1.0, 0.0),
            (0.73, 0.0, 0.0),
            (1e12, 1e12, 1e12),
            (-1e12, -1e12, -1e12),
            (0.5, f64::MAX, 0.0),
            (0.5, 0.0, f64::MIN),
        ];
        for (mu, h, var) in cases {
            let field = generate_field(mu, h, var, 20);
            assert!(all_strictly_inside(&field), "out of (0,1) for {:?}", (mu, h, var));
        }
    }

    #[test]
    fn test_monotone_in_each_metric() {
        let base = generate_field(0.55, 0.9, 0.001, 30);
        let more_mu = generate_field(0.65, 0.9, 0.001, 30);
        let more_h = generate_field(0.55, 1.1, 0.001, 30);
        let more_var = generate_field(0.55, 0.9, 0.2, 30);
        for other in [&more_mu, &more_h, &more_var] {
            for (a, b) in base.values().zip(other.values()) {
                assert!(b > a, "expected {} > {}", b, a);
            }
        }
    }

    #[test]
    fn test_canonical_bias() {
        let gen = FieldGenerator::new();
        let bias = gen.bias(&Metrics::new(0.5, 0.5, 0.1));
        assert_eq!(bias, 0.0);
        let bias = gen.bias(&Metrics::new(0.75, 1.0, 0.2));
        assert!((bias - (4.0 * 0.25 + 2.0 * 0.5 + 3.0 * 0.1)).abs() < 1e-12);
    }

    #[test]
    fn test_origin_value() {
        // ripple(0, 0) = 0, so Z(0,0) = sigmoid(bias)
        let field = generate_field(0.5, 0.5, 0.1, 5);
        assert_eq!(field.z[2][2], 0.5);
    }

    #[test]
    fn test_disabled_channels_ignore_metric() {
        let gen = FieldGenerator::with_overlay(ChannelOverlay::mu_only());
        let a = gen.generate(&Metrics::new(0.6, 0.1, 0.0), 16);
        let b = gen.generate(&Metrics::new(0.6, 5.0, 9.0), 16);
        assert_eq!(a, b);
    }

    #[test]
    fn test_partial_overlay() {
        let entropy_only = FieldGenerator::with_overlay(ChannelOverlay {
            entropy: true,
            variance: false,
        });
        let m = Metrics::new(0.5, 1.5, 3.0);
        assert!((entropy_only.bias(&m) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_nan_propagates() {
        let field = generate_field(0.5, f64::NAN, 0.0, 4);
        assert!(field.values().all(f64::is_nan));
        assert!(field.range().is_none());
    }
}
