//! Field surface types

use serde::{Deserialize, Serialize};

/// Which metric channels are overlaid into the field bias term.
/// μ always contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelOverlay {
    pub entropy: bool,
    pub variance: bool,
}

impl Default for ChannelOverlay {
    fn default() -> Self {
        Self::all()
    }
}

impl ChannelOverlay {
    pub fn all() -> Self {
        Self { entropy: true, variance: true }
    }

    pub fn mu_only() -> Self {
        Self { entropy: false, variance: false }
    }
}

/// A `grid_size × grid_size` sampling of the square domain.
///
/// Row `i` holds `y[i]`, column `j` holds `x[j]`, so `x[i][j]` varies
/// along columns and `y[i][j]` along rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub grid_size: usize,
    pub x: Vec<Vec<f64>>,
    pub y: Vec<Vec<f64>>,
    pub z: Vec<Vec<f64>>,
}

impl Field {
    /// Iterate all Z samples row by row
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.z.iter().flat_map(|row| row.iter().copied())
    }

    /// (min, max) of Z, ignoring NaN. `None` when no finite sample exists.
    pub fn range(&self) -> Option<(f64, f64)> {
        self.values()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Mean of Z, NaN if any sample is NaN
    pub fn mean(&self) -> f64 {
        let n = self.grid_size * self.grid_size;
        if n == 0 {
            return f64::NAN;
        }
        self.values().sum::<f64>() / n as f64
    }
}
