//! Per-feature statistics of the training data
//!
//! Spread (for scaling perturbations and distances) and quartiles (for the
//! discretised explanation conditions). Quantiles use linear interpolation
//! between order statistics.

use crate::features::NUM_FEATURES;
use serde::{Deserialize, Serialize};

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    libm::sqrt(var)
}

/// Quantile `q` in [0, 1] of an ascending-sorted slice
///
/// Algorithm:
/// 1. position = q × (n - 1)
/// 2. Bracket between floor(position) and ceil(position)
/// 3. Linear interpolation: lower + fraction × (upper - lower)
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let position = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = position.floor() as usize;
            let upper = position.ceil() as usize;
            let fraction = position - lower as f64;
            sorted[lower] + fraction * (sorted[upper] - sorted[lower])
        }
    }
}

/// Column statistics for all seven features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub mean: [f64; NUM_FEATURES],
    /// Population std; zero-spread columns are stored as 1.0 so they can be
    /// used as a divisor
    pub scale: [f64; NUM_FEATURES],
    /// 25th, 50th, 75th percentiles
    pub quartiles: [[f64; 3]; NUM_FEATURES],
    pub min: [f64; NUM_FEATURES],
    pub max: [f64; NUM_FEATURES],
}

impl FeatureStats {
    pub fn from_rows(rows: &[[f64; NUM_FEATURES]]) -> Self {
        let mut stats = FeatureStats {
            mean: [0.0; NUM_FEATURES],
            scale: [1.0; NUM_FEATURES],
            quartiles: [[0.0; 3]; NUM_FEATURES],
            min: [0.0; NUM_FEATURES],
            max: [0.0; NUM_FEATURES],
        };

        for j in 0..NUM_FEATURES {
            let mut column: Vec<f64> = rows.iter().map(|row| row[j]).collect();
            column.sort_by(|a, b| a.total_cmp(b));

            stats.mean[j] = mean(&column);
            let sd = std_dev(&column);
            stats.scale[j] = if sd > 0.0 { sd } else { 1.0 };
            stats.quartiles[j] = [
                quantile(&column, 0.25),
                quantile(&column, 0.50),
                quantile(&column, 0.75),
            ];
            stats.min[j] = column.first().copied().unwrap_or(0.0);
            stats.max[j] = column.last().copied().unwrap_or(0.0);
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_quantile_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(quantile(&sorted, 0.0), 1.0);
        assert_relative_eq!(quantile(&sorted, 0.25), 1.75, epsilon = 1e-12);
        assert_relative_eq!(quantile(&sorted, 0.5), 2.5, epsilon = 1e-12);
        assert_relative_eq!(quantile(&sorted, 1.0), 4.0);
        assert_relative_eq!(quantile(&[5.0], 0.3), 5.0);
    }

    #[test]
    fn test_std_dev() {
        assert_relative_eq!(std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.0, epsilon = 1e-12);
        assert_relative_eq!(std_dev(&[3.0, 3.0]), 0.0);
    }

    #[test]
    fn test_constant_column_gets_unit_scale() {
        let rows = vec![[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]; 4];
        let stats = FeatureStats::from_rows(&rows);
        assert_eq!(stats.scale, [1.0; NUM_FEATURES]);
        assert_eq!(stats.quartiles[6], [7.0, 7.0, 7.0]);
        assert_eq!(stats.min[0], 1.0);
    }
}
