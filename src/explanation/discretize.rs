//! Quartile discretisation of the feature space
//!
//! Each feature's training quartiles (q1, q2, q3) cut its axis into four bins.
//! The query's bin becomes the explanation condition, and the surrogate
//! regresses on "perturbed value lies in the query's bin" indicators.

use crate::features::{Feature, NUM_FEATURES};
use crate::utils::FeatureStats;
use serde::{Deserialize, Serialize};

/// A threshold condition on one feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// feature <= threshold
    AtMost(f64),
    /// low < feature <= high
    Between(f64, f64),
    /// feature > threshold
    Above(f64),
    /// feature = value (continuous surrogate, no binning)
    Equals(f64),
}

impl Condition {
    /// Comparator string in the classic tabular-explainer layout, two decimals
    pub fn render(&self, feature: Feature) -> String {
        let code = feature.code();
        match *self {
            Condition::AtMost(t) => format!("{} <= {:.2}", code, t),
            Condition::Between(lo, hi) => format!("{:.2} < {} <= {:.2}", lo, code, hi),
            Condition::Above(t) => format!("{} > {:.2}", code, t),
            Condition::Equals(v) => format!("{} = {:.2}", code, v),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuartileDiscretizer {
    quartiles: [[f64; 3]; NUM_FEATURES],
}

impl QuartileDiscretizer {
    pub fn new(stats: &FeatureStats) -> Self {
        Self {
            quartiles: stats.quartiles,
        }
    }

    /// Bin 0..=3 of `value` on `feature`'s axis
    pub fn bin(&self, feature: Feature, value: f64) -> usize {
        let q = &self.quartiles[feature.index()];
        q.iter().take_while(|&&cut| value > cut).count()
    }

    pub fn condition(&self, feature: Feature, bin: usize) -> Condition {
        let [q1, q2, q3] = self.quartiles[feature.index()];
        match bin {
            0 => Condition::AtMost(q1),
            1 => Condition::Between(q1, q2),
            2 => Condition::Between(q2, q3),
            _ => Condition::Above(q3),
        }
    }

    /// Condition describing the bin that holds `value`
    pub fn condition_for(&self, feature: Feature, value: f64) -> Condition {
        self.condition(feature, self.bin(feature, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discretizer() -> QuartileDiscretizer {
        let rows: Vec<[f64; NUM_FEATURES]> = (0..=100)
            .map(|i| {
                let v = i as f64;
                [v, v, v, v, v, v, v * 3.0]
            })
            .collect();
        QuartileDiscretizer::new(&FeatureStats::from_rows(&rows))
    }

    #[test]
    fn test_bins() {
        let d = discretizer();
        assert_eq!(d.bin(Feature::Humidity, 10.0), 0);
        assert_eq!(d.bin(Feature::Humidity, 25.0), 0);
        assert_eq!(d.bin(Feature::Humidity, 25.1), 1);
        assert_eq!(d.bin(Feature::Humidity, 60.0), 2);
        assert_eq!(d.bin(Feature::Humidity, 99.0), 3);
    }

    #[test]
    fn test_condition_rendering() {
        let d = discretizer();
        assert_eq!(
            d.condition_for(Feature::Rainfall, 280.0).render(Feature::Rainfall),
            "rainfall > 225.00"
        );
        assert_eq!(
            d.condition_for(Feature::Humidity, 30.0).render(Feature::Humidity),
            "25.00 < humidity <= 50.00"
        );
        assert_eq!(
            d.condition_for(Feature::Nitrogen, 3.0).render(Feature::Nitrogen),
            "N <= 25.00"
        );
        assert_eq!(Condition::Equals(6.5).render(Feature::Ph), "ph = 6.50");
    }
}
