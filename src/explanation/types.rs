use crate::explanation::phrasing::{translate_condition, Language};
use crate::features::Feature;
use serde::{Deserialize, Serialize};

/// Whether a feature's local evidence pushes towards or away from the crop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Supports,
    Opposes,
}

impl Direction {
    pub fn from_weight(weight: f64) -> Self {
        if weight > 0.0 {
            Direction::Supports
        } else {
            Direction::Opposes
        }
    }
}

/// One ranked line of an explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureInfluence {
    pub feature: Feature,
    /// Raw condition, e.g. "rainfall > 105.00" or "55.00 < humidity <= 78.00"
    pub condition: String,
    /// Condition in words, e.g. "Rainfall above 105.00"
    pub description: String,
    pub direction: Direction,
    /// |weight|
    pub magnitude: f64,
    /// Signed surrogate coefficient
    pub weight: f64,
}

/// Local surrogate explanation of one prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// Crop whose probability the surrogate approximates
    pub crop: String,
    /// Classifier probability of `crop` at the query point
    pub class_probability: f64,
    /// Sorted by descending magnitude, one entry per feature
    pub influences: Vec<FeatureInfluence>,
    pub intercept: f64,
    /// Surrogate prediction at the query point
    pub local_prediction: f64,
    /// Weighted R² of the surrogate over the neighbourhood
    pub score: f64,
    pub num_samples: usize,
    pub discretized: bool,
    pub language: Language,
}

impl Explanation {
    pub fn top(&self) -> Option<&FeatureInfluence> {
        self.influences.first()
    }

    /// Re-render descriptions in another language
    pub fn localized(&self, language: Language) -> Explanation {
        let mut out = self.clone();
        for influence in out.influences.iter_mut() {
            influence.description = translate_condition(&influence.condition, language);
        }
        out.language = language;
        out
    }

    /// Influences whose direction is `direction`, in rank order
    pub fn with_direction(&self, direction: Direction) -> impl Iterator<Item = &FeatureInfluence> {
        self.influences.iter().filter(move |i| i.direction == direction)
    }
}
