//! Crop classifier
//!
//! Random forest trained once from the historical records and then shared
//! read-only (`&Classifier` / `Arc<Classifier>`) by every request. Training is
//! deterministic for a given record collection and seed.
//!
//! - `tree`: CART decision tree (Gini, class-distribution leaves)
//! - `forest`: bootstrap ensemble, probability averaging

pub mod tree;
pub mod forest;

pub use forest::RandomForest;
pub use tree::{DecisionTree, TreeConfig};

use crate::config::ForestConfig;
use crate::data::{TrainingRecord, TrainingSet};
use crate::error::{AdvisorError, AdvisorResult};
use crate::features::{FeatureVector, NUM_FEATURES};
use crate::utils::FeatureStats;
use std::collections::BTreeMap;
use std::time::Instant;

/// Predicted crop name, as spelled in the training labels
pub type CropLabel = String;

#[derive(Debug, Clone)]
pub struct Classifier {
    forest: RandomForest,
    /// Sorted, de-duplicated labels; index = class id
    classes: Vec<CropLabel>,
    stats: FeatureStats,
    config: ForestConfig,
}

impl Classifier {
    /// Train with the default forest (100 trees) and the given seed
    pub fn train(records: &[TrainingRecord], seed: u64) -> AdvisorResult<Self> {
        let config = ForestConfig {
            seed,
            ..ForestConfig::default()
        };
        Self::train_with_config(records, &config)
    }

    pub fn from_training_set(set: &TrainingSet, config: &ForestConfig) -> AdvisorResult<Self> {
        Self::train_with_config(set.records(), config)
    }

    pub fn train_with_config(
        records: &[TrainingRecord],
        config: &ForestConfig,
    ) -> AdvisorResult<Self> {
        if records.is_empty() {
            return Err(AdvisorError::validation("cannot train on an empty training set"));
        }
        if config.n_estimators == 0 {
            return Err(AdvisorError::validation("forest needs at least one tree"));
        }

        let mut rows = Vec::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            if record.label.trim().is_empty() {
                return Err(AdvisorError::validation(format!(
                    "training record {} has no label",
                    idx
                )));
            }
            record.features.validate()?;
            rows.push(record.features.to_array());
        }

        let mut classes: Vec<CropLabel> = records.iter().map(|r| r.label.trim().to_string()).collect();
        classes.sort();
        classes.dedup();

        let labels: Vec<usize> = records
            .iter()
            .map(|r| {
                classes
                    .binary_search_by(|c| c.as_str().cmp(r.label.trim()))
                    .unwrap_or_default()
            })
            .collect();

        let start = Instant::now();
        let forest = RandomForest::fit(&rows, &labels, classes.len(), config);
        tracing::info!(
            "Trained random forest: {} trees, {} records, {} classes in {:?}",
            forest.n_trees(),
            rows.len(),
            classes.len(),
            start.elapsed()
        );

        Ok(Self {
            forest,
            classes,
            stats: FeatureStats::from_rows(&rows),
            config: config.clone(),
        })
    }

    /// Most probable crop for `v`
    pub fn predict(&self, v: &FeatureVector) -> AdvisorResult<CropLabel> {
        v.validate()?;
        let probabilities = self.forest.predict_proba(&v.to_array());
        Ok(self.classes[argmax(&probabilities)].clone())
    }

    /// Class probabilities for `v`, keyed by crop label
    pub fn predict_probabilities(&self, v: &FeatureVector) -> AdvisorResult<BTreeMap<CropLabel, f64>> {
        v.validate()?;
        let probabilities = self.forest.predict_proba(&v.to_array());
        Ok(self
            .classes
            .iter()
            .cloned()
            .zip(probabilities)
            .collect())
    }

    /// Probability rows for raw (unvalidated) feature arrays, in class order
    pub fn predict_proba_batch(&self, rows: &[[f64; NUM_FEATURES]]) -> Vec<Vec<f64>> {
        self.forest.predict_proba_batch(rows)
    }

    pub fn classes(&self) -> &[CropLabel] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn class_index(&self, label: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == label)
    }

    /// Spread and quartiles of the training features
    pub fn feature_stats(&self) -> &FeatureStats {
        &self.stats
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }
}

/// Index of the largest value; ties go to the lowest index
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<TrainingRecord> {
        let mut out = Vec::new();
        for i in 0..15 {
            let d = i as f64;
            out.push(TrainingRecord::new(
                FeatureVector::new(80.0 + d, 45.0, 40.0, 24.0, 82.0 + d * 0.2, 6.4, 200.0 + d * 4.0),
                "rice",
            ));
            out.push(TrainingRecord::new(
                FeatureVector::new(40.0 + d, 67.0, 80.0, 18.0, 16.0 + d * 0.2, 7.2, 80.0 + d),
                "chickpea",
            ));
        }
        out
    }

    #[test]
    fn test_predict_and_probabilities() {
        let clf = Classifier::train(&records(), 42).unwrap();
        assert_eq!(clf.classes(), &["chickpea".to_string(), "rice".to_string()]);

        let wet = FeatureVector::new(85.0, 45.0, 40.0, 24.0, 84.0, 6.4, 220.0);
        assert_eq!(clf.predict(&wet).unwrap(), "rice");

        let probs = clf.predict_probabilities(&wet).unwrap();
        assert_eq!(probs.len(), 2);
        assert!((probs.values().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(probs["rice"] > probs["chickpea"]);
    }

    #[test]
    fn test_empty_training_set() {
        let err = Classifier::train(&[], 42).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_missing_label() {
        let mut recs = records();
        recs[3].label = String::new();
        assert!(Classifier::train(&recs, 42).unwrap_err().is_validation());
    }

    #[test]
    fn test_non_finite_query_rejected_out_of_range_accepted() {
        let clf = Classifier::train(&records(), 42).unwrap();
        let bad = FeatureVector::new(f64::NAN, 45.0, 40.0, 24.0, 84.0, 6.4, 220.0);
        assert!(clf.predict(&bad).unwrap_err().is_validation());

        let extreme = FeatureVector::new(900.0, 45.0, 40.0, 24.0, 99.0, 6.4, 5000.0);
        assert!(clf.predict(&extreme).is_ok());
    }

    #[test]
    fn test_training_is_deterministic() {
        let a = Classifier::train(&records(), 9).unwrap();
        let b = Classifier::train(&records(), 9).unwrap();
        let query = FeatureVector::new(60.0, 55.0, 60.0, 21.0, 50.0, 6.8, 140.0);
        assert_eq!(
            a.predict_probabilities(&query).unwrap(),
            b.predict_probabilities(&query).unwrap()
        );
    }

    #[test]
    fn test_argmax_ties_pick_first() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), 1);
        assert_eq!(argmax(&[0.5]), 0);
    }
}
