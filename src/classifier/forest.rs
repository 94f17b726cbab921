//! Random forest of CART trees
//!
//! Each tree gets its own bootstrap draw and its own RNG seeded with
//! `seed + tree_index`, so trees can be grown in parallel with Rayon and the
//! forest is still identical run to run.

use crate::classifier::tree::{DecisionTree, TreeConfig};
use crate::config::ForestConfig;
use crate::features::NUM_FEATURES;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_classes: usize,
}

impl RandomForest {
    /// Fit `config.n_estimators` trees on bootstrap samples of `rows`
    ///
    /// `labels[i]` is the class index of `rows[i]`, in `0..n_classes`.
    pub fn fit(
        rows: &[[f64; NUM_FEATURES]],
        labels: &[usize],
        n_classes: usize,
        config: &ForestConfig,
    ) -> Self {
        let tree_config = TreeConfig {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            // sqrt(7) rounds down to 2 candidate features per split
            max_features: ((NUM_FEATURES as f64).sqrt() as usize).max(1),
        };
        let n = rows.len();

        let trees = (0..config.n_estimators)
            .into_par_iter()
            .map(|tree_index| {
                let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(tree_index as u64));
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::fit(rows, labels, bootstrap, n_classes, tree_config, &mut rng)
            })
            .collect();

        Self { trees, n_classes }
    }

    /// Mean of the per-tree leaf distributions
    pub fn predict_proba(&self, x: &[f64; NUM_FEATURES]) -> Vec<f64> {
        let mut probabilities = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (total, p) in probabilities.iter_mut().zip(tree.predict_distribution(x)) {
                *total += p;
            }
        }
        let n_trees = self.trees.len().max(1) as f64;
        for p in probabilities.iter_mut() {
            *p /= n_trees;
        }
        probabilities
    }

    /// Probabilities for many rows at once (parallel, order preserved)
    pub fn predict_proba_batch(&self, rows: &[[f64; NUM_FEATURES]]) -> Vec<Vec<f64>> {
        rows.par_iter().map(|x| self.predict_proba(x)).collect()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn toy() -> (Vec<[f64; NUM_FEATURES]>, Vec<usize>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            let jitter = i as f64 * 0.1;
            rows.push([1.0 + jitter, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
            labels.push(0);
            rows.push([10.0 + jitter, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
            labels.push(1);
        }
        (rows, labels)
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (rows, labels) = toy();
        let config = ForestConfig {
            n_estimators: 15,
            ..ForestConfig::default()
        };
        let forest = RandomForest::fit(&rows, &labels, 2, &config);
        assert_eq!(forest.n_trees(), 15);

        let p = forest.predict_proba(&[1.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_relative_eq!(p.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        assert!(p[0] > 0.9);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (rows, labels) = toy();
        let config = ForestConfig {
            n_estimators: 10,
            seed: 7,
            ..ForestConfig::default()
        };
        let a = RandomForest::fit(&rows, &labels, 2, &config);
        let b = RandomForest::fit(&rows, &labels, 2, &config);

        let queries: Vec<[f64; NUM_FEATURES]> = (0..30)
            .map(|i| [i as f64 * 0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])
            .collect();
        assert_eq!(a.predict_proba_batch(&queries), b.predict_proba_batch(&queries));
    }
}
