//! CART decision tree
//!
//! Gini impurity, midpoint thresholds, a random subset of candidate features
//! per split. Trees are grown until pure (or until depth / min-samples limits)
//! and leaves keep the full class distribution so the forest can average
//! probabilities instead of votes.

use crate::features::NUM_FEATURES;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy)]
pub struct TreeConfig {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Candidate features examined per split
    pub max_features: usize,
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        distribution: Vec<f64>,
    },
}

/// Best split found for a node
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// Σ c²/n over both children (higher = purer)
    purity: f64,
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_classes: usize,
}

impl DecisionTree {
    /// Grow a tree on `sample_indices` (a bootstrap draw, duplicates allowed)
    pub fn fit(
        rows: &[[f64; NUM_FEATURES]],
        labels: &[usize],
        sample_indices: Vec<usize>,
        n_classes: usize,
        config: TreeConfig,
        rng: &mut StdRng,
    ) -> Self {
        let mut tree = DecisionTree {
            nodes: Vec::new(),
            n_classes,
        };
        tree.build(rows, labels, sample_indices, 0, &config, rng);
        tree
    }

    /// Build subtree, returning its node index
    fn build(
        &mut self,
        rows: &[[f64; NUM_FEATURES]],
        labels: &[usize],
        indices: Vec<usize>,
        depth: usize,
        config: &TreeConfig,
        rng: &mut StdRng,
    ) -> usize {
        let counts = self.class_counts(labels, &indices);
        let node_index = self.nodes.len();

        let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = config.max_depth.map_or(false, |max| depth >= max);

        if is_pure || depth_reached || indices.len() < config.min_samples_split {
            self.nodes.push(Self::leaf(&counts, indices.len()));
            return node_index;
        }

        let Some(split) = self.best_split(rows, labels, &indices, config, rng) else {
            // Every feature constant within this node
            self.nodes.push(Self::leaf(&counts, indices.len()));
            return node_index;
        };

        // Reserve the slot, fill it once both children exist
        self.nodes.push(Self::leaf(&counts, indices.len()));

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| rows[i][split.feature] <= split.threshold);
        let left = self.build(rows, labels, left_indices, depth + 1, config, rng);
        let right = self.build(rows, labels, right_indices, depth + 1, config, rng);
        self.nodes[node_index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };

        node_index
    }

    fn class_counts(&self, labels: &[usize], indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[labels[i]] += 1;
        }
        counts
    }

    fn leaf(counts: &[usize], total: usize) -> Node {
        let total = total.max(1) as f64;
        Node::Leaf {
            distribution: counts.iter().map(|&c| c as f64 / total).collect(),
        }
    }

    /// Search candidate features for the split minimising weighted Gini
    ///
    /// Features are visited in shuffled order; constant features do not count
    /// towards `max_features`, so a split is found whenever one exists.
    fn best_split(
        &self,
        rows: &[[f64; NUM_FEATURES]],
        labels: &[usize],
        indices: &[usize],
        config: &TreeConfig,
        rng: &mut StdRng,
    ) -> Option<SplitCandidate> {
        let mut features: Vec<usize> = (0..NUM_FEATURES).collect();
        features.shuffle(rng);

        let n = indices.len();
        let mut best: Option<SplitCandidate> = None;
        let mut examined = 0;
        let mut order: Vec<usize> = indices.to_vec();

        for feature in features {
            if examined >= config.max_features {
                break;
            }

            order.sort_by(|&a, &b| rows[a][feature].total_cmp(&rows[b][feature]));
            let first = rows[order[0]][feature];
            let last = rows[order[n - 1]][feature];
            if first == last {
                continue;
            }
            examined += 1;

            let mut left_counts = vec![0usize; self.n_classes];
            let mut right_counts = self.class_counts(labels, &order);
            let mut left_sq: f64 = 0.0;
            let mut right_sq: f64 = right_counts.iter().map(|&c| (c * c) as f64).sum();

            for pos in 0..n - 1 {
                let class = labels[order[pos]];
                // (c+1)² - c² = 2c + 1
                left_sq += (2 * left_counts[class] + 1) as f64;
                right_sq -= (2 * right_counts[class] - 1) as f64;
                left_counts[class] += 1;
                right_counts[class] -= 1;

                let here = rows[order[pos]][feature];
                let next = rows[order[pos + 1]][feature];
                if here == next {
                    continue;
                }

                let n_left = (pos + 1) as f64;
                let n_right = (n - pos - 1) as f64;
                let purity = left_sq / n_left + right_sq / n_right;

                if best.as_ref().map_or(true, |b| purity > b.purity) {
                    let mut threshold = here + (next - here) / 2.0;
                    // Midpoint can round up to `next` for adjacent floats
                    if threshold >= next {
                        threshold = here;
                    }
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        purity,
                    });
                }
            }
        }

        best
    }

    /// Class distribution of the leaf `x` falls into
    pub fn predict_distribution(&self, x: &[f64; NUM_FEATURES]) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if x[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        fn depth_of(nodes: &[Node], index: usize) -> usize {
            match &nodes[index] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => {
                    1 + depth_of(nodes, *left).max(depth_of(nodes, *right))
                }
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            depth_of(&self.nodes, 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn row(x0: f64, x1: f64) -> [f64; NUM_FEATURES] {
        [x0, x1, 0.0, 0.0, 0.0, 0.0, 0.0]
    }

    fn full_config() -> TreeConfig {
        TreeConfig {
            max_depth: None,
            min_samples_split: 2,
            max_features: NUM_FEATURES,
        }
    }

    #[test]
    fn test_perfect_fit_on_separable_data() {
        let rows = vec![row(0.0, 5.0), row(1.0, 5.0), row(10.0, 5.0), row(11.0, 5.0)];
        let labels = vec![0, 0, 1, 1];
        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::fit(&rows, &labels, vec![0, 1, 2, 3], 2, full_config(), &mut rng);

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.predict_distribution(&row(0.5, 0.0)), &[1.0, 0.0]);
        assert_eq!(tree.predict_distribution(&row(10.5, 0.0)), &[0.0, 1.0]);
        // Midpoint threshold 5.5
        assert_eq!(tree.predict_distribution(&row(5.4, 0.0)), &[1.0, 0.0]);
        assert_eq!(tree.predict_distribution(&row(5.6, 0.0)), &[0.0, 1.0]);
    }

    #[test]
    fn test_constant_features_make_a_leaf() {
        let rows = vec![row(1.0, 1.0), row(1.0, 1.0), row(1.0, 1.0)];
        let labels = vec![0, 1, 1];
        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::fit(&rows, &labels, vec![0, 1, 2], 2, full_config(), &mut rng);

        assert_eq!(tree.n_nodes(), 1);
        let dist = tree.predict_distribution(&row(1.0, 1.0));
        assert!((dist[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((dist[1] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let rows: Vec<_> = (0..8).map(|i| row(i as f64, 0.0)).collect();
        let labels = vec![0, 1, 0, 1, 0, 1, 0, 1];
        let mut rng = StdRng::seed_from_u64(3);
        let config = TreeConfig {
            max_depth: Some(2),
            ..full_config()
        };
        let tree = DecisionTree::fit(&rows, &labels, (0..8).collect(), 2, config, &mut rng);
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn test_bootstrap_duplicates_are_counted() {
        let rows = vec![row(0.0, 0.0), row(10.0, 0.0)];
        let labels = vec![0, 1];
        let mut rng = StdRng::seed_from_u64(1);
        // Only sample 0 drawn, three times
        let tree = DecisionTree::fit(&rows, &labels, vec![0, 0, 0], 2, full_config(), &mut rng);
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict_distribution(&row(10.0, 0.0)), &[1.0, 0.0]);
    }
}
