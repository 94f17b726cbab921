//! Local surrogate explainer
//!
//! Model-agnostic: only `predict_proba` of the classifier is used.
//!
//! 1. Sample a Gaussian neighbourhood around the query (per-feature sigma =
//!    training standard deviation); row 0 is the query itself
//! 2. Query class probabilities for every row (Rayon batch)
//! 3. Weight rows with an exponential kernel on scaled Euclidean distance
//! 4. Fit a weighted ridge regression from surrogate inputs (quartile-bin
//!    indicators, or standardised values) to P(predicted crop)
//! 5. Rank features by |coefficient|; sign gives supports / opposes
//! 6. Describe each feature's condition through the phrase tables

use crate::classifier::{argmax, Classifier};
use crate::config::ExplainerConfig;
use crate::error::{AdvisorError, AdvisorResult};
use crate::explanation::discretize::{Condition, QuartileDiscretizer};
use crate::explanation::phrasing::{translate_condition, Language};
use crate::explanation::types::{Direction, Explanation, FeatureInfluence};
use crate::features::{Feature, FeatureVector, NUM_FEATURES};
use crate::utils::standard_normal;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;

/// Coefficients of a weighted linear fit
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    pub intercept: f64,
    pub coefficients: [f64; NUM_FEATURES],
}

impl LinearFit {
    pub fn predict(&self, z: &[f64; NUM_FEATURES]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(z.iter())
                .map(|(b, x)| b * x)
                .sum::<f64>()
    }
}

#[derive(Debug, Clone)]
pub struct Explainer {
    config: ExplainerConfig,
}

impl Default for Explainer {
    fn default() -> Self {
        Self::new(ExplainerConfig::default())
    }
}

impl Explainer {
    pub fn new(config: ExplainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExplainerConfig {
        &self.config
    }

    /// Explain the classifier's top prediction for `query`, seeded from config
    pub fn explain(
        &self,
        classifier: &Classifier,
        query: &FeatureVector,
        language: Language,
    ) -> AdvisorResult<Explanation> {
        self.explain_with_seed(classifier, query, self.config.seed, language)
    }

    /// Explain with an explicit seed (None = fresh entropy)
    pub fn explain_with_seed(
        &self,
        classifier: &Classifier,
        query: &FeatureVector,
        seed: Option<u64>,
        language: Language,
    ) -> AdvisorResult<Explanation> {
        if classifier.n_classes() < 2 {
            return Err(AdvisorError::validation(format!(
                "explanation needs at least two classes, model has {}",
                classifier.n_classes()
            )));
        }
        query.validate()?;
        if self.config.num_samples < 2 {
            return Err(AdvisorError::validation("explainer needs at least two samples"));
        }

        let start = Instant::now();
        let stats = classifier.feature_stats();
        let q = query.to_array();

        // 1. Neighbourhood
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let mut samples: Vec<[f64; NUM_FEATURES]> = Vec::with_capacity(self.config.num_samples);
        samples.push(q);
        for _ in 1..self.config.num_samples {
            let mut row = q;
            for (j, value) in row.iter_mut().enumerate() {
                *value += standard_normal(&mut rng) * stats.scale[j];
            }
            samples.push(row);
        }

        // 2. Probabilities; target = class predicted at the query
        let probabilities = classifier.predict_proba_batch(&samples);
        let target = argmax(&probabilities[0]);
        let y: Vec<f64> = probabilities.iter().map(|p| p[target]).collect();

        // 3. Kernel weights
        let width = self
            .config
            .kernel_width
            .unwrap_or(0.75 * libm::sqrt(NUM_FEATURES as f64));
        let weights: Vec<f64> = samples
            .iter()
            .map(|row| {
                let d2: f64 = row
                    .iter()
                    .zip(q.iter())
                    .enumerate()
                    .map(|(j, (x, q))| {
                        let d = (x - q) / stats.scale[j];
                        d * d
                    })
                    .sum();
                libm::sqrt(libm::exp(-d2 / (width * width)))
            })
            .collect();

        // 4. Surrogate inputs
        let discretizer = QuartileDiscretizer::new(stats);
        let query_bins: [usize; NUM_FEATURES] =
            std::array::from_fn(|j| discretizer.bin(Feature::ALL[j], q[j]));
        let design: Vec<[f64; NUM_FEATURES]> = samples
            .iter()
            .map(|row| {
                std::array::from_fn(|j| {
                    if self.config.discretize {
                        let same = discretizer.bin(Feature::ALL[j], row[j]) == query_bins[j];
                        if same { 1.0 } else { 0.0 }
                    } else {
                        (row[j] - stats.mean[j]) / stats.scale[j]
                    }
                })
            })
            .collect();

        let fit = weighted_ridge(&design, &y, &weights, self.config.ridge_alpha);
        let score = weighted_r2(&fit, &design, &y, &weights);

        // 5 + 6. Rank and describe
        let mut influences: Vec<FeatureInfluence> = Feature::ALL
            .iter()
            .map(|&feature| {
                let j = feature.index();
                let condition = if self.config.discretize {
                    discretizer.condition(feature, query_bins[j])
                } else {
                    Condition::Equals(q[j])
                }
                .render(feature);
                let weight = fit.coefficients[j];
                FeatureInfluence {
                    feature,
                    description: translate_condition(&condition, language),
                    condition,
                    direction: Direction::from_weight(weight),
                    magnitude: weight.abs(),
                    weight,
                }
            })
            .collect();
        // Stable: equal magnitudes keep training-column order
        influences.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));

        let explanation = Explanation {
            crop: classifier.classes()[target].clone(),
            class_probability: y[0],
            influences,
            intercept: fit.intercept,
            local_prediction: fit.predict(&design[0]),
            score,
            num_samples: samples.len(),
            discretized: self.config.discretize,
            language,
        };

        tracing::debug!(
            "Explained '{}' with {} samples in {:?} (top: {:?}, R²={:.3})",
            explanation.crop,
            explanation.num_samples,
            start.elapsed(),
            explanation.top().map(|i| i.feature),
            explanation.score
        );

        Ok(explanation)
    }
}

/// Weighted ridge regression with an unpenalised intercept
///
/// Centres inputs and target on their weighted means, then solves
/// (XᵀWX + αI) β = XᵀWy. Intercept = ȳ - x̄·β.
pub fn weighted_ridge(
    x: &[[f64; NUM_FEATURES]],
    y: &[f64],
    w: &[f64],
    alpha: f64,
) -> LinearFit {
    let total_w: f64 = w.iter().sum();
    if total_w <= 0.0 || x.is_empty() {
        return LinearFit {
            intercept: 0.0,
            coefficients: [0.0; NUM_FEATURES],
        };
    }

    let mut x_mean = [0.0; NUM_FEATURES];
    let mut y_mean = 0.0;
    for ((row, &yi), &wi) in x.iter().zip(y).zip(w) {
        for j in 0..NUM_FEATURES {
            x_mean[j] += wi * row[j];
        }
        y_mean += wi * yi;
    }
    for m in x_mean.iter_mut() {
        *m /= total_w;
    }
    y_mean /= total_w;

    let mut a = [[0.0; NUM_FEATURES]; NUM_FEATURES];
    let mut b = [0.0; NUM_FEATURES];
    for ((row, &yi), &wi) in x.iter().zip(y).zip(w) {
        let yc = yi - y_mean;
        for i in 0..NUM_FEATURES {
            let xi = row[i] - x_mean[i];
            b[i] += wi * xi * yc;
            for k in i..NUM_FEATURES {
                a[i][k] += wi * xi * (row[k] - x_mean[k]);
            }
        }
    }
    for i in 0..NUM_FEATURES {
        for k in 0..i {
            a[i][k] = a[k][i];
        }
        a[i][i] += alpha;
    }

    let coefficients = solve(a, b);
    let intercept = y_mean
        - coefficients
            .iter()
            .zip(x_mean.iter())
            .map(|(c, m)| c * m)
            .sum::<f64>();

    LinearFit {
        intercept,
        coefficients,
    }
}

/// Gauss-Jordan elimination with partial pivoting; singular directions get 0
///
/// The pivot for each column is searched over every row not yet used as a
/// pivot, so a column skipped as singular does not lock its row away from
/// later columns.
fn solve(
    mut a: [[f64; NUM_FEATURES]; NUM_FEATURES],
    mut b: [f64; NUM_FEATURES],
) -> [f64; NUM_FEATURES] {
    const EPS: f64 = 1e-12;
    let mut used = [false; NUM_FEATURES];
    let mut pivot_row: [Option<usize>; NUM_FEATURES] = [None; NUM_FEATURES];

    for col in 0..NUM_FEATURES {
        let Some(pivot) = (0..NUM_FEATURES)
            .filter(|&r| !used[r])
            .max_by(|&r1, &r2| a[r1][col].abs().total_cmp(&a[r2][col].abs()))
        else {
            break;
        };
        if a[pivot][col].abs() < EPS {
            continue;
        }
        used[pivot] = true;
        pivot_row[col] = Some(pivot);

        for row in 0..NUM_FEATURES {
            if row == pivot {
                continue;
            }
            let factor = a[row][col] / a[pivot][col];
            if factor == 0.0 {
                continue;
            }
            for k in 0..NUM_FEATURES {
                a[row][k] -= factor * a[pivot][k];
            }
            b[row] -= factor * b[pivot];
        }
    }

    let mut x = [0.0; NUM_FEATURES];
    for (col, row) in pivot_row.iter().enumerate() {
        if let Some(row) = *row {
            x[col] = b[row] / a[row][col];
        }
    }
    x
}

/// Weighted coefficient of determination
fn weighted_r2(fit: &LinearFit, x: &[[f64; NUM_FEATURES]], y: &[f64], w: &[f64]) -> f64 {
    let total_w: f64 = w.iter().sum();
    if total_w <= 0.0 {
        return 0.0;
    }
    let y_mean = y.iter().zip(w).map(|(yi, wi)| yi * wi).sum::<f64>() / total_w;
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for ((row, &yi), &wi) in x.iter().zip(y).zip(w) {
        let residual = yi - fit.predict(row);
        ss_res += wi * residual * residual;
        ss_tot += wi * (yi - y_mean) * (yi - y_mean);
    }
    if ss_tot <= 0.0 {
        // Flat target: perfect if residuals vanish too
        return if ss_res <= f64::EPSILON { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}
