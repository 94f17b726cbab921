//! Utility modules shared by the classifier, explainer and resolver
//!
//! - Statistics: per-feature spread and quartiles of the training data
//! - Plant names: canonical keys and display names
//! - Sampling: seeded Gaussian draws for the perturbation neighbourhood

pub mod stats;
pub mod plant_names;
pub mod sampling;

pub use stats::{FeatureStats, mean, std_dev, quantile};
pub use plant_names::{canonicalize, display_name};
pub use sampling::standard_normal;
