//! xCrop advisor
//!
//! Crop recommendation from soil and climate readings, with a local
//! explanation of each prediction and companion/conflict checks over a plant
//! rule database.
//!
//! - `features`: the seven-value soil/climate input
//! - `data`: training records (Polars CSV) and justification texts
//! - `classifier/`: random forest, trained once and shared read-only
//! - `explanation/`: local surrogate explainer, phrasing, formatters
//! - `rules`: plant rule database
//! - `companion`: companion/conflict set algebra
//! - `engine`: the two request paths, recommend and check-compatibility

pub mod error;
pub mod config;
pub mod utils;
pub mod features;
pub mod data;
pub mod classifier;
pub mod explanation;
pub mod rules;
pub mod companion;
pub mod engine;

#[cfg(feature = "api")]
pub mod api_server;

// Re-export commonly used types
pub use error::{AdvisorError, AdvisorResult};
pub use config::{AdvisorConfig, ExplainerConfig, ForestConfig};
pub use features::{Feature, FeatureVector, RangeWarning, NUM_FEATURES};
pub use data::{Justifications, TrainingRecord, TrainingSet};
pub use classifier::{Classifier, CropLabel};
pub use explanation::{Direction, Explainer, Explanation, FeatureInfluence, JsonFormatter, Language, MarkdownFormatter};
pub use rules::{PlantLookup, PlantRule, RuleStore};
pub use companion::{CompanionResolver, CompatibilityReport, ConflictPair, PlantNote};
pub use engine::{RecommendationEngine, RecommendationResult, ResultKind, RuleStatus};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
