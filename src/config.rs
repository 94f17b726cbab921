//! Advisor configuration
//!
//! Data file locations, forest and explainer parameters. Defaults match the
//! deployed app (100 trees, seed 42, 5000 perturbation samples). Values come
//! from a JSON file, environment variables, or both (environment wins).

use crate::error::{AdvisorError, AdvisorResult};
use crate::explanation::Language;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Random forest parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub n_estimators: usize,
    /// Random seed (bootstrap draws and candidate features)
    pub seed: u64,
    /// Maximum tree depth (None = grow until pure)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            seed: 42,
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

/// Local surrogate explainer parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainerConfig {
    /// Size of the perturbation neighbourhood
    pub num_samples: usize,
    /// Exponential kernel width; None = 0.75 × sqrt(feature count)
    pub kernel_width: Option<f64>,
    /// Regress on quartile-bin membership instead of scaled values
    pub discretize: bool,
    /// Ridge penalty of the surrogate
    pub ridge_alpha: f64,
    /// Sampling seed; None = fresh entropy per explanation
    pub seed: Option<u64>,
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        Self {
            num_samples: 5000,
            kernel_width: None,
            discretize: true,
            ridge_alpha: 1.0,
            seed: Some(42),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub data_dir: PathBuf,
    pub training_file: String,
    pub label_column: String,
    pub rules_file: String,
    /// Per-crop localised justification texts (optional file)
    pub justifications_file: String,
    pub forest: ForestConfig,
    pub explainer: ExplainerConfig,
    pub language: Language,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            training_file: "Crop_Recommendation.csv".to_string(),
            label_column: "Crop".to_string(),
            rules_file: "plants_full.json".to_string(),
            justifications_file: "plant_explanations.json".to_string(),
            forest: ForestConfig::default(),
            explainer: ExplainerConfig::default(),
            language: Language::English,
        }
    }
}

impl AdvisorConfig {
    /// Load from a JSON file; missing keys fall back to defaults
    pub fn load(path: &Path) -> AdvisorResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            AdvisorError::configuration(format!("failed to read config {:?}: {}", path, e))
        })?;
        let config: AdvisorConfig = serde_json::from_str(&contents).map_err(|e| {
            AdvisorError::configuration(format!("failed to parse config {:?}: {}", path, e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with environment variables
    pub fn from_env() -> AdvisorResult<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply DATA_DIR, ADVISOR_SEED, ADVISOR_LANGUAGE, ADVISOR_EXPLAIN_SAMPLES
    pub fn with_env_overrides(mut self) -> AdvisorResult<Self> {
        if let Ok(dir) = std::env::var("DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(seed) = std::env::var("ADVISOR_SEED") {
            let seed: u64 = seed.trim().parse().map_err(|_| {
                AdvisorError::configuration(format!("ADVISOR_SEED is not an integer: '{}'", seed))
            })?;
            self.forest.seed = seed;
            self.explainer.seed = Some(seed);
        }
        if let Ok(language) = std::env::var("ADVISOR_LANGUAGE") {
            self.language = language.parse()?;
        }
        if let Ok(samples) = std::env::var("ADVISOR_EXPLAIN_SAMPLES") {
            self.explainer.num_samples = samples.trim().parse().map_err(|_| {
                AdvisorError::configuration(format!(
                    "ADVISOR_EXPLAIN_SAMPLES is not an integer: '{}'",
                    samples
                ))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> AdvisorResult<()> {
        if self.forest.n_estimators == 0 {
            return Err(AdvisorError::configuration("forest.n_estimators must be at least 1"));
        }
        if self.forest.min_samples_split < 2 {
            return Err(AdvisorError::configuration("forest.min_samples_split must be at least 2"));
        }
        if self.explainer.num_samples < 2 {
            return Err(AdvisorError::configuration("explainer.num_samples must be at least 2"));
        }
        if let Some(width) = self.explainer.kernel_width {
            if !(width > 0.0 && width.is_finite()) {
                return Err(AdvisorError::configuration("explainer.kernel_width must be positive"));
            }
        }
        if !(self.explainer.ridge_alpha >= 0.0) {
            return Err(AdvisorError::configuration("explainer.ridge_alpha must be non-negative"));
        }
        if self.label_column.trim().is_empty() {
            return Err(AdvisorError::configuration("label_column must not be empty"));
        }
        Ok(())
    }

    pub fn training_path(&self) -> PathBuf {
        self.data_dir.join(&self.training_file)
    }

    pub fn rules_path(&self) -> PathBuf {
        self.data_dir.join(&self.rules_file)
    }

    pub fn justifications_path(&self) -> PathBuf {
        self.data_dir.join(&self.justifications_file)
    }
}
