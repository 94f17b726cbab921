//! Recommendation engine
//!
//! Owns the process-wide read-only state (trained classifier, rule store,
//! justification texts) and exposes the two request paths:
//!
//! - `recommend`: classify → explain → look up the predicted crop's rule
//! - `check_compatibility`: multi-plant companion/conflict check only
//!
//! State is built once, up front, and shared behind `Arc`; requests never
//! mutate it, so the engine is `Send + Sync` and needs no locking.

use crate::classifier::{Classifier, CropLabel};
use crate::companion::{CompanionResolver, CompatibilityReport, ConflictPair, PlantNote};
use crate::config::AdvisorConfig;
use crate::data::{Justifications, TrainingSet};
use crate::error::AdvisorResult;
use crate::explanation::{Explainer, Explanation, Language};
use crate::features::{FeatureVector, RangeWarning};
use crate::rules::{PlantLookup, PlantRule, RuleStore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

/// Which request produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Recommendation,
    Compatibility,
}

/// State of the rule lookup behind a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    /// The predicted crop has a rule entry
    Found,
    /// The predicted crop has no rule entry (not the same as empty lists)
    NotFound,
    /// Multi-plant check; see `unknown_plants` for entries without rules
    Selection,
}

/// Single object handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub kind: ResultKind,
    /// Predicted crop, or the canonical selection
    pub crops: Vec<CropLabel>,
    /// Class probabilities (recommendation only)
    pub probabilities: BTreeMap<CropLabel, f64>,
    pub explanation: Option<Explanation>,
    pub rule_status: RuleStatus,
    pub companions: BTreeSet<String>,
    /// Recommendation: the crop's avoid list. Compatibility: flagged members
    /// of the selection.
    pub conflicts: BTreeSet<String>,
    pub conflict_pairs: Vec<ConflictPair>,
    pub unknown_plants: BTreeSet<String>,
    pub sensors: Vec<String>,
    pub notes: Vec<PlantNote>,
    pub justification: Option<String>,
    pub range_warnings: Vec<RangeWarning>,
    pub language: Language,
}

impl RecommendationResult {
    /// Predicted crop (first of `crops`)
    pub fn crop(&self) -> Option<&str> {
        self.crops.first().map(String::as_str)
    }

    pub fn rule_found(&self) -> bool {
        self.rule_status == RuleStatus::Found
    }

    /// Wrap a multi-plant report (no classifier involved)
    pub fn from_compatibility(report: CompatibilityReport, language: Language) -> Self {
        Self {
            kind: ResultKind::Compatibility,
            crops: report.selected.into_iter().collect(),
            probabilities: BTreeMap::new(),
            explanation: None,
            rule_status: RuleStatus::Selection,
            companions: report.companions,
            conflicts: report.conflicts,
            conflict_pairs: report.conflict_pairs,
            unknown_plants: report.unknown,
            sensors: Vec::new(),
            notes: report.notes,
            justification: None,
            range_warnings: Vec::new(),
            language,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    classifier: Arc<Classifier>,
    rules: Arc<RuleStore>,
    justifications: Arc<Justifications>,
    explainer: Explainer,
    language: Language,
}

impl RecommendationEngine {
    pub fn new(classifier: Arc<Classifier>, rules: Arc<RuleStore>) -> Self {
        Self {
            classifier,
            rules,
            justifications: Arc::new(Justifications::empty()),
            explainer: Explainer::default(),
            language: Language::default(),
        }
    }

    pub fn with_justifications(mut self, justifications: Justifications) -> Self {
        self.justifications = Arc::new(justifications);
        self
    }

    pub fn with_explainer(mut self, explainer: Explainer) -> Self {
        self.explainer = explainer;
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Load training data, train, load rules and justifications
    ///
    /// The justification file is optional; a missing file is logged and
    /// treated as empty. Everything else failing is a configuration error.
    pub fn from_config(config: &AdvisorConfig) -> AdvisorResult<Self> {
        config.validate()?;
        let start = Instant::now();

        let training = TrainingSet::load_csv(&config.training_path(), &config.label_column)?;
        let classifier = Classifier::from_training_set(&training, &config.forest)?;
        let rules = RuleStore::load(&config.rules_path())?;

        let justifications_path = config.justifications_path();
        let justifications = if justifications_path.exists() {
            Justifications::load(&justifications_path)?
        } else {
            tracing::warn!(
                "No justification file at {:?}, recommendations will have no justification text",
                justifications_path
            );
            Justifications::empty()
        };

        tracing::info!(
            "Engine ready in {:?}: {} crops, {} plant rules, {} justifications",
            start.elapsed(),
            classifier.n_classes(),
            rules.len(),
            justifications.len()
        );

        Ok(Self::new(Arc::new(classifier), Arc::new(rules))
            .with_justifications(justifications)
            .with_explainer(Explainer::new(config.explainer.clone()))
            .with_language(config.language))
    }

    /// Recommend a crop for `v` in the engine's default language
    pub fn recommend(&self, v: &FeatureVector) -> AdvisorResult<RecommendationResult> {
        self.recommend_in(v, self.language)
    }

    pub fn recommend_in(&self, v: &FeatureVector, language: Language) -> AdvisorResult<RecommendationResult> {
        self.recommend_seeded(v, self.explainer.config().seed, language)
    }

    /// Recommend with an explicit explainer seed (None = unseeded sampling)
    pub fn recommend_seeded(
        &self,
        v: &FeatureVector,
        seed: Option<u64>,
        language: Language,
    ) -> AdvisorResult<RecommendationResult> {
        let crop = self.classifier.predict(v)?;
        let probabilities = self.classifier.predict_probabilities(v)?;
        let explanation = self
            .explainer
            .explain_with_seed(&self.classifier, v, seed, language)?;

        let range_warnings = v.out_of_range();
        for warning in &range_warnings {
            tracing::warn!("Input outside declared range: {}", warning);
        }

        let mut result = RecommendationResult {
            kind: ResultKind::Recommendation,
            crops: vec![crop.clone()],
            probabilities,
            explanation: Some(explanation),
            rule_status: RuleStatus::NotFound,
            companions: BTreeSet::new(),
            conflicts: BTreeSet::new(),
            conflict_pairs: Vec::new(),
            unknown_plants: BTreeSet::new(),
            sensors: Vec::new(),
            notes: Vec::new(),
            justification: self.justifications.get(&crop, language).map(str::to_string),
            range_warnings,
            language,
        };

        match CompanionResolver::new(&self.rules).lookup(&crop) {
            PlantLookup::Found(rule) => {
                result.rule_status = RuleStatus::Found;
                result.companions = rule.companions.clone();
                result.conflicts = rule.avoid.clone();
                result.sensors = rule.sensors.clone();
                let note = rule.notes_in(language);
                if !note.is_empty() {
                    result.notes.push(PlantNote {
                        plant: rule.plant.clone(),
                        note: note.to_string(),
                    });
                }
            }
            PlantLookup::NotFound => {
                tracing::debug!("Predicted crop '{}' has no rule entry", crop);
            }
        }

        tracing::debug!(
            "Recommended '{}' ({:.2}), rule {:?}",
            crop,
            result.probabilities.get(&crop).copied().unwrap_or_default(),
            result.rule_status
        );

        Ok(result)
    }

    /// Multi-plant compatibility check in the engine's default language
    pub fn check_compatibility<I, S>(&self, selected: I) -> RecommendationResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.check_compatibility_in(selected, self.language)
    }

    pub fn check_compatibility_in<I, S>(&self, selected: I, language: Language) -> RecommendationResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let report = CompanionResolver::new(&self.rules).check(selected, language);
        tracing::debug!(
            "Compatibility check: {} plants, {} conflicts, {} companions",
            report.selected.len(),
            report.conflicts.len(),
            report.companions.len()
        );

        RecommendationResult::from_compatibility(report, language)
    }

    /// Case-insensitive rule lookup with an explicit `NotFound`
    pub fn lookup_plant(&self, name: &str) -> PlantLookup<'_> {
        self.rules.lookup(name)
    }

    /// Rule lookup as a `Result` (`AdvisorError::NotFound` when absent)
    pub fn get_plant(&self, name: &str) -> AdvisorResult<&PlantRule> {
        self.rules.get(name)
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn explainer_seed(&self) -> Option<u64> {
        self.explainer.config().seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExplainerConfig, ForestConfig};
    use crate::data::TrainingRecord;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_engine_is_send_sync() {
        assert_send_sync::<RecommendationEngine>();
        assert_send_sync::<RecommendationResult>();
    }

    fn engine() -> RecommendationEngine {
        let mut records = Vec::new();
        for i in 0..12 {
            let d = i as f64;
            records.push(TrainingRecord::new(
                FeatureVector::new(80.0 + d, 45.0, 40.0, 24.0, 80.0 + d * 0.5, 6.4, 190.0 + d * 5.0),
                "rice",
            ));
            records.push(TrainingRecord::new(
                FeatureVector::new(80.0 + d, 45.0, 40.0, 24.0, 60.0 + d * 0.5, 6.4, 60.0 + d * 2.0),
                "maize",
            ));
        }
        let config = ForestConfig {
            n_estimators: 15,
            ..ForestConfig::default()
        };
        let classifier = Classifier::train_with_config(&records, &config).unwrap();
        let rules = RuleStore::from_json_str(
            r#"[{"plant": "maize", "companions": ["beans", "squash"], "avoid": ["tomato"],
                 "sensors": ["soil moisture"], "notes": "Plant in blocks."}]"#,
        )
        .unwrap();
        RecommendationEngine::new(Arc::new(classifier), Arc::new(rules)).with_explainer(Explainer::new(
            ExplainerConfig {
                num_samples: 300,
                ..ExplainerConfig::default()
            },
        ))
    }

    #[test]
    fn test_recommend_found_rule() {
        let engine = engine();
        let dry = FeatureVector::new(85.0, 45.0, 40.0, 24.0, 62.0, 6.4, 70.0);
        let result = engine.recommend(&dry).unwrap();
        assert_eq!(result.kind, ResultKind::Recommendation);
        assert_eq!(result.crop(), Some("maize"));
        assert!(result.rule_found());
        assert!(result.companions.contains("beans"));
        assert!(result.conflicts.contains("tomato"));
        assert_eq!(result.sensors, vec!["soil moisture"]);
        assert_eq!(result.explanation.as_ref().unwrap().crop, "maize");
    }

    #[test]
    fn test_recommend_missing_rule_is_not_found_not_error() {
        let engine = engine();
        let wet = FeatureVector::new(85.0, 45.0, 40.0, 24.0, 84.0, 6.4, 220.0);
        let result = engine.recommend(&wet).unwrap();
        assert_eq!(result.crop(), Some("rice"));
        assert_eq!(result.rule_status, RuleStatus::NotFound);
        assert!(result.companions.is_empty());
    }

    #[test]
    fn test_recommend_rejects_non_finite() {
        let engine = engine();
        let bad = FeatureVector::new(85.0, f64::INFINITY, 40.0, 24.0, 84.0, 6.4, 220.0);
        assert!(engine.recommend(&bad).unwrap_err().is_validation());
    }

    #[test]
    fn test_out_of_range_input_warns_but_recommends() {
        let engine = engine();
        let odd = FeatureVector::new(85.0, 45.0, 40.0, 24.0, 62.0, 12.5, 70.0);
        let result = engine.recommend(&odd).unwrap();
        assert_eq!(result.range_warnings.len(), 1);
    }

    #[test]
    fn test_compatibility_has_no_explanation() {
        let engine = engine();
        let result = engine.check_compatibility(["Maize", "tomato"]);
        assert_eq!(result.kind, ResultKind::Compatibility);
        assert!(result.explanation.is_none());
        assert_eq!(result.crops, vec!["maize", "tomato"]);
        assert!(result.conflicts.contains("tomato"));
        assert!(result.unknown_plants.contains("tomato"));
    }
}
