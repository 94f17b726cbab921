//! Data Loading
//!
//! Training records (historical soil/climate observations with their crop
//! label) read from CSV with Polars, plus the optional per-crop justification
//! texts shown next to a recommendation. Both are loaded once at startup and
//! are immutable afterwards.

use crate::error::{AdvisorError, AdvisorResult};
use crate::explanation::Language;
use crate::features::{Feature, FeatureVector, NUM_FEATURES};
use crate::utils::canonicalize;
use polars::prelude::*;
use rustc_hash::FxHashMap;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// One labelled historical observation
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRecord {
    pub features: FeatureVector,
    pub label: String,
}

impl TrainingRecord {
    pub fn new(features: FeatureVector, label: impl Into<String>) -> Self {
        Self {
            features,
            label: label.into(),
        }
    }
}

/// Immutable collection of training records
#[derive(Debug, Clone)]
pub struct TrainingSet {
    records: Vec<TrainingRecord>,
}

impl TrainingSet {
    /// Validate and wrap an in-memory record collection
    pub fn from_records(records: Vec<TrainingRecord>) -> AdvisorResult<Self> {
        if records.is_empty() {
            return Err(AdvisorError::validation("training set is empty"));
        }
        for (idx, record) in records.iter().enumerate() {
            if record.label.trim().is_empty() {
                return Err(AdvisorError::validation(format!(
                    "training record {} has no label",
                    idx
                )));
            }
            record.features.validate().map_err(|e| {
                AdvisorError::validation(format!("training record {}: {}", idx, e))
            })?;
        }
        Ok(Self { records })
    }

    /// Load training data from CSV
    ///
    /// Columns: N, P, K, temperature, humidity, ph, rainfall + label column.
    /// Any missing column or empty cell is a configuration error.
    pub fn load_csv(path: &Path, label_column: &str) -> AdvisorResult<Self> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .map_err(|e| {
                AdvisorError::configuration(format!("failed to open training CSV {:?}: {}", path, e))
            })?
            .finish()
            .map_err(|e| {
                AdvisorError::configuration(format!("failed to parse training CSV {:?}: {}", path, e))
            })?;

        let records = Self::records_from_frame(&df, label_column).map_err(|e| match e {
            AdvisorError::Configuration(msg) => {
                AdvisorError::configuration(format!("{:?}: {}", path, msg))
            }
            other => other,
        })?;

        tracing::info!(
            "Loaded {} training records from {:?}",
            records.len(),
            path
        );

        Self::from_records(records).map_err(|e| AdvisorError::configuration(e.to_string()))
    }

    /// Extract typed records from a DataFrame
    pub fn records_from_frame(
        df: &DataFrame,
        label_column: &str,
    ) -> AdvisorResult<Vec<TrainingRecord>> {
        let height = df.height();
        let mut columns: Vec<Vec<f64>> = Vec::with_capacity(NUM_FEATURES);

        for feature in Feature::ALL {
            let code = feature.code();
            let column = df
                .column(code)
                .map_err(|_| missing_column(df, code))?
                .cast(&DataType::Float64)
                .map_err(|e| {
                    AdvisorError::configuration(format!("column '{}' is not numeric: {}", code, e))
                })?;
            let values: Option<Vec<f64>> = column
                .f64()
                .map_err(|e| {
                    AdvisorError::configuration(format!("column '{}' is not numeric: {}", code, e))
                })?
                .into_iter()
                .collect();
            let values = values.ok_or_else(|| {
                AdvisorError::configuration(format!(
                    "column '{}' has missing or non-numeric values",
                    code
                ))
            })?;
            columns.push(values);
        }

        let label_col = df
            .column(label_column)
            .map_err(|_| missing_column(df, label_column))?
            .cast(&DataType::String)
            .map_err(|e| {
                AdvisorError::configuration(format!("label column '{}': {}", label_column, e))
            })?;
        let labels: Option<Vec<String>> = label_col
            .str()
            .map_err(|e| {
                AdvisorError::configuration(format!("label column '{}': {}", label_column, e))
            })?
            .into_iter()
            .map(|opt| opt.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
            .collect();
        let labels = labels.ok_or_else(|| {
            AdvisorError::configuration(format!("label column '{}' has missing values", label_column))
        })?;

        let records = (0..height)
            .map(|row| {
                let mut values = [0.0; NUM_FEATURES];
                for (j, column) in columns.iter().enumerate() {
                    values[j] = column[row];
                }
                TrainingRecord::new(FeatureVector::from_array(values), labels[row].clone())
            })
            .collect();

        Ok(records)
    }

    pub fn records(&self) -> &[TrainingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Feature matrix in training-column order
    pub fn rows(&self) -> Vec<[f64; NUM_FEATURES]> {
        self.records.iter().map(|r| r.features.to_array()).collect()
    }
}

fn missing_column(df: &DataFrame, name: &str) -> AdvisorError {
    let available: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|c| c.to_string())
        .collect();
    AdvisorError::configuration(format!(
        "column '{}' not found (available: {})",
        name,
        available.join(", ")
    ))
}

/// Crop → language → justification text
#[derive(Debug, Clone, Default)]
pub struct Justifications {
    texts: FxHashMap<String, HashMap<String, String>>,
}

impl Justifications {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load `{"rice": {"English": "...", "French": "..."}, ...}`
    pub fn load(path: &Path) -> AdvisorResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            AdvisorError::configuration(format!("failed to read justifications {:?}: {}", path, e))
        })?;
        Self::from_json_str(&contents).map_err(|e| match e {
            AdvisorError::Configuration(msg) => {
                AdvisorError::configuration(format!("{:?}: {}", path, msg))
            }
            other => other,
        })
    }

    pub fn from_json_str(contents: &str) -> AdvisorResult<Self> {
        let raw: HashMap<String, HashMap<String, String>> = serde_json::from_str(contents)
            .map_err(|e| AdvisorError::configuration(format!("invalid justifications JSON: {}", e)))?;

        let texts = raw
            .into_iter()
            .map(|(crop, by_language)| (canonicalize(&crop), by_language))
            .collect();
        Ok(Self { texts })
    }

    /// Text for `crop` in `language`, falling back to English
    pub fn get(&self, crop: &str, language: Language) -> Option<&str> {
        let by_language = self.texts.get(&canonicalize(crop))?;
        let non_empty = |lang: Language| {
            by_language
                .get(lang.name())
                .map(String::as_str)
                .filter(|text| !text.trim().is_empty())
        };
        non_empty(language).or_else(|| non_empty(Language::English))
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        df! {
            "N" => &[90i64, 20],
            "P" => &[42i64, 60],
            "K" => &[43i64, 80],
            "temperature" => &[21.5, 18.0],
            "humidity" => &[82.0, 16.0],
            "ph" => &[6.5, 7.2],
            "rainfall" => &[202.9, 80.1],
            "Crop" => &["rice", "chickpea"]
        }
        .unwrap()
    }

    #[test]
    fn test_records_from_frame() {
        let records = TrainingSet::records_from_frame(&frame(), "Crop").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].label, "rice");
        assert_eq!(records[0].features.nitrogen, 90.0);
        assert_eq!(records[1].features.rainfall, 80.1);
    }

    #[test]
    fn test_missing_label_column() {
        let err = TrainingSet::records_from_frame(&frame(), "label").unwrap_err();
        assert!(matches!(err, AdvisorError::Configuration(_)));
        assert!(err.to_string().contains("available"));
    }

    #[test]
    fn test_null_cell_rejected() {
        let df = df! {
            "N" => &[Some(90.0), None],
            "P" => &[42.0, 60.0],
            "K" => &[43.0, 80.0],
            "temperature" => &[21.5, 18.0],
            "humidity" => &[82.0, 16.0],
            "ph" => &[6.5, 7.2],
            "rainfall" => &[202.9, 80.1],
            "Crop" => &["rice", "chickpea"]
        }
        .unwrap();
        let err = TrainingSet::records_from_frame(&df, "Crop").unwrap_err();
        assert!(err.to_string().contains("'N'"));
    }

    #[test]
    fn test_empty_training_set() {
        let err = TrainingSet::from_records(Vec::new()).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_blank_label_rejected() {
        let records = vec![TrainingRecord::new(FeatureVector::sensor_preset(), "  ")];
        assert!(TrainingSet::from_records(records).unwrap_err().is_validation());
    }

    #[test]
    fn test_justification_language_fallback() {
        let j = Justifications::from_json_str(
            r#"{"Rice": {"English": "Needs standing water.", "French": "Besoin d'eau stagnante."},
                "maize": {"English": "Heavy feeder."}}"#,
        )
        .unwrap();
        assert_eq!(j.get("rice", Language::French), Some("Besoin d'eau stagnante."));
        assert_eq!(j.get(" RICE ", Language::English), Some("Needs standing water."));
        assert_eq!(j.get("maize", Language::French), Some("Heavy feeder."));
        assert_eq!(j.get("mango", Language::English), None);
    }

    #[test]
    fn test_blank_translation_falls_back_to_english() {
        let j = Justifications::from_json_str(
            r#"{"rice": {"English": "Wet.", "French": "  "}, "millet": {"English": ""}}"#,
        )
        .unwrap();
        assert_eq!(j.get("rice", Language::French), Some("Wet."));
        assert_eq!(j.get("millet", Language::French), None);
    }
}
