//! Soil and climate feature vector
//!
//! The seven agronomic inputs the classifier is trained on, in the column
//! order of the training data: N, P, K, temperature, humidity, ph, rainfall.
//!
//! Values outside the declared input ranges are accepted (the forest
//! extrapolates); only missing and non-finite values are rejected.

use crate::error::{AdvisorError, AdvisorResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const NUM_FEATURES: usize = 7;

/// One of the seven model inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Feature {
    Nitrogen,
    Phosphorus,
    Potassium,
    Temperature,
    Humidity,
    Ph,
    Rainfall,
}

impl Feature {
    /// All features in training-column order
    pub const ALL: [Feature; NUM_FEATURES] = [
        Feature::Nitrogen,
        Feature::Phosphorus,
        Feature::Potassium,
        Feature::Temperature,
        Feature::Humidity,
        Feature::Ph,
        Feature::Rainfall,
    ];

    /// Short code used as the training-data column name
    pub fn code(&self) -> &'static str {
        match self {
            Feature::Nitrogen => "N",
            Feature::Phosphorus => "P",
            Feature::Potassium => "K",
            Feature::Temperature => "temperature",
            Feature::Humidity => "humidity",
            Feature::Ph => "ph",
            Feature::Rainfall => "rainfall",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Parse a column code or long name ("N", "nitrogen", "pH", ...)
    pub fn from_code(code: &str) -> Option<Feature> {
        let trimmed = code.trim();
        // Single-letter nutrient codes are case-sensitive in the dataset but
        // lower-case forms are common in hand-typed input
        match trimmed.to_ascii_lowercase().as_str() {
            "n" | "nitrogen" => Some(Feature::Nitrogen),
            "p" | "phosphorus" => Some(Feature::Phosphorus),
            "k" | "potassium" => Some(Feature::Potassium),
            "temperature" | "temp" => Some(Feature::Temperature),
            "humidity" => Some(Feature::Humidity),
            "ph" => Some(Feature::Ph),
            "rainfall" | "rain" => Some(Feature::Rainfall),
            _ => None,
        }
    }

    /// Declared input range (bounds of the sensor input controls)
    pub fn declared_range(&self) -> (f64, f64) {
        match self {
            Feature::Nitrogen => (0.0, 140.0),
            Feature::Phosphorus => (0.0, 145.0),
            Feature::Potassium => (0.0, 205.0),
            Feature::Temperature => (10.0, 45.0),
            Feature::Humidity => (10.0, 100.0),
            Feature::Ph => (3.0, 10.0),
            Feature::Rainfall => (20.0, 300.0),
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Feature::Temperature => "°C",
            Feature::Humidity => "%",
            Feature::Rainfall => "mm",
            _ => "",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Validated soil/climate measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    #[serde(rename = "N", alias = "nitrogen")]
    pub nitrogen: f64,
    #[serde(rename = "P", alias = "phosphorus")]
    pub phosphorus: f64,
    #[serde(rename = "K", alias = "potassium")]
    pub potassium: f64,
    pub temperature: f64,
    pub humidity: f64,
    #[serde(alias = "pH")]
    pub ph: f64,
    pub rainfall: f64,
}

/// A value outside its declared input range (accepted, but worth surfacing)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeWarning {
    pub feature: Feature,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl fmt::Display for RangeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = {} is outside the usual range {}-{}",
            self.feature.code(),
            self.value,
            self.min,
            self.max
        )
    }
}

impl FeatureVector {
    pub fn new(
        nitrogen: f64,
        phosphorus: f64,
        potassium: f64,
        temperature: f64,
        humidity: f64,
        ph: f64,
        rainfall: f64,
    ) -> Self {
        Self {
            nitrogen,
            phosphorus,
            potassium,
            temperature,
            humidity,
            ph,
            rainfall,
        }
    }

    /// Static reading served by the simulated IoT sensor mode
    pub fn sensor_preset() -> Self {
        Self::new(85.0, 40.0, 60.0, 24.0, 75.0, 6.3, 90.0)
    }

    pub fn from_array(values: [f64; NUM_FEATURES]) -> Self {
        Self::new(
            values[0], values[1], values[2], values[3], values[4], values[5], values[6],
        )
    }

    pub fn to_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.nitrogen,
            self.phosphorus,
            self.potassium,
            self.temperature,
            self.humidity,
            self.ph,
            self.rainfall,
        ]
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.to_array()[feature.index()]
    }

    /// Reject non-finite values (NaN stands in for "non-numeric" once parsed)
    pub fn validate(&self) -> AdvisorResult<()> {
        for feature in Feature::ALL {
            let value = self.get(feature);
            if !value.is_finite() {
                return Err(AdvisorError::validation(format!(
                    "feature '{}' is not a finite number ({})",
                    feature.code(),
                    value
                )));
            }
        }
        Ok(())
    }

    /// Build from name/value pairs; every feature must appear exactly once
    pub fn from_pairs<S: AsRef<str>>(
        pairs: impl IntoIterator<Item = (S, f64)>,
    ) -> AdvisorResult<Self> {
        let mut slots: [Option<f64>; NUM_FEATURES] = [None; NUM_FEATURES];

        for (name, value) in pairs {
            let name = name.as_ref();
            let feature = Feature::from_code(name).ok_or_else(|| {
                AdvisorError::validation(format!("unknown feature '{}'", name))
            })?;
            if slots[feature.index()].replace(value).is_some() {
                return Err(AdvisorError::validation(format!(
                    "feature '{}' given more than once",
                    feature.code()
                )));
            }
        }

        let mut values = [0.0; NUM_FEATURES];
        for feature in Feature::ALL {
            values[feature.index()] = slots[feature.index()].ok_or_else(|| {
                AdvisorError::validation(format!("missing feature '{}'", feature.code()))
            })?;
        }

        let vector = Self::from_array(values);
        vector.validate()?;
        Ok(vector)
    }

    /// Build from a JSON object such as `{"N": 90, "P": 42, ...}`
    pub fn from_json(value: &serde_json::Value) -> AdvisorResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| AdvisorError::validation("feature vector must be a JSON object"))?;

        let mut pairs = Vec::with_capacity(object.len());
        for (key, raw) in object {
            let number = raw.as_f64().ok_or_else(|| {
                AdvisorError::validation(format!("feature '{}' is not numeric: {}", key, raw))
            })?;
            pairs.push((key.as_str(), number));
        }
        Self::from_pairs(pairs)
    }

    /// Features outside their declared range
    pub fn out_of_range(&self) -> Vec<RangeWarning> {
        Feature::ALL
            .iter()
            .filter_map(|&feature| {
                let value = self.get(feature);
                let (min, max) = feature.declared_range();
                if value < min || value > max {
                    Some(RangeWarning { feature, value, min, max })
                } else {
                    None
                }
            })
            .collect()
    }
}

/// Parses `"N=90,P=42,K=43,temperature=25,humidity=80,ph=6.5,rainfall=120"`
impl FromStr for FeatureVector {
    type Err = AdvisorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut pairs = Vec::with_capacity(NUM_FEATURES);
        for part in s.split(|c| c == ',' || c == ';').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, raw) = part.split_once('=').ok_or_else(|| {
                AdvisorError::validation(format!("expected name=value, got '{}'", part))
            })?;
            let value: f64 = raw.trim().parse().map_err(|_| {
                AdvisorError::validation(format!("feature '{}' is not numeric: '{}'", name.trim(), raw.trim()))
            })?;
            pairs.push((name.trim().to_string(), value));
        }
        Self::from_pairs(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_from_str() {
        let v: FeatureVector = "N=90,P=42,K=43,temperature=25,humidity=80,ph=6.5,rainfall=120"
            .parse()
            .unwrap();
        assert_eq!(v, FeatureVector::new(90.0, 42.0, 43.0, 25.0, 80.0, 6.5, 120.0));
    }

    #[test]
    fn test_missing_feature_rejected() {
        let err = "N=90,P=42,K=43,temperature=25,humidity=80,ph=6.5"
            .parse::<FeatureVector>()
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("rainfall"));
    }

    #[test]
    fn test_non_numeric_rejected() {
        let err = "N=lots,P=42,K=43,temperature=25,humidity=80,ph=6.5,rainfall=1"
            .parse::<FeatureVector>()
            .unwrap_err();
        assert!(err.is_validation());

        let err = FeatureVector::from_json(&json!({
            "N": 90, "P": 42, "K": "43", "temperature": 25,
            "humidity": 80, "ph": 6.5, "rainfall": 120
        }))
        .unwrap_err();
        assert!(err.to_string().contains("'K'"));
    }

    #[test]
    fn test_nan_rejected() {
        let v = FeatureVector::new(f64::NAN, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0);
        assert!(v.validate().is_err());
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = FeatureVector::from_pairs(vec![("N", 1.0), ("nitrogen", 2.0)]).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_out_of_range_is_accepted_but_reported() {
        let v = FeatureVector::from_json(&json!({
            "N": 300, "P": 42, "K": 43, "temperature": 25,
            "humidity": 80, "pH": 6.5, "rainfall": 120
        }))
        .unwrap();
        let warnings = v.out_of_range();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].feature, Feature::Nitrogen);
        assert!(FeatureVector::sensor_preset().out_of_range().is_empty());
    }

    #[test]
    fn test_serde_uses_column_codes() {
        let v = FeatureVector::sensor_preset();
        let value = serde_json::to_value(v).unwrap();
        assert_eq!(value["N"], json!(85.0));
        assert_eq!(value["ph"], json!(6.3));
        let back: FeatureVector = serde_json::from_value(value).unwrap();
        assert_eq!(back, v);
    }
}
