//! Regression model artifact and evaluation.
//!
//! The artifact is a JSON document exported by the training pipeline:
//!
//! ```json
//! {
//!   "format_version": "v1",
//!   "intercept": 250000.0,
//!   "coefficients": {"land_area": 9500.0, "bedrooms": 120000.0},
//!   "categories": {"city": {"Jakarta": 800000.0, "Bandung": 150000.0}}
//! }
//! ```
//!
//! Numeric features contribute `weight * value`; categorical features add the
//! weight of their one-hot category, with unseen categories contributing zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::contract::FeatureRecord;

pub const MODEL_FORMAT_VERSION: &str = "v1";

pub trait PriceModel {
    fn predict(&self, features: &FeatureRecord) -> Result<f64, ModelError>;
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("malformed model artifact: {0}")]
    MalformedArtifact(String),
    #[error("unsupported model format version '{0}'")]
    UnsupportedVersion(String),
    #[error("model artifact weight for '{0}' is not finite")]
    NonFiniteWeight(String),
    #[error("feature '{0}' required by the model is missing")]
    MissingFeature(String),
    #[error("feature '{0}' was not seen when the model was trained")]
    UnexpectedFeature(String),
    #[error("feature '{name}' must be numeric, got {value}")]
    NonNumericFeature { name: String, value: Value },
    #[error("feature '{name}' must be a category label, got {value}")]
    NonCategoricalFeature { name: String, value: Value },
    #[error("model produced a non-finite prediction")]
    NonFiniteOutput,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinearRegressionModel {
    pub format_version: String,
    pub intercept: f64,
    #[serde(default)]
    pub coefficients: BTreeMap<String, f64>,
    #[serde(default)]
    pub categories: BTreeMap<String, BTreeMap<String, f64>>,
}

impl LinearRegressionModel {
    fn validate(&self) -> Result<(), ModelError> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(ModelError::UnsupportedVersion(self.format_version.clone()));
        }

        if self.coefficients.is_empty() && self.categories.is_empty() {
            return Err(ModelError::MalformedArtifact(
                "model declares no features".to_string(),
            ));
        }

        if !self.intercept.is_finite() {
            return Err(ModelError::NonFiniteWeight("intercept".to_string()));
        }

        for (name, weight) in &self.coefficients {
            if !weight.is_finite() {
                return Err(ModelError::NonFiniteWeight(name.clone()));
            }
        }

        for (name, levels) in &self.categories {
            if self.coefficients.contains_key(name) {
                return Err(ModelError::MalformedArtifact(format!(
                    "feature '{name}' is declared both numeric and categorical"
                )));
            }
            for (level, weight) in levels {
                if !weight.is_finite() {
                    return Err(ModelError::NonFiniteWeight(format!("{name}={level}")));
                }
            }
        }

        Ok(())
    }

    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.coefficients
            .keys()
            .chain(self.categories.keys())
            .map(String::as_str)
    }
}

impl PriceModel for LinearRegressionModel {
    fn predict(&self, features: &FeatureRecord) -> Result<f64, ModelError> {
        if let Some(name) = features.keys().find(|name| {
            !self.coefficients.contains_key(*name) && !self.categories.contains_key(*name)
        }) {
            return Err(ModelError::UnexpectedFeature(name.clone()));
        }

        let mut price = self.intercept;

        for (name, weight) in &self.coefficients {
            let value = features
                .get(name)
                .ok_or_else(|| ModelError::MissingFeature(name.clone()))?;
            price += weight * numeric_value(name, value)?;
        }

        for (name, levels) in &self.categories {
            let value = features
                .get(name)
                .ok_or_else(|| ModelError::MissingFeature(name.clone()))?;
            let label = category_label(name, value)?;
            price += levels.get(&label).copied().unwrap_or(0.0);
        }

        if price.is_finite() {
            Ok(price)
        } else {
            Err(ModelError::NonFiniteOutput)
        }
    }
}

pub fn load_model_artifact(bytes: &[u8]) -> Result<LinearRegressionModel, ModelError> {
    let model: LinearRegressionModel = serde_json::from_slice(bytes)
        .map_err(|error| ModelError::MalformedArtifact(error.to_string()))?;
    model.validate()?;
    Ok(model)
}

pub fn artifact_fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn numeric_value(name: &str, value: &Value) -> Result<f64, ModelError> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed
        .filter(|number| number.is_finite())
        .ok_or_else(|| ModelError::NonNumericFeature {
            name: name.to_string(),
            value: value.clone(),
        })
}

fn category_label(name: &str, value: &Value) -> Result<String, ModelError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        _ => Err(ModelError::NonCategoricalFeature {
            name: name.to_string(),
            value: value.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_artifact() -> Value {
        json!({
            "format_version": "v1",
            "intercept": 250000.0,
            "coefficients": {"land_area": 9500.0, "bedrooms": 120000.0},
            "categories": {"city": {"Jakarta": 800000.0, "Bandung": 150000.0}}
        })
    }

    fn sample_model() -> LinearRegressionModel {
        load_model_artifact(sample_artifact().to_string().as_bytes()).expect("artifact loads")
    }

    fn features(value: Value) -> FeatureRecord {
        serde_json::from_value(value).expect("feature record")
    }

    #[test]
    fn predicts_linear_combination_with_one_hot_categories() {
        let model = sample_model();
        let price = model
            .predict(&features(json!({"land_area": 200, "bedrooms": 3, "city": "Jakarta"})))
            .expect("prediction succeeds");

        assert_eq!(price, 250_000.0 + 9_500.0 * 200.0 + 120_000.0 * 3.0 + 800_000.0);
    }

    #[test]
    fn unseen_category_contributes_nothing() {
        let model = sample_model();
        let price = model
            .predict(&features(json!({"land_area": 0, "bedrooms": 0, "city": "Medan"})))
            .expect("prediction succeeds");

        assert_eq!(price, 250_000.0);
    }

    #[test]
    fn coerces_booleans_and_numeric_strings() {
        let model = sample_model();
        let price = model
            .predict(&features(json!({"land_area": "10.5", "bedrooms": true, "city": "Bandung"})))
            .expect("prediction succeeds");

        assert_eq!(price, 250_000.0 + 9_500.0 * 10.5 + 120_000.0 + 150_000.0);
    }

    #[test]
    fn rejects_missing_unexpected_and_non_numeric_features() {
        let model = sample_model();

        let error = model
            .predict(&features(json!({"land_area": 1, "city": "Jakarta"})))
            .expect_err("missing bedrooms");
        assert_eq!(error, ModelError::MissingFeature("bedrooms".to_string()));

        let error = model
            .predict(&features(
                json!({"land_area": 1, "bedrooms": 2, "city": "Jakarta", "pool": 1}),
            ))
            .expect_err("unexpected feature");
        assert_eq!(error, ModelError::UnexpectedFeature("pool".to_string()));

        let error = model
            .predict(&features(json!({"land_area": "big", "bedrooms": 2, "city": "Jakarta"})))
            .expect_err("non-numeric feature");
        assert!(matches!(error, ModelError::NonNumericFeature { .. }));

        let error = model
            .predict(&features(json!({"land_area": 1, "bedrooms": 2, "city": {"name": "x"}})))
            .expect_err("non-categorical feature");
        assert!(matches!(error, ModelError::NonCategoricalFeature { .. }));
    }

    #[test]
    fn rejects_invalid_artifacts() {
        let error = load_model_artifact(b"not json").expect_err("malformed");
        assert!(matches!(error, ModelError::MalformedArtifact(_)));

        let mut artifact = sample_artifact();
        artifact["format_version"] = json!("v0");
        let error = load_model_artifact(artifact.to_string().as_bytes()).expect_err("version");
        assert_eq!(error, ModelError::UnsupportedVersion("v0".to_string()));

        let empty = json!({"format_version": "v1", "intercept": 1.0});
        let error = load_model_artifact(empty.to_string().as_bytes()).expect_err("no features");
        assert!(matches!(error, ModelError::MalformedArtifact(_)));

        let overlapping = json!({
            "format_version": "v1",
            "intercept": 1.0,
            "coefficients": {"city": 1.0},
            "categories": {"city": {"Jakarta": 1.0}}
        });
        let error =
            load_model_artifact(overlapping.to_string().as_bytes()).expect_err("overlap");
        assert!(matches!(error, ModelError::MalformedArtifact(_)));
    }

    #[test]
    fn fingerprint_is_stable_sha256_hex() {
        let fingerprint = artifact_fingerprint(b"abc");
        assert_eq!(
            fingerprint,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn lists_declared_feature_names() {
        let model = sample_model();
        let names: Vec<&str> = model.feature_names().collect();
        assert_eq!(names, vec!["bedrooms", "land_area", "city"]);
    }
}
