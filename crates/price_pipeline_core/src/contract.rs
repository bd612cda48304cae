use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::classification::{classify_price, PriceClass};

pub const INGEST_SUCCESS_MESSAGE: &str = "Data uploaded successfully!";
pub const PREDICTION_SUCCESS_MESSAGE: &str = "Prediction stored in S3 & DynamoDB";

const MAX_PRICE_SCALE: usize = 28;

/// Open-schema feature mapping in input order; values are validated by the model
/// that consumes them.
pub type FeatureRecord = Map<String, Value>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageEventEnvelope {
    #[serde(rename = "Records", default)]
    pub records: Vec<StorageNotification>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageNotification {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct S3Object {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceObject {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionResult {
    pub input: FeatureRecord,
    pub predicted_price: f64,
    pub prediction_class: PriceClass,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRecord {
    pub record_id: String,
    pub features: String,
    pub predicted_price: Decimal,
    pub prediction_class: PriceClass,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestAccepted {
    pub message: String,
    pub file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionAccepted {
    pub message: String,
    pub result: PredictionResult,
    pub results: Vec<PredictionResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorPayload {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("malformed storage event envelope: {0}")]
    MalformedEnvelope(String),
    #[error("malformed input file {key}: {message}")]
    MalformedInput { key: String, message: String },
    #[error("Missing 'features' in input file: {key}")]
    MissingFeatures { key: String },
    #[error("features cannot be serialized: {0}")]
    UnserializableFeatures(String),
    #[error("predicted price {0} cannot be stored as an exact decimal")]
    UnrepresentablePrice(String),
}

impl StorageEventEnvelope {
    /// Bucket and key of the first notification in the envelope.
    pub fn source_object(&self) -> Result<SourceObject, ContractError> {
        let notification = self.records.first().ok_or_else(|| {
            ContractError::MalformedEnvelope("envelope contains no notifications".to_string())
        })?;

        Ok(SourceObject {
            bucket: notification.s3.bucket.name.clone(),
            key: notification.s3.object.key.clone(),
        })
    }
}

impl PredictionResult {
    pub fn new(input: FeatureRecord, predicted_price: f64) -> Self {
        Self {
            input,
            predicted_price,
            prediction_class: classify_price(predicted_price),
        }
    }
}

impl PersistedRecord {
    pub fn from_result(
        record_id: impl Into<String>,
        result: &PredictionResult,
    ) -> Result<Self, ContractError> {
        let features = serde_json::to_string(&result.input)
            .map_err(|error| ContractError::UnserializableFeatures(error.to_string()))?;

        Ok(Self {
            record_id: record_id.into(),
            features,
            predicted_price: price_to_decimal(result.predicted_price)?,
            prediction_class: result.prediction_class,
        })
    }
}

/// Accepts a queue body that is either JSON text or an already-decoded object.
pub fn parse_envelope(body: &Value) -> Result<StorageEventEnvelope, ContractError> {
    match body {
        Value::String(text) => serde_json::from_str(text)
            .map_err(|error| ContractError::MalformedEnvelope(error.to_string())),
        Value::Object(_) => serde_json::from_value(body.clone())
            .map_err(|error| ContractError::MalformedEnvelope(error.to_string())),
        _ => Err(ContractError::MalformedEnvelope(
            "record body must be a JSON string or object".to_string(),
        )),
    }
}

pub fn parse_input_object(key: &str, bytes: &[u8]) -> Result<Value, ContractError> {
    serde_json::from_slice(bytes).map_err(|error| ContractError::MalformedInput {
        key: key.to_string(),
        message: error.to_string(),
    })
}

pub fn extract_features(input: &Value, key: &str) -> Result<FeatureRecord, ContractError> {
    input
        .get("features")
        .and_then(Value::as_object)
        .filter(|features| !features.is_empty())
        .cloned()
        .ok_or_else(|| ContractError::MissingFeatures {
            key: key.to_string(),
        })
}

/// Message identifiers are stored as strings regardless of their JSON type.
pub fn message_id_string(message_id: &Value) -> String {
    match message_id {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Goes through the shortest round-trip decimal text so `4200000.0` is stored as `4200000`.
/// Prices needing more than 28 fractional digits are rejected rather than rounded.
pub fn price_to_decimal(price: f64) -> Result<Decimal, ContractError> {
    if !price.is_finite() {
        return Err(ContractError::UnrepresentablePrice(price.to_string()));
    }

    let text = price.to_string();
    let fractional_digits = text.split_once('.').map_or(0, |(_, fraction)| fraction.len());
    if fractional_digits > MAX_PRICE_SCALE {
        return Err(ContractError::UnrepresentablePrice(text));
    }

    Decimal::from_str(&text)
        .map(|value| value.normalize())
        .map_err(|_| ContractError::UnrepresentablePrice(price.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_envelope() -> Value {
        json!({
            "Records": [{
                "eventName": "ObjectCreated:Put",
                "s3": {
                    "bucket": {"name": "raw-bucket"},
                    "object": {"key": "requests/2026-02-14_09-05-03_abc.json", "size": 42}
                }
            }]
        })
    }

    #[test]
    fn parses_envelope_from_string_body() {
        let body = Value::String(sample_envelope().to_string());
        let envelope = parse_envelope(&body).expect("string body should parse");
        let source = envelope.source_object().expect("source object should exist");

        assert_eq!(source.bucket, "raw-bucket");
        assert_eq!(source.key, "requests/2026-02-14_09-05-03_abc.json");
    }

    #[test]
    fn parses_envelope_from_object_body() {
        let envelope = parse_envelope(&sample_envelope()).expect("object body should parse");
        assert_eq!(envelope.records.len(), 1);
    }

    #[test]
    fn rejects_envelope_without_notifications() {
        let envelope = parse_envelope(&json!({"Records": []})).expect("empty envelope parses");
        let error = envelope.source_object().expect_err("no notifications should fail");
        assert!(error.to_string().contains("no notifications"));

        let error = parse_envelope(&json!(42)).expect_err("numeric body should fail");
        assert!(matches!(error, ContractError::MalformedEnvelope(_)));
    }

    #[test]
    fn rejects_envelope_missing_object_key() {
        let body = json!({"Records": [{"s3": {"bucket": {"name": "raw-bucket"}, "object": {}}}]});
        assert!(parse_envelope(&body).is_err());
    }

    #[test]
    fn extracts_non_empty_feature_record() {
        let input = json!({"features": {"area": 120, "city": "Jakarta"}});
        let features = extract_features(&input, "requests/a.json").expect("features exist");

        assert_eq!(features.len(), 2);
        assert_eq!(features["area"], json!(120));
    }

    #[test]
    fn missing_or_empty_features_name_the_input_file() {
        for input in [
            json!({}),
            json!({"features": {}}),
            json!({"features": null}),
            json!({"features": [1, 2]}),
        ] {
            let error = extract_features(&input, "requests/b.json").expect_err("should fail");
            assert_eq!(
                error.to_string(),
                "Missing 'features' in input file: requests/b.json"
            );
        }
    }

    #[test]
    fn coerces_message_ids_to_strings() {
        assert_eq!(message_id_string(&json!("msg-1")), "msg-1");
        assert_eq!(message_id_string(&json!(17)), "17");
    }

    #[test]
    fn converts_prices_to_exact_decimals() {
        assert_eq!(
            price_to_decimal(4_200_000.0).expect("finite price").to_string(),
            "4200000"
        );
        assert_eq!(
            price_to_decimal(3_150_000.25).expect("finite price").to_string(),
            "3150000.25"
        );
        assert_eq!(price_to_decimal(0.1).expect("finite price").to_string(), "0.1");
        assert!(price_to_decimal(f64::NAN).is_err());
        assert!(price_to_decimal(f64::INFINITY).is_err());
    }

    #[test]
    fn rejects_prices_beyond_decimal_scale_instead_of_rounding() {
        assert_eq!(
            price_to_decimal(1e-28).expect("28 fractional digits fit").to_string(),
            "0.0000000000000000000000000001"
        );

        let error = price_to_decimal(1e-30).expect_err("30 fractional digits do not fit");
        assert_eq!(
            error,
            ContractError::UnrepresentablePrice("0.000000000000000000000000000001".to_string())
        );
    }

    #[test]
    fn persisted_record_serializes_features_as_text() {
        let result = PredictionResult::new(
            FeatureRecord::from_iter([("a".to_string(), json!(1))]),
            4_200_000.0,
        );
        let record = PersistedRecord::from_result("msg-1", &result).expect("record builds");

        assert_eq!(record.record_id, "msg-1");
        assert_eq!(record.features, "{\"a\":1}");
        assert_eq!(record.predicted_price, Decimal::from(4_200_000));
        assert_eq!(record.prediction_class.tier(), 2);
    }

    #[test]
    fn feature_text_keeps_input_key_order() {
        let input: Value =
            serde_json::from_str(r#"{"features":{"zeta":1,"alpha":2,"mid":"x"}}"#).expect("json");
        let features = extract_features(&input, "requests/o.json").expect("features exist");
        let record = PersistedRecord::from_result("msg-o", &PredictionResult::new(features, 1.0))
            .expect("record builds");

        assert_eq!(record.features, r#"{"zeta":1,"alpha":2,"mid":"x"}"#);
    }
}
