use std::collections::HashMap;
use std::future::Future;

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_s3::primitives::ByteStream;
use price_pipeline_core::contract::PersistedRecord;

use crate::adapters::alerts::{alert_message, FailureObserver, ALERT_SUBJECT};
use crate::adapters::object_store::ObjectStore;
use crate::adapters::record_table::PredictionTable;

pub const RECORD_ID_ATTRIBUTE: &str = "recordId";
pub const FEATURES_ATTRIBUTE: &str = "features";
pub const PREDICTED_PRICE_ATTRIBUTE: &str = "predicted_price";
pub const PREDICTION_CLASS_ATTRIBUTE: &str = "prediction_class";

// Adapter traits are synchronous; SDK calls run on the multi-threaded runtime.
fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

#[derive(Clone)]
pub struct S3ObjectStore {
    s3_client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(s3_client: aws_sdk_s3::Client) -> Self {
        Self { s3_client }
    }
}

impl ObjectStore for S3ObjectStore {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, String> {
        let client = self.s3_client.clone();
        let bucket = bucket.to_string();
        let object_key = key.to_string();

        block_on(async move {
            let output = client
                .get_object()
                .bucket(bucket)
                .key(object_key)
                .send()
                .await
                .map_err(|error| format!("failed to read object from s3: {error}"))?;
            output
                .body
                .collect()
                .await
                .map(|data| data.into_bytes().to_vec())
                .map_err(|error| format!("failed to read s3 object body: {error}"))
        })
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: &[u8],
        content_type: &str,
    ) -> Result<(), String> {
        let client = self.s3_client.clone();
        let bucket = bucket.to_string();
        let object_key = key.to_string();
        let body_bytes = body.to_vec();
        let content_type = content_type.to_string();

        block_on(async move {
            client
                .put_object()
                .bucket(bucket)
                .key(object_key)
                .content_type(content_type)
                .body(ByteStream::from(body_bytes))
                .send()
                .await
                .map(|_| ())
                .map_err(|error| format!("failed to write object to s3: {error}"))
        })
    }
}

#[derive(Clone)]
pub struct DynamoPredictionTable {
    table_name: String,
    dynamodb_client: aws_sdk_dynamodb::Client,
}

impl DynamoPredictionTable {
    pub fn new(table_name: impl Into<String>, dynamodb_client: aws_sdk_dynamodb::Client) -> Self {
        Self {
            table_name: table_name.into(),
            dynamodb_client,
        }
    }
}

/// Numbers travel as DynamoDB `N` strings, so the decimal price is stored without rounding.
pub fn prediction_item(record: &PersistedRecord) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (
            RECORD_ID_ATTRIBUTE.to_string(),
            AttributeValue::S(record.record_id.clone()),
        ),
        (
            FEATURES_ATTRIBUTE.to_string(),
            AttributeValue::S(record.features.clone()),
        ),
        (
            PREDICTED_PRICE_ATTRIBUTE.to_string(),
            AttributeValue::N(record.predicted_price.to_string()),
        ),
        (
            PREDICTION_CLASS_ATTRIBUTE.to_string(),
            AttributeValue::N(record.prediction_class.tier().to_string()),
        ),
    ])
}

impl PredictionTable for DynamoPredictionTable {
    fn put_prediction(&self, record: &PersistedRecord) -> Result<(), String> {
        let client = self.dynamodb_client.clone();
        let table_name = self.table_name.clone();
        let item = prediction_item(record);

        block_on(async move {
            client
                .put_item()
                .table_name(table_name)
                .set_item(Some(item))
                .send()
                .await
                .map(|_| ())
                .map_err(|error| format!("failed to write item to dynamodb: {error}"))
        })
    }
}

#[derive(Clone)]
pub struct SnsFailureObserver {
    topic_arn: String,
    sns_client: aws_sdk_sns::Client,
}

impl SnsFailureObserver {
    pub fn new(topic_arn: impl Into<String>, sns_client: aws_sdk_sns::Client) -> Self {
        Self {
            topic_arn: topic_arn.into(),
            sns_client,
        }
    }
}

impl FailureObserver for SnsFailureObserver {
    fn on_failure(&self, error_message: &str) -> Result<(), String> {
        let client = self.sns_client.clone();
        let topic_arn = self.topic_arn.clone();
        let message = alert_message(error_message);

        block_on(async move {
            client
                .publish()
                .topic_arn(topic_arn)
                .subject(ALERT_SUBJECT)
                .message(message)
                .send()
                .await
                .map(|_| ())
                .map_err(|error| format!("failed to publish sns notification: {error}"))
        })?;

        tracing::info!(component = "alerts", event = "alert_published", "SNS notification sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use price_pipeline_core::classification::PriceClass;
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn prediction_item_matches_table_schema() {
        let record = PersistedRecord {
            record_id: "msg-1".to_string(),
            features: "{\"a\":1}".to_string(),
            predicted_price: Decimal::new(420_000_025, 2),
            prediction_class: PriceClass::MidRange,
        };

        let item = prediction_item(&record);

        assert_eq!(item.len(), 4);
        assert_eq!(
            item.get(RECORD_ID_ATTRIBUTE),
            Some(&AttributeValue::S("msg-1".to_string()))
        );
        assert_eq!(
            item.get(FEATURES_ATTRIBUTE),
            Some(&AttributeValue::S("{\"a\":1}".to_string()))
        );
        assert_eq!(
            item.get(PREDICTED_PRICE_ATTRIBUTE),
            Some(&AttributeValue::N("4200000.25".to_string()))
        );
        assert_eq!(
            item.get(PREDICTION_CLASS_ATTRIBUTE),
            Some(&AttributeValue::N("2".to_string()))
        );
    }
}
