use price_pipeline_core::contract::{
    extract_features, message_id_string, parse_envelope, parse_input_object, ContractError,
    PersistedRecord, PredictionAccepted, PredictionResult, SourceObject,
    PREDICTION_SUCCESS_MESSAGE,
};
use price_pipeline_core::model::{
    artifact_fingerprint, load_model_artifact, LinearRegressionModel, ModelError, PriceModel,
};
use price_pipeline_core::storage_keys::prediction_object_key;
use serde_json::Value;
use thiserror::Error;

use crate::adapters::alerts::FailureObserver;
use crate::adapters::object_store::{ObjectStore, JSON_CONTENT_TYPE};
use crate::adapters::record_table::PredictionTable;
use crate::handlers::response::{error_response, success_response, ApiGatewayResponse};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("event must include a non-empty Records array")]
    NoRecords,
    #[error("queue record is missing messageId")]
    MissingMessageId,
    #[error("queue record {message_id} is missing body")]
    MissingBody { message_id: String },
    #[error(transparent)]
    Contract(#[from] ContractError),
    #[error("failed to read input file {bucket}/{key}: {message}")]
    ReadInput {
        bucket: String,
        key: String,
        message: String,
    },
    #[error("prediction failed for input file {key}: {source}")]
    Model {
        key: String,
        #[source]
        source: ModelError,
    },
    #[error("failed to serialize prediction result: {0}")]
    SerializeResult(String),
    #[error("failed to store prediction {key}: {message}")]
    StoreResult { key: String, message: String },
    #[error("failed to store record {record_id}: {message}")]
    PersistRecord { record_id: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelLoadError {
    #[error("failed to download model artifact {bucket}/{key}: {message}")]
    Download {
        bucket: String,
        key: String,
        message: String,
    },
    #[error("failed to load model artifact {key}: {source}")]
    Invalid {
        key: String,
        #[source]
        source: ModelError,
    },
}

/// Downloads and validates the model artifact. Called once before the runtime
/// starts serving; an error here means the process must not accept events.
pub fn load_model(
    store: &impl ObjectStore,
    bucket: &str,
    key: &str,
) -> Result<LinearRegressionModel, ModelLoadError> {
    let bytes = store
        .get_object(bucket, key)
        .map_err(|message| ModelLoadError::Download {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message,
        })?;

    let model = load_model_artifact(&bytes).map_err(|source| ModelLoadError::Invalid {
        key: key.to_string(),
        source,
    })?;

    tracing::info!(
        component = "model_loader",
        event = "model_loaded",
        bucket,
        key,
        fingerprint = %artifact_fingerprint(&bytes),
        features = model.feature_names().count(),
    );
    Ok(model)
}

pub struct PredictionHandler<M, S, T, O> {
    model: M,
    store: S,
    table: T,
    observer: O,
    output_bucket: String,
}

impl<M, S, T, O> PredictionHandler<M, S, T, O>
where
    M: PriceModel,
    S: ObjectStore,
    T: PredictionTable,
    O: FailureObserver,
{
    pub fn new(
        model: M,
        store: S,
        table: T,
        observer: O,
        output_bucket: impl Into<String>,
    ) -> Self {
        Self {
            model,
            store,
            table,
            observer,
            output_bucket: output_bucket.into(),
        }
    }

    /// Processes every queue record in order. The first failing record aborts
    /// the rest of the batch and is reported to the failure observer once.
    pub fn handle_event(&self, event: Value) -> ApiGatewayResponse {
        match self.process_batch(&event) {
            Ok(accepted) => {
                tracing::info!(
                    component = "prediction_handler",
                    event = "batch_completed",
                    records = accepted.results.len(),
                );
                success_response(200, accepted)
            }
            Err(error) => {
                let message = error.to_string();
                tracing::error!(
                    component = "prediction_handler",
                    event = "invocation_failed",
                    error = %message,
                );
                if let Err(alert_error) = self.observer.on_failure(&message) {
                    tracing::warn!(
                        component = "prediction_handler",
                        event = "alert_failed",
                        error = %alert_error,
                    );
                }
                error_response(500, &message)
            }
        }
    }

    fn process_batch(&self, event: &Value) -> Result<PredictionAccepted, PredictionError> {
        let records = event
            .get("Records")
            .and_then(Value::as_array)
            .filter(|records| !records.is_empty())
            .ok_or(PredictionError::NoRecords)?;

        let results = records
            .iter()
            .map(|record| self.process_record(record))
            .collect::<Result<Vec<_>, _>>()?;

        let result = results.first().cloned().ok_or(PredictionError::NoRecords)?;
        Ok(PredictionAccepted {
            message: PREDICTION_SUCCESS_MESSAGE.to_string(),
            result,
            results,
        })
    }

    fn process_record(&self, record: &Value) -> Result<PredictionResult, PredictionError> {
        let message_id = record
            .get("messageId")
            .filter(|value| !value.is_null())
            .map(message_id_string)
            .ok_or(PredictionError::MissingMessageId)?;
        let body = record
            .get("body")
            .ok_or_else(|| PredictionError::MissingBody {
                message_id: message_id.clone(),
            })?;

        let envelope = parse_envelope(body)?;
        let source = envelope.source_object()?;
        tracing::info!(
            component = "prediction_handler",
            event = "record_started",
            message_id = %message_id,
            bucket = %source.bucket,
            key = %source.key,
        );

        let input = self.read_input(&source)?;
        let features = extract_features(&input, &source.key).inspect_err(|error| {
            tracing::error!(
                component = "prediction_handler",
                event = "features_missing",
                message_id = %message_id,
                error = %error,
            );
        })?;

        let predicted_price = self
            .model
            .predict(&features)
            .map_err(|model_error| PredictionError::Model {
                key: source.key.clone(),
                source: model_error,
            })?;
        let result = PredictionResult::new(features, predicted_price);
        // Price must be storable before anything is written.
        let record = PersistedRecord::from_result(message_id.as_str(), &result)?;

        self.store_result(&message_id, &result)?;
        self.persist_record(&record)?;

        tracing::info!(
            component = "prediction_handler",
            event = "record_completed",
            message_id = %message_id,
            predicted_price,
            prediction_class = result.prediction_class.tier(),
        );
        Ok(result)
    }

    fn read_input(&self, source: &SourceObject) -> Result<Value, PredictionError> {
        let bytes = self
            .store
            .get_object(&source.bucket, &source.key)
            .map_err(|message| PredictionError::ReadInput {
                bucket: source.bucket.clone(),
                key: source.key.clone(),
                message,
            })?;
        Ok(parse_input_object(&source.key, &bytes)?)
    }

    fn store_result(
        &self,
        message_id: &str,
        result: &PredictionResult,
    ) -> Result<(), PredictionError> {
        let key = prediction_object_key(message_id);
        let body = serde_json::to_vec(result)
            .map_err(|error| PredictionError::SerializeResult(error.to_string()))?;

        self.store
            .put_object(&self.output_bucket, &key, &body, JSON_CONTENT_TYPE)
            .map_err(|message| PredictionError::StoreResult {
                key: key.clone(),
                message,
            })?;

        tracing::info!(
            component = "prediction_handler",
            event = "prediction_stored",
            bucket = %self.output_bucket,
            key = %key,
        );
        Ok(())
    }

    fn persist_record(&self, record: &PersistedRecord) -> Result<(), PredictionError> {
        self.table
            .put_prediction(record)
            .map_err(|message| PredictionError::PersistRecord {
                record_id: record.record_id.clone(),
                message,
            })?;

        tracing::info!(
            component = "prediction_handler",
            event = "record_persisted",
            record_id = %record.record_id,
        );
        Ok(())
    }
}
