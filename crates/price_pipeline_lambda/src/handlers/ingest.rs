use chrono::Utc;
use price_pipeline_core::contract::{IngestAccepted, INGEST_SUCCESS_MESSAGE};
use price_pipeline_core::storage_keys::request_object_key;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::adapters::object_store::{ObjectStore, JSON_CONTENT_TYPE};
use crate::config::IngestConfig;
use crate::handlers::response::{error_response, success_response, ApiGatewayResponse};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("request event must include a body")]
    MissingBody,
    #[error("malformed JSON body: {0}")]
    MalformedBody(String),
    #[error("request body must be a JSON string or object")]
    UnsupportedBody,
    #[error("{0}")]
    Storage(String),
}

/// Stores the request body under a fresh `requests/{timestamp}_{uuid}.json` key.
pub fn handle_ingest_event(
    event: Value,
    config: &IngestConfig,
    store: &impl ObjectStore,
) -> ApiGatewayResponse {
    let object_key = request_object_key(Utc::now(), Uuid::new_v4());
    handle_ingest_event_with_key(event, config, store, object_key)
}

pub fn handle_ingest_event_with_key(
    event: Value,
    config: &IngestConfig,
    store: &impl ObjectStore,
    object_key: String,
) -> ApiGatewayResponse {
    match store_request(&event, config, store, &object_key) {
        Ok(()) => {
            tracing::info!(
                component = "ingest_handler",
                event = "request_stored",
                bucket = %config.raw_bucket,
                key = %object_key,
            );
            success_response(
                200,
                IngestAccepted {
                    message: INGEST_SUCCESS_MESSAGE.to_string(),
                    file: object_key,
                },
            )
        }
        Err(error) => {
            tracing::error!(
                component = "ingest_handler",
                event = "request_rejected",
                error = %error,
            );
            error_response(500, &error.to_string())
        }
    }
}

fn store_request(
    event: &Value,
    config: &IngestConfig,
    store: &impl ObjectStore,
    object_key: &str,
) -> Result<(), IngestError> {
    let body = parse_request_body(event)?;
    let serialized = serde_json::to_vec(&body)
        .map_err(|error| IngestError::MalformedBody(error.to_string()))?;

    store
        .put_object(&config.raw_bucket, object_key, &serialized, JSON_CONTENT_TYPE)
        .map_err(IngestError::Storage)
}

/// API Gateway delivers the body as JSON text; direct invocations may pass a decoded object.
fn parse_request_body(event: &Value) -> Result<Value, IngestError> {
    match event.get("body") {
        None | Some(Value::Null) => Err(IngestError::MissingBody),
        Some(Value::String(text)) => serde_json::from_str(text)
            .map_err(|error| IngestError::MalformedBody(error.to_string())),
        Some(body @ Value::Object(_)) => Ok(body.clone()),
        Some(_) => Err(IngestError::UnsupportedBody),
    }
}
