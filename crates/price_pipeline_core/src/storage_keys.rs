use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const REQUESTS_PREFIX: &str = "requests";
pub const PREDICTIONS_PREFIX: &str = "predictions";
pub const DEFAULT_MODEL_KEY: &str = "models/price_model.json";

const REQUEST_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

pub fn request_object_key(timestamp: DateTime<Utc>, request_id: Uuid) -> String {
    format!(
        "{REQUESTS_PREFIX}/{}_{request_id}.json",
        timestamp.format(REQUEST_TIMESTAMP_FORMAT)
    )
}

pub fn prediction_object_key(message_id: &str) -> String {
    format!("{PREDICTIONS_PREFIX}/{message_id}.json")
}
