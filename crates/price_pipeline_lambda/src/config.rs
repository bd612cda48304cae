use price_pipeline_core::storage_keys::DEFAULT_MODEL_KEY;
use thiserror::Error;

pub const RAW_BUCKET_VAR: &str = "RAW_BUCKET";
pub const MODEL_BUCKET_VAR: &str = "MODEL_BUCKET";
pub const MODEL_KEY_VAR: &str = "MODEL_KEY";
pub const OUTPUT_BUCKET_VAR: &str = "OUTPUT_BUCKET";
pub const PREDICTIONS_TABLE_VAR: &str = "PREDICTIONS_TABLE";
pub const ALERT_TOPIC_ARN_VAR: &str = "ALERT_TOPIC_ARN";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    pub raw_bucket: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionConfig {
    pub model_bucket: String,
    pub model_key: String,
    pub output_bucket: String,
    pub table_name: String,
    pub alert_topic_arn: String,
}

impl IngestConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            raw_bucket: required(&lookup, RAW_BUCKET_VAR)?,
        })
    }
}

impl PredictionConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            model_bucket: required(&lookup, MODEL_BUCKET_VAR)?,
            model_key: optional(&lookup, MODEL_KEY_VAR)
                .unwrap_or_else(|| DEFAULT_MODEL_KEY.to_string()),
            output_bucket: required(&lookup, OUTPUT_BUCKET_VAR)?,
            table_name: required(&lookup, PREDICTIONS_TABLE_VAR)?,
            alert_topic_arn: required(&lookup, ALERT_TOPIC_ARN_VAR)?,
        })
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    optional(lookup, name).ok_or(ConfigError::Missing(name))
}
