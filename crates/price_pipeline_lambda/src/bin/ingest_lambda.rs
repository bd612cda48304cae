use lambda_runtime::{service_fn, Error, LambdaEvent};
use price_pipeline_lambda::adapters::aws::S3ObjectStore;
use price_pipeline_lambda::config::IngestConfig;
use price_pipeline_lambda::handlers::ingest::handle_ingest_event;
use price_pipeline_lambda::handlers::response::ApiGatewayResponse;
use price_pipeline_lambda::telemetry::init_tracing;
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = IngestConfig::from_env()?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = S3ObjectStore::new(aws_sdk_s3::Client::new(&aws_config));

    let config = &config;
    let store = &store;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        Ok::<ApiGatewayResponse, Error>(handle_ingest_event(event.payload, config, store))
    }))
    .await
}
