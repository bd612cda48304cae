use lambda_runtime::{service_fn, Error, LambdaEvent};
use price_pipeline_lambda::adapters::aws::{
    DynamoPredictionTable, S3ObjectStore, SnsFailureObserver,
};
use price_pipeline_lambda::config::PredictionConfig;
use price_pipeline_lambda::handlers::predict::{load_model, PredictionHandler};
use price_pipeline_lambda::handlers::response::ApiGatewayResponse;
use price_pipeline_lambda::telemetry::init_tracing;
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = PredictionConfig::from_env()?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = S3ObjectStore::new(aws_sdk_s3::Client::new(&aws_config));

    // Cold start: without a model this instance cannot serve any event.
    let model = load_model(&store, &config.model_bucket, &config.model_key).map_err(|error| {
        tracing::error!(
            component = "predict_lambda",
            event = "model_load_failed",
            error = %error,
        );
        Error::from(error.to_string())
    })?;

    let handler = PredictionHandler::new(
        model,
        store,
        DynamoPredictionTable::new(
            config.table_name.clone(),
            aws_sdk_dynamodb::Client::new(&aws_config),
        ),
        SnsFailureObserver::new(
            config.alert_topic_arn.clone(),
            aws_sdk_sns::Client::new(&aws_config),
        ),
        config.output_bucket.clone(),
    );

    let handler = &handler;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        Ok::<ApiGatewayResponse, Error>(handler.handle_event(event.payload))
    }))
    .await
}
