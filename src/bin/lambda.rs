//! AWS Lambda entry point for the bot
//!
//! Deploy with `cargo lambda build --release --features lambda`
//! and trigger it from an EventBridge schedule with a payload like
//! `{"s3Region": "...", "s3BucketName": "...", "s3KeyPrefix": "..."}`.

use lambda_runtime::{Error as LambdaError, service_fn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the AWS Lambda function.
#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!("markov-bot Lambda starting...");
    lambda_runtime::run(service_fn(markov_bot::lambda::handler)).await
}
