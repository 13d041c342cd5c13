// src/lambda/mod.rs

//! AWS Lambda handler for the bot.
//!
//! Each invocation:
//! 1. Loads `{prefix}/config.toml` from S3
//! 2. Rebuilds `{prefix}/model` if it is missing or stale
//! 3. Generates and publishes one post

use std::time::{Duration, SystemTime};

use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::config::load_config;
use crate::error::Result;
use crate::markov::WordTokenizer;
use crate::pipeline::{self, Bot, BuildOutcome};
use crate::storage::S3Store;

/// Time left for logging and responding after the deadline cancels work.
const DEADLINE_MARGIN: Duration = Duration::from_secs(2);

/// Lambda invocation payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostEvent {
    pub s3_region: String,
    pub s3_bucket_name: String,
    pub s3_key_prefix: String,
}

/// Lambda response payload.
#[derive(Debug, Serialize)]
pub struct PostResponse {
    /// Model freshness before the run
    pub freshness: String,
    /// `skipped`, `rebuilt` or `kept`
    pub build: String,
    /// Set when a rebuild failed and the previous model was used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_error: Option<String>,
    /// Generated text
    pub text: String,
}

/// Main Lambda handler function.
#[instrument(skip(event))]
pub async fn handler(event: LambdaEvent<PostEvent>) -> std::result::Result<PostResponse, LambdaError> {
    let (request, context) = event.into_parts();
    info!(
        "Starting run: bucket={}, prefix={}",
        request.s3_bucket_name, request.s3_key_prefix
    );

    let cancel = CancellationToken::new();
    let remaining = context
        .deadline()
        .duration_since(SystemTime::now())
        .unwrap_or_default()
        .saturating_sub(DEADLINE_MARGIN);
    let timer = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            cancel.cancel();
        })
    };

    let result = run_bot(&request, &cancel).await;
    timer.abort();

    match result {
        Ok(response) => {
            info!("Run completed: build={}, text={:?}", response.build, response.text);
            Ok(response)
        }
        Err(e) => {
            error!("Run failed: {}", e);
            Err(e.into())
        }
    }
}

/// Internal run logic.
async fn run_bot(request: &PostEvent, cancel: &CancellationToken) -> Result<PostResponse> {
    let prefix = request.s3_key_prefix.trim_end_matches('/');
    let client = S3Store::client_for_region(&request.s3_region).await;
    let config_store = S3Store::new(client, &request.s3_bucket_name, format!("{prefix}/config.toml"));
    let model_store = config_store.with_key(format!("{prefix}/model"));

    let config = load_config(&config_store).await?;
    let bot = Bot::from_config(&config)?;
    let report = pipeline::run(&bot, &WordTokenizer, &model_store, cancel).await?;

    let (build, build_error) = match report.build {
        BuildOutcome::Skipped => ("skipped", None),
        BuildOutcome::Rebuilt(_) => ("rebuilt", None),
        BuildOutcome::Kept { error } => ("kept", Some(error)),
    };

    Ok(PostResponse {
        freshness: report.freshness.to_string(),
        build: build.to_string(),
        build_error,
        text: report.text,
    })
}
