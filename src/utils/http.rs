// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::HttpConfig;

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

/// Create a configured asynchronous HTTP client.
pub fn create_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Send a request and read its body, aborting as soon as `cancel` fires.
pub async fn execute(request: RequestBuilder, cancel: &CancellationToken) -> Result<Reply> {
    let exchange = async {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok::<_, AppError>(Reply { status, body })
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        reply = exchange => reply,
    }
}

/// Fail with `AppError::Status` unless the reply is 2xx.
pub fn ensure_success(context: &str, reply: &Reply) -> Result<()> {
    if reply.status.is_success() {
        return Ok(());
    }
    Err(AppError::Status {
        context: context.to_string(),
        status: reply.status.as_u16(),
        body: reply.body.clone(),
    })
}

/// Check the status, then decode the JSON body.
pub fn decode_json<T: DeserializeOwned>(context: &str, reply: &Reply) -> Result<T> {
    ensure_success(context, reply)?;
    serde_json::from_str(&reply.body).map_err(|e| AppError::decode(context, e, &reply.body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Account {
        id: String,
    }

    fn reply(status: u16, body: &str) -> Reply {
        Reply {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_decode_json_ok() {
        let account: Account = decode_json("fetch", &reply(200, r#"{"id":"42"}"#)).unwrap();
        assert_eq!(account.id, "42");
    }

    #[test]
    fn test_decode_json_non_success_is_status_error() {
        let err = decode_json::<Account>("fetch", &reply(401, "denied")).unwrap_err();
        match err {
            AppError::Status { status, body, .. } => {
                assert_eq!(status, 401);
                assert_eq!(body, "denied");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_json_malformed_keeps_body() {
        let err = decode_json::<Account>("fetch", &reply(200, "not json")).unwrap_err();
        match err {
            AppError::Decode { body, .. } => assert_eq!(body, "not json"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_execute_honors_cancellation() {
        let client = create_client(&HttpConfig::default()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        // Unroutable address; the cancelled branch must win without a connect attempt finishing.
        let request = client.get("http://10.255.255.1:81/");
        let err = execute(request, &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
