//! AWS S3 storage implementation.
//!
//! Each store maps to one object `s3://{bucket}/{key}`. The object's
//! `Last-Modified` header is the freshness record.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::storage::PersistentStore;

/// One S3 object.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
    key: String,
}

impl S3Store {
    /// Create a new S3 store instance.
    pub fn new(client: Client, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Create an S3 client for `region` from the default credential chain.
    pub async fn client_for_region(region: &str) -> Client {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;
        Client::new(&config)
    }

    /// Another object in the same bucket.
    pub fn with_key(&self, key: impl Into<String>) -> Self {
        Self {
            client: self.client.clone(),
            bucket: self.bucket.clone(),
            key: key.into(),
        }
    }

    pub fn location(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

#[async_trait]
impl PersistentStore for S3Store {
    async fn load(&self) -> Result<Option<Vec<u8>>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| AppError::S3(e.to_string()))?;
                Ok(Some(bytes.into_bytes().to_vec()))
            }
            Err(err) => {
                // Check if it's a "not found" error
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    log::info!("No existing object at {}", self.location());
                    Ok(None)
                } else {
                    Err(AppError::S3(service_err.to_string()))
                }
            }
        }
    }

    async fn mod_time(&self) -> Result<Option<DateTime<Utc>>> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let modified = output.last_modified().ok_or_else(|| {
                    AppError::S3(format!("{} has no Last-Modified", self.location()))
                })?;
                let modified = DateTime::from_timestamp(modified.secs(), modified.subsec_nanos())
                    .ok_or_else(|| {
                        AppError::S3(format!("{} has an invalid Last-Modified", self.location()))
                    })?;
                Ok(Some(modified))
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_not_found() {
                    Ok(None)
                } else {
                    Err(AppError::S3(service_err.to_string()))
                }
            }
        }
    }

    async fn save(&self, data: &[u8]) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(|e| AppError::S3(e.to_string()))?;

        log::info!("Wrote {} bytes to {}", data.len(), self.location());
        Ok(())
    }
}
