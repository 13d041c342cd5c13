//! Blob persistence for the model and the bot configuration.
//!
//! A store holds exactly one blob. Its modification time is the freshness
//! record the pipeline uses to decide whether the model must be rebuilt.

pub mod local;
pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStore;
pub use memory::MemoryStore;
#[cfg(feature = "s3")]
pub use s3::S3Store;

/// A single persisted blob.
#[async_trait]
pub trait PersistentStore: Send + Sync {
    /// Read the blob, `None` if it was never written.
    async fn load(&self) -> Result<Option<Vec<u8>>>;

    /// Last successful write time, `None` if the blob does not exist.
    async fn mod_time(&self) -> Result<Option<DateTime<Utc>>>;

    /// Replace the blob and refresh its modification time.
    async fn save(&self, data: &[u8]) -> Result<()>;
}
