//! In-memory storage, for tests and throwaway runs.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::storage::PersistentStore;

#[derive(Debug)]
struct Blob {
    data: Vec<u8>,
    modified: DateTime<Utc>,
}

/// A blob held in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blob: Mutex<Option<Blob>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `data`, last written at `modified`.
    pub fn with_blob(data: impl Into<Vec<u8>>, modified: DateTime<Utc>) -> Self {
        Self {
            blob: Mutex::new(Some(Blob {
                data: data.into(),
                modified,
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Blob>> {
        self.blob.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl PersistentStore for MemoryStore {
    async fn load(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.lock().as_ref().map(|b| b.data.clone()))
    }

    async fn mod_time(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.lock().as_ref().map(|b| b.modified))
    }

    async fn save(&self, data: &[u8]) -> Result<()> {
        *self.lock() = Some(Blob {
            data: data.to_vec(),
            modified: Utc::now(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_store_has_no_freshness_record() {
        let store = MemoryStore::new();
        assert!(store.load().await.unwrap().is_none());
        assert!(store.mod_time().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_replaces_blob() {
        let old = Utc::now() - chrono::Duration::days(3);
        let store = MemoryStore::with_blob("old", old);
        assert_eq!(store.mod_time().await.unwrap(), Some(old));

        store.save(b"new").await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(b"new".to_vec()));
        assert!(store.mod_time().await.unwrap().unwrap() > old);
    }
}
