// src/config.rs

//! Configuration loading utilities.
//!
//! The same TOML document can come from a local file or from any
//! [`PersistentStore`], e.g. an S3 object next to the model.

use crate::error::{AppError, Result, ResultExt};
use crate::models::BotConfig;
use crate::storage::PersistentStore;

/// Load and validate the bot configuration held by `store`.
pub async fn load_config(store: &dyn PersistentStore) -> Result<BotConfig> {
    let bytes = store
        .load()
        .await
        .context("load config")?
        .ok_or_else(|| AppError::config("config file not found"))?;

    let text = String::from_utf8(bytes)
        .map_err(|e| AppError::config(format!("config file is not valid UTF-8: {e}")))?;
    let config = BotConfig::from_toml(&text).context("load bot config")?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn test_load_config_from_store() {
        let toml = r#"
dry_run = true

[fetch_client]
platform = "ohagi"
origin = "https://ohagi.example"
access_token = "token"
"#;
        let store = MemoryStore::with_blob(toml, Utc::now());
        let config = load_config(&store).await.unwrap();
        assert!(config.dry_run);
    }

    #[tokio::test]
    async fn test_missing_config_is_an_error() {
        let err = load_config(&MemoryStore::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_malformed_config_names_operation() {
        let store = MemoryStore::with_blob("fetch_client = 3", Utc::now());
        let err = load_config(&store).await.unwrap_err();
        assert!(err.to_string().starts_with("load bot config: "));
    }
}
