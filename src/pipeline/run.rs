// src/pipeline/run.rs

//! One scheduled bot invocation: rebuild the model if it is stale, then
//! generate and publish one post.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio_util::sync::CancellationToken;

use crate::blog::{self, BlogClient};
use crate::error::{Result, ResultExt};
use crate::markov::Tokenizer;
use crate::models::{BotConfig, ChainConfig};
use crate::pipeline::build::{BuildSummary, build_chain};
use crate::pipeline::generate::generate_and_post;
use crate::storage::PersistentStore;

/// Age class of the persisted model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Never built
    Missing,
    /// Younger than the expiry window
    Fresh,
    /// At least as old as the expiry window
    Stale,
}

impl Freshness {
    pub fn classify(modified: Option<DateTime<Utc>>, now: DateTime<Utc>, expires_in: Duration) -> Self {
        match modified {
            None => Self::Missing,
            Some(modified) if now - modified >= expires_in => Self::Stale,
            Some(_) => Self::Fresh,
        }
    }

    pub fn needs_build(self) -> bool {
        !matches!(self, Self::Fresh)
    }
}

impl fmt::Display for Freshness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Missing => "missing",
            Self::Fresh => "fresh",
            Self::Stale => "stale",
        })
    }
}

/// What happened to the model during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The model was fresh
    Skipped,
    /// A new model was saved
    Rebuilt(BuildSummary),
    /// The refresh failed and the previous model was used
    Kept { error: String },
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub freshness: Freshness,
    pub build: BuildOutcome,
    /// Generated text, published unless dry run
    pub text: String,
}

/// Clients and settings for a run.
pub struct Bot {
    pub fetch_client: Arc<dyn BlogClient>,
    pub post_client: Arc<dyn BlogClient>,
    pub chain: ChainConfig,
    pub dry_run: bool,
}

impl Bot {
    /// Build the configured adapters.
    pub fn from_config(config: &BotConfig) -> Result<Self> {
        Ok(Self {
            fetch_client: blog::new_client(&config.fetch_client, &config.http)?,
            post_client: blog::new_client(config.post_client(), &config.http)?,
            chain: config.chain.clone(),
            dry_run: config.dry_run,
        })
    }

    fn expires_in(&self) -> Duration {
        i64::try_from(self.chain.expires_in)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }
}

/// Run the bot once.
///
/// The model is rebuilt when it is missing or stale. A failed rebuild is
/// fatal only if there is no earlier model to fall back on; cancellation
/// always is. Generation failures and publish errors are always returned.
pub async fn run(
    bot: &Bot,
    tokenizer: &dyn Tokenizer,
    store: &dyn PersistentStore,
    cancel: &CancellationToken,
) -> Result<RunReport> {
    let modified = store.mod_time().await.context("get modtime")?;
    let freshness = Freshness::classify(modified, Utc::now(), bot.expires_in());
    log::info!("Model is {freshness}");

    let build = if freshness.needs_build() {
        let mut fetcher = bot.fetch_client.posts_fetcher(cancel.clone());
        let result = build_chain(
            fetcher.as_mut(),
            tokenizer,
            bot.chain.fetch_status_count,
            bot.chain.state_size,
            store,
        )
        .await;

        match result {
            Ok(summary) => BuildOutcome::Rebuilt(summary),
            Err(e) if freshness == Freshness::Stale && !e.is_cancelled() => {
                log::warn!("Rebuilding model failed, using the existing one: {e}");
                BuildOutcome::Kept {
                    error: e.to_string(),
                }
            }
            Err(e) => return Err(e.context("build chain")),
        }
    } else {
        BuildOutcome::Skipped
    };

    let text = generate_and_post(
        bot.post_client.as_ref(),
        store,
        bot.chain.min_words_count,
        bot.dry_run,
        cancel,
    )
    .await
    .context("generate and post")?;

    Ok(RunReport {
        freshness,
        build,
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let now = Utc::now();
        let hour = Duration::hours(1);

        assert_eq!(Freshness::classify(None, now, hour), Freshness::Missing);
        assert_eq!(
            Freshness::classify(Some(now - Duration::minutes(59)), now, hour),
            Freshness::Fresh
        );
        assert_eq!(
            Freshness::classify(Some(now - hour), now, hour),
            Freshness::Stale
        );
        assert_eq!(
            Freshness::classify(Some(now), now, Duration::zero()),
            Freshness::Stale
        );
    }

    #[test]
    fn test_needs_build() {
        assert!(Freshness::Missing.needs_build());
        assert!(Freshness::Stale.needs_build());
        assert!(!Freshness::Fresh.needs_build());
    }
}
