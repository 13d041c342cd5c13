// src/pipeline/build.rs

//! Model building from an account's posts.

use crate::blog::PostsFetcher;
use crate::error::{Result, ResultExt};
use crate::markov::{Chain, Tokenizer};
use crate::storage::PersistentStore;

/// What a successful build produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    /// Posts fed to the chain
    pub post_count: usize,
    /// Pull calls made
    pub chunk_count: usize,
    /// Distinct chain states
    pub state_count: usize,
}

/// Drain `fetcher`, build a chain from up to `fetch_status_count` posts and
/// save it to `store`.
///
/// Any fetch error aborts the build before the store is touched.
pub async fn build_chain(
    fetcher: &mut dyn PostsFetcher,
    tokenizer: &dyn Tokenizer,
    fetch_status_count: usize,
    state_size: usize,
    store: &dyn PersistentStore,
) -> Result<BuildSummary> {
    let mut posts: Vec<String> = Vec::new();
    let mut chunk_count = 0;

    while posts.len() < fetch_status_count {
        let chunk = fetcher.next_chunk().await?;
        chunk_count += 1;
        posts.extend(chunk.items);
        if !chunk.has_more {
            break;
        }
    }
    posts.truncate(fetch_status_count);

    log::info!(
        "Collected {} posts in {} chunks",
        posts.len(),
        chunk_count
    );

    let chain = Chain::build(state_size, posts.iter().map(|p| tokenizer.tokenize(p)));
    let bytes = chain.to_bytes()?;
    store.save(&bytes).await.context("save model")?;

    log::info!(
        "Saved model: {} states from {} posts",
        chain.state_count(),
        posts.len()
    );

    Ok(BuildSummary {
        post_count: posts.len(),
        chunk_count,
        state_count: chain.state_count(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;

    use super::*;
    use crate::blog::Chunk;
    use crate::error::AppError;
    use crate::markov::WordTokenizer;
    use crate::storage::MemoryStore;

    struct ScriptedFetcher {
        chunks: VecDeque<Result<Chunk>>,
        calls: usize,
    }

    impl ScriptedFetcher {
        fn new(chunks: Vec<Result<Chunk>>) -> Self {
            Self {
                chunks: chunks.into(),
                calls: 0,
            }
        }
    }

    #[async_trait]
    impl PostsFetcher for ScriptedFetcher {
        async fn next_chunk(&mut self) -> Result<Chunk> {
            self.calls += 1;
            self.chunks.pop_front().unwrap_or_else(|| Ok(Chunk::end()))
        }
    }

    fn chunk(items: &[&str], has_more: bool) -> Result<Chunk> {
        Ok(Chunk {
            items: items.iter().map(|s| s.to_string()).collect(),
            has_more,
        })
    }

    #[tokio::test]
    async fn test_drains_until_no_more() {
        let mut fetcher = ScriptedFetcher::new(vec![
            chunk(&["one post"], true),
            chunk(&[], true),
            chunk(&["two post"], true),
            chunk(&[], false),
        ]);
        let store = MemoryStore::new();

        let summary = build_chain(&mut fetcher, &WordTokenizer, 100, 2, &store)
            .await
            .unwrap();
        assert_eq!(summary.post_count, 2);
        assert_eq!(summary.chunk_count, 4);
        assert_eq!(fetcher.calls, 4);

        let chain = Chain::from_bytes(&store.load().await.unwrap().unwrap()).unwrap();
        assert!(!chain.is_empty());
    }

    #[tokio::test]
    async fn test_stops_at_fetch_status_count() {
        let mut fetcher = ScriptedFetcher::new(vec![
            chunk(&["a", "b", "c"], true),
            chunk(&["d"], true),
        ]);
        let store = MemoryStore::new();

        let summary = build_chain(&mut fetcher, &WordTokenizer, 2, 1, &store)
            .await
            .unwrap();
        assert_eq!(summary.post_count, 2);
        assert_eq!(fetcher.calls, 1);
    }

    #[tokio::test]
    async fn test_no_posts_saves_empty_model() {
        let mut fetcher = ScriptedFetcher::new(vec![]);
        let store = MemoryStore::new();

        let summary = build_chain(&mut fetcher, &WordTokenizer, 10, 2, &store)
            .await
            .unwrap();
        assert_eq!(summary.post_count, 0);

        let chain = Chain::from_bytes(&store.load().await.unwrap().unwrap()).unwrap();
        assert!(chain.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_error_leaves_store_untouched() {
        let mut fetcher = ScriptedFetcher::new(vec![
            chunk(&["fine"], true),
            Err(AppError::Cancelled),
        ]);
        let store = MemoryStore::new();

        let err = build_chain(&mut fetcher, &WordTokenizer, 10, 2, &store)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(store.mod_time().await.unwrap().is_none());
    }
}
