// src/pipeline/generate.rs

//! Text generation from the persisted model, and publishing.

use tokio_util::sync::CancellationToken;

use crate::blog::BlogClient;
use crate::error::{AppError, Result, ResultExt};
use crate::markov::{Chain, word_count};
use crate::storage::PersistentStore;

/// Generation attempts before settling for the wordiest candidate.
const MAX_ATTEMPTS: usize = 20;

/// Generate one text from the model in `store` and publish it via `client`.
///
/// Fails with [`AppError::GenerationFailed`] when no model is stored or the
/// model cannot produce any text. With `dry_run` the text is only logged.
/// Returns the generated text.
pub async fn generate_and_post(
    client: &dyn BlogClient,
    store: &dyn PersistentStore,
    min_words_count: usize,
    dry_run: bool,
    cancel: &CancellationToken,
) -> Result<String> {
    let bytes = store
        .load()
        .await
        .context("load model")?
        .ok_or(AppError::GenerationFailed)?;
    let chain = Chain::from_bytes(&bytes).context("decode model")?;

    let text = generate_text(&chain, min_words_count, &mut rand::thread_rng())
        .ok_or(AppError::GenerationFailed)?;

    if dry_run {
        log::info!("Dry run, not posting: {text}");
        return Ok(text);
    }

    client
        .create_post(&text, cancel)
        .await
        .context("create post")?;
    Ok(text)
}

/// First candidate with at least `min_words_count` words, otherwise the
/// wordiest one seen.
fn generate_text<R: rand::Rng + ?Sized>(
    chain: &Chain,
    min_words_count: usize,
    rng: &mut R,
) -> Option<String> {
    let mut best: Option<(usize, Vec<String>)> = None;

    for _ in 0..MAX_ATTEMPTS {
        let tokens = chain.generate(rng)?;
        let words = word_count(&tokens);
        if words >= min_words_count {
            return Some(tokens.concat().trim().to_string());
        }
        if best.as_ref().is_none_or(|(w, _)| words > *w) {
            best = Some((words, tokens));
        }
    }

    log::warn!("No candidate reached {min_words_count} words, using the longest");
    best.map(|(_, tokens)| tokens.concat().trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::markov::{Tokenizer, WordTokenizer};

    fn chain_of(sentences: &[&str]) -> Chain {
        Chain::build(2, sentences.iter().map(|s| WordTokenizer.tokenize(s)))
    }

    #[test]
    fn test_generate_text_single_sentence() {
        let chain = chain_of(&["hello there world"]);
        let text = generate_text(&chain, 1, &mut StdRng::seed_from_u64(3));
        assert_eq!(text.as_deref(), Some("hello there world"));
    }

    #[test]
    fn test_generate_text_falls_back_to_longest() {
        let chain = chain_of(&["short"]);
        let text = generate_text(&chain, 5, &mut StdRng::seed_from_u64(3));
        assert_eq!(text.as_deref(), Some("short"));
    }

    #[test]
    fn test_generate_text_empty_chain() {
        let chain = Chain::new(2);
        assert!(generate_text(&chain, 1, &mut StdRng::seed_from_u64(3)).is_none());
    }
}
