//! Tokenization and the Markov chain model.
//!
//! The chain is keyed by the previous `state_size` tokens. Sentences are
//! padded with [`BEGIN`] on the left and terminated with [`END`], so a chain
//! built from a single sentence regenerates exactly that sentence.

mod tokenizer;

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

pub use tokenizer::{Tokenizer, WordTokenizer};

use crate::error::Result;

/// Sentence start padding.
pub const BEGIN: &str = "\u{2}";
/// Sentence terminator.
pub const END: &str = "\u{3}";

/// Hard stop for generation on cyclic chains.
const MAX_TOKENS: usize = 512;

type State = Vec<String>;

/// Successor counts of one state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Successors {
    tokens: Vec<String>,
    counts: Vec<u32>,
}

impl Successors {
    fn add(&mut self, token: &str) {
        match self.tokens.iter().position(|t| t == token) {
            Some(i) => self.counts[i] += 1,
            None => {
                self.tokens.push(token.to_string());
                self.counts.push(1);
            }
        }
    }

    fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        let total: u32 = self.counts.iter().sum();
        if total == 0 {
            return None;
        }
        let mut n = rng.gen_range(0..total);
        for (token, count) in self.tokens.iter().zip(&self.counts) {
            if n < *count {
                return Some(token.as_str());
            }
            n -= count;
        }
        None
    }
}

/// Serialized layout.
#[derive(Serialize, Deserialize)]
struct ChainData {
    state_size: usize,
    entries: Vec<(State, Successors)>,
}

/// A word-level Markov chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ChainData", into = "ChainData")]
pub struct Chain {
    state_size: usize,
    transitions: HashMap<State, Successors>,
}

impl TryFrom<ChainData> for Chain {
    type Error = String;

    fn try_from(data: ChainData) -> std::result::Result<Self, Self::Error> {
        if data.state_size == 0 {
            return Err("state_size must be > 0".to_string());
        }
        if let Some((state, _)) = data.entries.iter().find(|(s, _)| s.len() != data.state_size) {
            return Err(format!(
                "state of {} tokens in a chain of state_size {}",
                state.len(),
                data.state_size
            ));
        }
        Ok(Self {
            state_size: data.state_size,
            transitions: data.entries.into_iter().collect(),
        })
    }
}

impl From<Chain> for ChainData {
    fn from(chain: Chain) -> Self {
        let mut entries: Vec<_> = chain.transitions.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Self {
            state_size: chain.state_size,
            entries,
        }
    }
}

impl Chain {
    pub fn new(state_size: usize) -> Self {
        Self {
            state_size: state_size.max(1),
            transitions: HashMap::new(),
        }
    }

    /// Build a chain from already tokenized sentences.
    pub fn build<I>(state_size: usize, sentences: I) -> Self
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut chain = Self::new(state_size);
        for sentence in sentences {
            chain.add_sentence(&sentence);
        }
        chain
    }

    /// Record the transitions of one sentence. Empty sentences are ignored.
    pub fn add_sentence(&mut self, tokens: &[String]) {
        if tokens.is_empty() {
            return;
        }
        let mut state = self.initial_state();
        for token in tokens.iter().map(String::as_str).chain(std::iter::once(END)) {
            self.transitions
                .entry(state.clone())
                .or_default()
                .add(token);
            state.remove(0);
            state.push(token.to_string());
        }
    }

    pub fn state_size(&self) -> usize {
        self.state_size
    }

    /// Number of distinct states with at least one successor.
    pub fn state_count(&self) -> usize {
        self.transitions.len()
    }

    /// A chain without a start transition cannot produce any text.
    pub fn is_empty(&self) -> bool {
        !self.transitions.contains_key(&self.initial_state())
    }

    /// Walk the chain from the start state. `None` when nothing was produced.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Vec<String>> {
        let mut state = self.initial_state();
        let mut tokens = Vec::new();

        while tokens.len() < MAX_TOKENS {
            let Some(next) = self.transitions.get(&state).and_then(|s| s.pick(rng)) else {
                break;
            };
            if next == END {
                break;
            }
            tokens.push(next.to_string());
            state.remove(0);
            state.push(next.to_string());
        }

        (!tokens.is_empty()).then_some(tokens)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn initial_state(&self) -> State {
        vec![BEGIN.to_string(); self.state_size]
    }
}

/// Count tokens that contain a letter or digit.
pub fn word_count(tokens: &[String]) -> usize {
    tokens
        .iter()
        .filter(|t| t.chars().any(char::is_alphanumeric))
        .count()
}
