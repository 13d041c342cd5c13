// src/lib.rs

//! markov-bot library
//!
//! Pulls a fediverse account's public posts, keeps a Markov chain model of
//! them reasonably fresh, and republishes generated text.

pub mod blog;
pub mod config;
pub mod error;
#[cfg(feature = "lambda")]
pub mod lambda;
pub mod markov;
pub mod models;
pub mod pipeline;
pub mod storage;
pub mod utils;
