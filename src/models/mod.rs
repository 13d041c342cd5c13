// src/models/mod.rs

//! Configuration models for the bot.

mod config;

// Re-export all public types
pub use config::{BotConfig, ChainConfig, ClientConfig, HttpConfig};
