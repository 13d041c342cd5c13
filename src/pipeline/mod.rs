//! Pipeline entry points for bot operations.
//!
//! - `build_chain`: Pull an account's posts and save a new model
//! - `generate_and_post`: Generate one text from the model and publish it
//! - `run`: Rebuild the model when stale, then generate and publish

pub mod build;
pub mod generate;
pub mod run;

pub use build::{BuildSummary, build_chain};
pub use generate::generate_and_post;
pub use run::{Bot, BuildOutcome, Freshness, RunReport, run};
