//! Platform-neutral access to a microblog account.
//!
//! A [`BlogClient`] is both a source and a sink:
//!
//! - [`BlogClient::posts_fetcher`] opens a pull session that yields the
//!   account's public posts newest first, one [`Chunk`] per round trip.
//! - [`BlogClient::create_post`] publishes a single text.
//!
//! Adapters implement [`PageApi`] and get the session behavior from
//! [`Pager`], so every platform shares the same cursor and termination rules.

pub mod mastodon;
pub mod ohagi;
mod pager;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::models::{ClientConfig, HttpConfig};
use crate::utils::http;

pub use mastodon::MastodonClient;
pub use ohagi::OhagiClient;
pub use pager::{Page, PageApi, Pager};

/// Plain-text posts returned by one pull call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    /// Post bodies in the platform's order, markup removed
    pub items: Vec<String>,
    /// Whether another call may yield more posts
    pub has_more: bool,
}

impl Chunk {
    /// The terminal value of an exhausted session.
    pub fn end() -> Self {
        Self::default()
    }
}

/// A forward-only pull session over an account's posts.
///
/// Once a call returns `has_more == false`, every later call returns
/// [`Chunk::end`] without touching the network. A chunk may be empty while
/// `has_more` is still true.
#[async_trait]
pub trait PostsFetcher: Send {
    async fn next_chunk(&mut self) -> Result<Chunk>;
}

/// Source and sink of posts on one platform account.
#[async_trait]
pub trait BlogClient: Send + Sync {
    /// Start a new pull session. Requests made by it abort when `cancel` fires.
    fn posts_fetcher(&self, cancel: CancellationToken) -> Box<dyn PostsFetcher + '_>;

    /// Publish `payload` with the configured visibility.
    async fn create_post(&self, payload: &str, cancel: &CancellationToken) -> Result<()>;
}

/// Build the adapter selected by `config`.
pub fn new_client(config: &ClientConfig, http_config: &HttpConfig) -> Result<Arc<dyn BlogClient>> {
    let client = http::create_client(http_config)?;
    let blog: Arc<dyn BlogClient> = match config {
        ClientConfig::Mastodon {
            domain,
            access_token,
            post_visibility,
        } => Arc::new(MastodonClient::new(
            client,
            domain,
            access_token,
            *post_visibility,
        )),
        ClientConfig::Ohagi {
            origin,
            access_token,
            post_visibility,
        } => Arc::new(OhagiClient::new(
            client,
            origin,
            access_token,
            *post_visibility,
        )),
    };
    Ok(blog)
}
