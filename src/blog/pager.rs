//! Cursor-threaded pull session shared by the platform adapters.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::blog::{Chunk, PostsFetcher};
use crate::error::{Result, ResultExt};

/// One raw page after visibility filtering.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Kept post bodies, already converted to plain text
    pub posts: Vec<String>,
    /// Pagination id of the last raw item, `None` when the raw page was empty
    pub last_id: Option<String>,
}

/// The two requests a platform must answer to be paged through.
#[async_trait]
pub trait PageApi: Send + Sync {
    /// Resolve the authenticated account's id.
    async fn fetch_account_id(&self, cancel: &CancellationToken) -> Result<String>;

    /// Fetch posts strictly older than `cursor`, or the newest page when `None`.
    async fn fetch_page(
        &self,
        account_id: &str,
        cursor: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Page>;
}

/// Pull session state: resolved identity, cursor and exhaustion flag.
pub struct Pager<'a, A: PageApi + ?Sized> {
    api: &'a A,
    cancel: CancellationToken,
    account_id: Option<String>,
    cursor: Option<String>,
    exhausted: bool,
}

impl<'a, A: PageApi + ?Sized> Pager<'a, A> {
    pub fn new(api: &'a A, cancel: CancellationToken) -> Self {
        Self {
            api,
            cancel,
            account_id: None,
            cursor: None,
            exhausted: false,
        }
    }

    /// Pagination id the next request will start from.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    async fn account_id(&mut self) -> Result<String> {
        if let Some(id) = &self.account_id {
            return Ok(id.clone());
        }
        let id = self
            .api
            .fetch_account_id(&self.cancel)
            .await
            .context("fetch user id")?;
        log::debug!("Resolved account id {id}");
        self.account_id = Some(id.clone());
        Ok(id)
    }
}

#[async_trait]
impl<A: PageApi + ?Sized> PostsFetcher for Pager<'_, A> {
    async fn next_chunk(&mut self) -> Result<Chunk> {
        if self.exhausted {
            return Ok(Chunk::end());
        }

        let account_id = self.account_id().await?;
        let page = self
            .api
            .fetch_page(&account_id, self.cursor.as_deref(), &self.cancel)
            .await
            .context("fetch page")?;

        match page.last_id {
            // The cursor follows the raw page, so pages whose posts were all
            // filtered out still move the session forward.
            Some(last_id) => {
                log::debug!(
                    "Fetched page: {} kept, next cursor {}",
                    page.posts.len(),
                    last_id
                );
                self.cursor = Some(last_id);
                Ok(Chunk {
                    items: page.posts,
                    has_more: true,
                })
            }
            None => {
                log::debug!("Reached the end of the timeline");
                self.exhausted = true;
                Ok(Chunk::end())
            }
        }
    }
}
