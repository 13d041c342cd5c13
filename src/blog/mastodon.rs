//! Mastodon API adapter.
//!
//! Paginates `/api/v1/accounts/{id}/statuses` with `max_id` (strictly older
//! than) and publishes through `/api/v1/statuses` with a form body.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::blog::{BlogClient, Page, PageApi, Pager, PostsFetcher};
use crate::error::{Result, ResultExt};
use crate::utils::http::{self, Reply};
use crate::utils::{endpoint, text};

/// Statuses requested per page.
pub const PAGE_SIZE: usize = 100;

/// Status visibility vocabulary of Mastodon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MastodonVisibility {
    Public,
    Unlisted,
    Private,
    Direct,
    /// Any value added by a newer server version
    #[serde(other)]
    Unknown,
}

impl MastodonVisibility {
    /// Whether statuses with this visibility must stay out of the model.
    pub fn is_restricted(self) -> bool {
        matches!(self, Self::Private | Self::Direct)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Unlisted => "unlisted",
            Self::Private => "private",
            Self::Direct => "direct",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Deserialize)]
struct Account {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Status {
    id: String,
    #[serde(default)]
    content: String,
    visibility: MastodonVisibility,
}

#[derive(Debug, Deserialize)]
struct CreatedStatus {
    id: String,
}

/// Client for one Mastodon account.
pub struct MastodonClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
    post_visibility: MastodonVisibility,
    page_size: usize,
}

impl MastodonClient {
    /// Create a client for `https://{domain}`.
    pub fn new(
        client: reqwest::Client,
        domain: &str,
        access_token: impl Into<String>,
        post_visibility: MastodonVisibility,
    ) -> Self {
        Self {
            client,
            base_url: format!("https://{domain}"),
            access_token: access_token.into(),
            post_visibility,
            page_size: PAGE_SIZE,
        }
    }

    /// Point the client at a different origin, e.g. a local test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Start a pull session with direct access to its cursor.
    pub fn pager(&self, cancel: CancellationToken) -> Pager<'_, Self> {
        Pager::new(self, cancel)
    }

    async fn get(&self, path: &str, query: &[(&str, String)], cancel: &CancellationToken) -> Result<Reply> {
        let url = endpoint(&self.base_url, path)?;
        let request = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(query);
        http::execute(request, cancel).await
    }
}

/// Keep the plain text of every non-restricted status; the cursor comes
/// from the last raw status.
fn into_page(statuses: Vec<Status>) -> Page {
    let last_id = statuses.last().map(|s| s.id.clone());
    let posts = statuses
        .into_iter()
        .filter(|s| !s.visibility.is_restricted())
        .map(|s| text::to_plain_text(&s.content))
        .collect();
    Page { posts, last_id }
}

#[async_trait]
impl PageApi for MastodonClient {
    async fn fetch_account_id(&self, cancel: &CancellationToken) -> Result<String> {
        let reply = self
            .get("/api/v1/accounts/verify_credentials", &[], cancel)
            .await
            .context("get account details")?;
        let account: Account = http::decode_json("verify credentials", &reply)?;
        Ok(account.id)
    }

    async fn fetch_page(
        &self,
        account_id: &str,
        cursor: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Page> {
        let mut query = vec![
            ("limit", self.page_size.to_string()),
            ("exclude_reblogs", "1".to_string()),
            ("exclude_replies", "1".to_string()),
        ];
        if let Some(max_id) = cursor {
            query.push(("max_id", max_id.to_string()));
        }

        let path = format!("/api/v1/accounts/{account_id}/statuses");
        let reply = self
            .get(&path, &query, cancel)
            .await
            .context("get statuses")?;
        let statuses: Vec<Status> = http::decode_json("get statuses", &reply)?;
        let raw_count = statuses.len();
        let page = into_page(statuses);
        log::info!(
            "Mastodon page: {} statuses, {} public",
            raw_count,
            page.posts.len()
        );
        Ok(page)
    }
}

#[async_trait]
impl BlogClient for MastodonClient {
    fn posts_fetcher(&self, cancel: CancellationToken) -> Box<dyn PostsFetcher + '_> {
        Box::new(self.pager(cancel))
    }

    async fn create_post(&self, payload: &str, cancel: &CancellationToken) -> Result<()> {
        let url = endpoint(&self.base_url, "/api/v1/statuses")?;
        let form = [
            ("status", payload),
            ("visibility", self.post_visibility.as_str()),
        ];
        let request = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .form(&form);

        let reply = http::execute(request, cancel).await.context("post status")?;
        let created: CreatedStatus = http::decode_json("post status", &reply)?;
        log::info!("Posted status {} to {}", created.id, self.base_url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(id: &str, content: &str, visibility: MastodonVisibility) -> Status {
        Status {
            id: id.into(),
            content: content.into(),
            visibility,
        }
    }

    #[test]
    fn test_restricted_visibilities() {
        assert!(!MastodonVisibility::Public.is_restricted());
        assert!(!MastodonVisibility::Unlisted.is_restricted());
        assert!(MastodonVisibility::Private.is_restricted());
        assert!(MastodonVisibility::Direct.is_restricted());
        assert!(!MastodonVisibility::Unknown.is_restricted());
    }

    #[test]
    fn test_unknown_visibility_deserializes() {
        let status: Status =
            serde_json::from_str(r#"{"id":"1","content":"x","visibility":"local"}"#).unwrap();
        assert_eq!(status.visibility, MastodonVisibility::Unknown);
    }

    #[test]
    fn test_into_page_filters_but_keeps_raw_cursor() {
        let page = into_page(vec![
            status("30", "<p>hello</p>", MastodonVisibility::Public),
            status("20", "<p>secret</p>", MastodonVisibility::Private),
            status("10", "<p>dm</p>", MastodonVisibility::Direct),
        ]);
        assert_eq!(page.posts, vec!["hello"]);
        assert_eq!(page.last_id.as_deref(), Some("10"));
    }

    #[test]
    fn test_into_page_empty() {
        let page = into_page(Vec::new());
        assert!(page.posts.is_empty());
        assert!(page.last_id.is_none());
    }
}
