//! Ohagi API adapter.
//!
//! Paginates `/api/v1/accounts/{id}/posts` with `lt_id` over each post's
//! `pagination_id`, and publishes through `/api/v1/posts` with a JSON body.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::blog::{BlogClient, Page, PageApi, Pager, PostsFetcher};
use crate::error::{Result, ResultExt};
use crate::utils::http::{self, Reply};
use crate::utils::{endpoint, text};

/// Tag appended to every published post.
pub const BOT_TAG: &str = "#bot";

/// Post visibility vocabulary of Ohagi.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OhagiVisibility {
    Public,
    SemiPublic,
    FollowersOnly,
    Direct,
    #[serde(other)]
    Unknown,
}

impl OhagiVisibility {
    /// Whether posts with this visibility must stay out of the model.
    pub fn is_restricted(self) -> bool {
        matches!(self, Self::FollowersOnly | Self::Direct)
    }
}

#[derive(Debug, Deserialize)]
struct CredentialAccount {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Post {
    pagination_id: String,
    #[serde(default)]
    content: String,
    visibility: OhagiVisibility,
}

#[derive(Debug, Serialize)]
struct NewPost<'a> {
    text: String,
    visibility: &'a OhagiVisibility,
}

/// Client for one Ohagi account.
pub struct OhagiClient {
    client: reqwest::Client,
    origin: String,
    access_token: String,
    post_visibility: OhagiVisibility,
}

impl OhagiClient {
    pub fn new(
        client: reqwest::Client,
        origin: impl Into<String>,
        access_token: impl Into<String>,
        post_visibility: OhagiVisibility,
    ) -> Self {
        Self {
            client,
            origin: origin.into(),
            access_token: access_token.into(),
            post_visibility,
        }
    }

    pub fn pager(&self, cancel: CancellationToken) -> Pager<'_, Self> {
        Pager::new(self, cancel)
    }

    async fn get(&self, path: &str, query: &[(&str, &str)], cancel: &CancellationToken) -> Result<Reply> {
        let url = endpoint(&self.origin, path)?;
        let request = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(query);
        http::execute(request, cancel).await
    }
}

fn into_page(posts: Vec<Post>) -> Page {
    let last_id = posts.last().map(|p| p.pagination_id.clone());
    let posts = posts
        .into_iter()
        .filter(|p| !p.visibility.is_restricted())
        .map(|p| text::to_plain_text(&p.content))
        .collect();
    Page { posts, last_id }
}

#[async_trait]
impl PageApi for OhagiClient {
    async fn fetch_account_id(&self, cancel: &CancellationToken) -> Result<String> {
        let reply = self
            .get("/api/v1/session/credential_account", &[], cancel)
            .await
            .context("get credential account")?;
        let account: CredentialAccount = http::decode_json("credential account", &reply)?;
        Ok(account.id)
    }

    async fn fetch_page(
        &self,
        account_id: &str,
        cursor: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Page> {
        let mut query = vec![
            ("order", "desc"),
            ("exclude_replies", "true"),
            ("exclude_reblogs", "true"),
        ];
        if let Some(lt_id) = cursor {
            query.push(("lt_id", lt_id));
        }

        let path = format!("/api/v1/accounts/{account_id}/posts");
        let reply = self.get(&path, &query, cancel).await.context("get posts")?;
        let posts: Vec<Post> = http::decode_json("get posts", &reply)?;
        let raw_count = posts.len();
        let page = into_page(posts);
        log::info!("Ohagi page: {} posts, {} public", raw_count, page.posts.len());
        Ok(page)
    }
}

#[async_trait]
impl BlogClient for OhagiClient {
    fn posts_fetcher(&self, cancel: CancellationToken) -> Box<dyn PostsFetcher + '_> {
        Box::new(self.pager(cancel))
    }

    async fn create_post(&self, payload: &str, cancel: &CancellationToken) -> Result<()> {
        let url = endpoint(&self.origin, "/api/v1/posts")?;
        let body = NewPost {
            text: format!("{payload} {BOT_TAG}"),
            visibility: &self.post_visibility,
        };
        let request = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&body);

        let reply = http::execute(request, cancel).await.context("post status")?;
        http::ensure_success("post status", &reply)?;
        log::info!("Posted to {}", self.origin);
        Ok(())
    }
}
