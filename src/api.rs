use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::error::{ApiError, ApiResult};
use crate::models::*;

/// Queries must be at least this long before `/users/search` is called.
pub const MIN_SEARCH_LEN: usize = 2;

#[async_trait]
pub trait PostsApi: Send + Sync {
    async fn list_posts(&self, filter: &PostFilter) -> ApiResult<Vec<Post>>;
    async fn create_post(&self, new: NewPost) -> ApiResult<Post>;
    async fn cast_vote(&self, post_id: &str, kind: VoteKind) -> ApiResult<VoteReceipt>;
    async fn list_comments(&self, post_id: &str) -> ApiResult<Vec<Comment>>;
    async fn create_comment(&self, post_id: &str, content: &str) -> ApiResult<Comment>;
}

#[async_trait]
pub trait GroupsApi: Send + Sync {
    async fn list_groups(&self) -> ApiResult<Vec<GroupPerformance>>;
}

#[async_trait]
pub trait MessagingApi: Send + Sync {
    async fn list_conversations(&self) -> ApiResult<Vec<Conversation>>;
    /// Get-or-create; the backend guarantees one conversation per pair.
    async fn open_conversation(&self, other_user_id: &str) -> ApiResult<Conversation>;
    async fn list_messages(&self, conversation_id: &str) -> ApiResult<Vec<Message>>;
    async fn send_message(&self, new: NewMessage) -> ApiResult<Message>;
    async fn search_users(&self, query: &str) -> ApiResult<Vec<User>>;
    async fn special_accounts(&self) -> ApiResult<Vec<User>>;
}

pub trait Api: PostsApi + GroupsApi + MessagingApi {}

impl<T> Api for T where T: PostsApi + GroupsApi + MessagingApi {}

/// Bearer-token HTTP client for the platform REST backend.
///
/// `base_url` must include the `/api` prefix, e.g. `https://host/api`.
#[derive(Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, req: RequestBuilder) -> ApiResult<RequestBuilder> {
        match &self.token {
            Some(t) => Ok(req.bearer_auth(t)),
            None => Err(ApiError::Auth),
        }
    }

    async fn expect_json<T: DeserializeOwned>(req: RequestBuilder) -> ApiResult<T> {
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16()));
        }
        Ok(resp.json::<T>().await?)
    }
}

#[async_trait]
impl PostsApi for HttpApi {
    async fn list_posts(&self, filter: &PostFilter) -> ApiResult<Vec<Post>> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(c) = filter.category {
            params.push(("category", c.as_str().to_string()));
        }
        if let Some(t) = filter.target_group_type {
            params.push(("target_group_type", t.as_str().to_string()));
        }
        if let Some(n) = &filter.target_group_name {
            params.push(("target_group_name", n.clone()));
        }
        let req = self.client.get(self.url("/posts")).query(&params);
        Self::expect_json(req).await
    }

    async fn create_post(&self, new: NewPost) -> ApiResult<Post> {
        let req = self.authed(self.client.post(self.url("/posts")))?.json(&new);
        Self::expect_json(req).await
    }

    async fn cast_vote(&self, post_id: &str, kind: VoteKind) -> ApiResult<VoteReceipt> {
        let path = format!("/posts/{}/{}", post_id, kind.endpoint());
        let req = self.authed(self.client.post(self.url(&path)))?;
        Self::expect_json(req).await
    }

    async fn list_comments(&self, post_id: &str) -> ApiResult<Vec<Comment>> {
        let req = self.client.get(self.url(&format!("/posts/{post_id}/comments")));
        Self::expect_json(req).await
    }

    async fn create_comment(&self, post_id: &str, content: &str) -> ApiResult<Comment> {
        let req = self
            .authed(self.client.post(self.url(&format!("/posts/{post_id}/comments"))))?
            .json(&serde_json::json!({ "content": content }));
        Self::expect_json(req).await
    }
}

#[async_trait]
impl GroupsApi for HttpApi {
    async fn list_groups(&self) -> ApiResult<Vec<GroupPerformance>> {
        Self::expect_json(self.client.get(self.url("/groups"))).await
    }
}

#[async_trait]
impl MessagingApi for HttpApi {
    async fn list_conversations(&self) -> ApiResult<Vec<Conversation>> {
        let req = self.authed(self.client.get(self.url("/conversations")))?;
        Self::expect_json(req).await
    }

    async fn open_conversation(&self, other_user_id: &str) -> ApiResult<Conversation> {
        let req = self
            .authed(self.client.post(self.url("/conversations")))?
            .query(&[("other_user_id", other_user_id)]);
        Self::expect_json(req).await
    }

    async fn list_messages(&self, conversation_id: &str) -> ApiResult<Vec<Message>> {
        let path = format!("/conversations/{conversation_id}/messages");
        let req = self.authed(self.client.get(self.url(&path)))?;
        Self::expect_json(req).await
    }

    async fn send_message(&self, new: NewMessage) -> ApiResult<Message> {
        let req = self.authed(self.client.post(self.url("/messages")))?.json(&new);
        Self::expect_json(req).await
    }

    async fn search_users(&self, query: &str) -> ApiResult<Vec<User>> {
        let path = format!("/users/search?q={}", urlencoding::encode(query));
        let req = self.authed(self.client.get(self.url(&path)))?;
        Self::expect_json(req).await
    }

    async fn special_accounts(&self) -> ApiResult<Vec<User>> {
        let req = self.authed(self.client.get(self.url("/users/special-accounts")))?;
        Self::expect_json(req).await
    }
}
