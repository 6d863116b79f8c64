use std::sync::Arc;

use dashmap::DashMap;

use crate::api::PostsApi;
use crate::cache::EntityCache;
use crate::error::{ApiError, ApiResult};
use crate::models::{Comment, Id};
use crate::notify::{Notice, Notifier};

/// Lazy-loading comment lists with per-post expand/collapse state.
///
/// A post's comments are fetched once, on first expansion; collapsing and
/// re-expanding only flips UI state. Newly posted comments are appended to
/// the cached list and bump the post's advisory count.
pub struct CommentStream<A: PostsApi + ?Sized> {
    cache: Arc<EntityCache>,
    api: Arc<A>,
    notifier: Arc<dyn Notifier>,
    expanded: DashMap<Id, bool>,
}

impl<A: PostsApi + ?Sized> CommentStream<A> {
    pub fn new(cache: Arc<EntityCache>, api: Arc<A>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            cache,
            api,
            notifier,
            expanded: DashMap::new(),
        }
    }

    pub fn is_expanded(&self, post_id: &str) -> bool {
        self.expanded.get(post_id).map(|v| *v).unwrap_or(false)
    }

    /// Toggles the comment section for a post, fetching the list the first
    /// time it is opened. Returns the new expanded state.
    pub async fn expand(&self, post_id: &str) -> bool {
        if self.is_expanded(post_id) {
            self.expanded.insert(post_id.to_string(), false);
            return false;
        }
        self.expanded.insert(post_id.to_string(), true);
        if !self.cache.comments_loaded(post_id) {
            match self.api.list_comments(post_id).await {
                Ok(comments) => self.cache.set_comments(post_id, comments),
                Err(_) => self.notifier.notify(Notice::Error, "Failed to load comments"),
            }
        }
        true
    }

    /// Posts a comment and appends the server-returned record. Whitespace-only
    /// content is a validated no-op: no request, no cache mutation.
    pub async fn add_comment(&self, post_id: &str, content: &str) -> ApiResult<Comment> {
        if content.trim().is_empty() {
            return Err(ApiError::EmptyContent);
        }
        match self.api.create_comment(post_id, content).await {
            Ok(comment) => {
                self.cache.append_comment(comment.clone());
                self.notifier.notify(Notice::Success, "Comment added");
                Ok(comment)
            }
            Err(e) => {
                self.notifier.notify(Notice::Error, "Failed to add comment");
                Err(e)
            }
        }
    }
}
