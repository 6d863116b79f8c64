use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::api::PostsApi;
use crate::cache::EntityCache;
use crate::error::ApiResult;
use crate::models::{NewPost, Post, PostFilter};
use crate::notify::{Notice, Notifier};

/// The filtered feed of posts. Fetches go through the cache's merge-by-id
/// path so refreshes never clobber optimistic vote state (see
/// [`EntityCache`]).
pub struct FeedView<A: PostsApi + ?Sized> {
    cache: Arc<EntityCache>,
    api: Arc<A>,
    notifier: Arc<dyn Notifier>,
    filter: RwLock<PostFilter>,
}

impl<A: PostsApi + ?Sized> FeedView<A> {
    pub fn new(cache: Arc<EntityCache>, api: Arc<A>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            cache,
            api,
            notifier,
            filter: RwLock::new(PostFilter::default()),
        }
    }

    /// Changing a filter triggers a refetch, as on the feed page.
    pub async fn set_filter(&self, filter: PostFilter) {
        *self.filter.write().unwrap() = filter;
        self.refresh().await;
    }

    pub async fn refresh(&self) {
        let filter = self.filter.read().unwrap().clone();
        match self.api.list_posts(&filter).await {
            Ok(batch) => self.cache.merge_posts(batch),
            Err(e) => {
                debug!(error = %e, "feed refresh failed");
                self.notifier.notify(Notice::Error, "Failed to load posts");
            }
        }
    }

    /// Newest first, the server's listing order.
    pub fn posts(&self) -> Vec<Post> {
        self.cache.posts()
    }

    /// Creates a post and refetches the feed on success.
    pub async fn create_post(&self, new: NewPost) -> ApiResult<Post> {
        match self.api.create_post(new).await {
            Ok(post) => {
                self.cache.upsert_post(post.clone());
                self.notifier.notify(Notice::Success, "Post created successfully!");
                self.refresh().await;
                Ok(post)
            }
            Err(e) => {
                self.notifier.notify(Notice::Error, "Failed to create post");
                Err(e)
            }
        }
    }
}
