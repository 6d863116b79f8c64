use std::sync::Arc;

use tracing::debug;

use crate::api::PostsApi;
use crate::cache::EntityCache;
use crate::models::{VoteKind, VoteReceipt};
use crate::notify::{Notice, Notifier};

/// Applies optimistic, mutually-exclusive up/down vote toggles.
///
/// Policy: fire-and-forget optimistic mutation. The cache is mutated before
/// the request suspends; a failed request surfaces a notice and the
/// optimistic change is deliberately left in place, never rolled back. A
/// successful request applies the server's confirmed sets, which also repairs
/// drift from concurrent voters.
pub struct VoteReconciler<A: PostsApi + ?Sized> {
    cache: Arc<EntityCache>,
    api: Arc<A>,
    notifier: Arc<dyn Notifier>,
}

impl<A: PostsApi + ?Sized> VoteReconciler<A> {
    pub fn new(cache: Arc<EntityCache>, api: Arc<A>, notifier: Arc<dyn Notifier>) -> Self {
        Self { cache, api, notifier }
    }

    /// Toggles `user_id`'s vote on a post.
    ///
    /// The local mutation completes before the first await, so toggles are
    /// serialized per post in user-action order regardless of network
    /// completion order. Callers that must not block spawn the returned
    /// future.
    pub async fn toggle(&self, post_id: &str, kind: VoteKind, user_id: &str) {
        let known = self.cache.update_post(post_id, |post| {
            let (target, opposite) = match kind {
                VoteKind::Upvote => (&mut post.upvotes, &mut post.downvotes),
                VoteKind::Downvote => (&mut post.downvotes, &mut post.upvotes),
            };
            if let Some(pos) = target.iter().position(|id| id == user_id) {
                // already voted this way: un-vote
                target.remove(pos);
            } else {
                target.push(user_id.to_string());
                // mutual exclusion: at most one of the two sets holds the user
                opposite.retain(|id| id != user_id);
            }
        });
        if !known {
            debug!(post_id, "vote toggle on uncached post ignored");
            return;
        }

        match self.api.cast_vote(post_id, kind).await {
            Ok(receipt) => self.confirm(post_id, receipt),
            Err(e) => {
                debug!(post_id, error = %e, "vote request failed");
                self.notifier.notify(Notice::Error, "Failed to vote");
            }
        }
    }

    fn confirm(&self, post_id: &str, receipt: VoteReceipt) {
        self.cache.apply_vote_receipt(post_id, receipt);
    }
}
