use std::collections::HashMap;
use std::sync::RwLock;

use crate::models::*;

/// Session-wide store for server-derived records.
///
/// All mutation happens synchronously under the lock; network completions are
/// the only suspension points in the callers, so locally visible state always
/// follows the order of user actions. The cache exclusively owns the records;
/// views hold ids and take cloned snapshots.
///
/// Merge policy is last-write-wins by field with one reconciliation rule: a
/// generic post refresh never replaces cached `upvotes`/`downvotes`. Only
/// [`EntityCache::apply_vote_receipt`] may, so a stale poll response cannot
/// clobber an in-flight optimistic vote.
#[derive(Default)]
pub struct EntityCache {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    posts: HashMap<Id, Post>,
    // keyed by post id, arrival order within the session
    comments: HashMap<Id, Vec<Comment>>,
    // small and server-ordered, so replaced wholesale
    conversations: Vec<Conversation>,
    // conversation id -> message id -> message
    messages: HashMap<Id, HashMap<Id, Message>>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- posts ----

    /// Inserts or fully replaces a single post (used for freshly created
    /// posts, which carry no local optimistic state yet).
    pub fn upsert_post(&self, post: Post) {
        let mut s = self.state.write().unwrap();
        s.posts.insert(post.id.clone(), post);
    }

    /// Merges a fetched batch by id without disturbing unrelated entries.
    /// Idempotent: applying the same batch twice yields the same state.
    /// Existing entries keep their cached vote sets (see type docs).
    pub fn merge_posts(&self, batch: Vec<Post>) {
        let mut s = self.state.write().unwrap();
        for mut post in batch {
            if let Some(cached) = s.posts.get(&post.id) {
                post.upvotes = cached.upvotes.clone();
                post.downvotes = cached.downvotes.clone();
            }
            s.posts.insert(post.id.clone(), post);
        }
    }

    pub fn get_post(&self, id: &str) -> Option<Post> {
        self.state.read().unwrap().posts.get(id).cloned()
    }

    /// Feed snapshot, newest first (the server's listing order).
    pub fn posts(&self) -> Vec<Post> {
        let s = self.state.read().unwrap();
        let mut v: Vec<_> = s.posts.values().cloned().collect();
        v.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        v
    }

    /// Runs `f` against the cached post under the write lock. Returns false
    /// when the post is not cached.
    pub fn update_post<F: FnOnce(&mut Post)>(&self, id: &str, f: F) -> bool {
        let mut s = self.state.write().unwrap();
        match s.posts.get_mut(id) {
            Some(p) => {
                f(p);
                true
            }
            None => false,
        }
    }

    /// Applies a server vote confirmation. This is the dedicated path that is
    /// allowed to replace vote sets wholesale.
    pub fn apply_vote_receipt(&self, post_id: &str, receipt: VoteReceipt) -> bool {
        self.update_post(post_id, |p| {
            p.upvotes = receipt.upvotes;
            p.downvotes = receipt.downvotes;
        })
    }

    // ---- comments ----

    pub fn comments_loaded(&self, post_id: &str) -> bool {
        self.state.read().unwrap().comments.contains_key(post_id)
    }

    pub fn set_comments(&self, post_id: &str, comments: Vec<Comment>) {
        let mut s = self.state.write().unwrap();
        s.comments.insert(post_id.to_string(), comments);
    }

    pub fn comments(&self, post_id: &str) -> Option<Vec<Comment>> {
        self.state.read().unwrap().comments.get(post_id).cloned()
    }

    /// Appends a freshly posted comment and bumps the owning post's advisory
    /// `comment_count` by exactly one, under a single write lock. The count
    /// may drift from the authoritative one until the next full post refresh.
    pub fn append_comment(&self, comment: Comment) {
        let mut s = self.state.write().unwrap();
        if let Some(p) = s.posts.get_mut(&comment.post_id) {
            p.comment_count += 1;
        }
        s.comments
            .entry(comment.post_id.clone())
            .or_default()
            .push(comment);
    }

    // ---- conversations ----

    /// List order and membership are server-authoritative, so the whole list
    /// is replaced on each refresh.
    pub fn set_conversations(&self, conversations: Vec<Conversation>) {
        let mut s = self.state.write().unwrap();
        s.conversations = conversations;
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.state.read().unwrap().conversations.clone()
    }

    pub fn get_conversation(&self, id: &str) -> Option<Conversation> {
        let s = self.state.read().unwrap();
        s.conversations.iter().find(|c| c.id == id).cloned()
    }

    // ---- messages ----

    /// Merges a fetched message batch by id. Messages are immutable once
    /// created, so merging a superset batch can only add entries; applying
    /// the same batch twice is a no-op.
    pub fn merge_messages(&self, conversation_id: &str, batch: Vec<Message>) {
        let mut s = self.state.write().unwrap();
        let log = s.messages.entry(conversation_id.to_string()).or_default();
        for m in batch {
            log.insert(m.id.clone(), m);
        }
    }

    /// Snapshot ordered by `created_at` ascending, message id as tie-break,
    /// so repeated merges always render in the same stable order.
    pub fn messages(&self, conversation_id: &str) -> Vec<Message> {
        let s = self.state.read().unwrap();
        let mut v: Vec<_> = s
            .messages
            .get(conversation_id)
            .map(|log| log.values().cloned().collect())
            .unwrap_or_default();
        v.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        v
    }

    /// Tears down conversation and message state on navigation away from the
    /// messaging view.
    pub fn clear_messaging(&self) {
        let mut s = self.state.write().unwrap();
        s.conversations.clear();
        s.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn post(id: &str) -> Post {
        Post {
            id: id.into(),
            title: "t".into(),
            content: "c".into(),
            category: Category::Suggestion,
            target_group_type: GroupType::Department,
            target_group_name: "Physics".into(),
            anonymous_tag: "Swift-Falcon-12".into(),
            upvotes: vec![],
            downvotes: vec![],
            created_at: Utc::now(),
            comment_count: 0,
        }
    }

    fn message(id: &str, conv: &str, secs: i64) -> Message {
        Message {
            id: id.into(),
            conversation_id: conv.into(),
            sender_id: "u1".into(),
            content: "hi".into(),
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn merge_posts_preserves_local_vote_sets() {
        let cache = EntityCache::new();
        cache.upsert_post(post("p1"));
        cache.update_post("p1", |p| p.upvotes.push("u1".into()));

        // stale refresh that does not yet reflect the vote
        let mut stale = post("p1");
        stale.comment_count = 3;
        cache.merge_posts(vec![stale]);

        let p = cache.get_post("p1").unwrap();
        assert_eq!(p.upvotes, vec!["u1".to_string()]);
        assert_eq!(p.comment_count, 3); // other fields are last-write-wins
    }

    #[test]
    fn merge_messages_is_idempotent_and_ordered() {
        let cache = EntityCache::new();
        let batch = vec![message("m2", "c1", 2), message("m1", "c1", 1)];
        cache.merge_messages("c1", batch.clone());
        cache.merge_messages("c1", batch);

        let msgs = cache.messages("c1");
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].id, "m1");
        assert_eq!(msgs[1].id, "m2");
    }

    #[test]
    fn message_order_ties_break_on_id() {
        let cache = EntityCache::new();
        cache.merge_messages("c1", vec![message("mb", "c1", 5), message("ma", "c1", 5)]);
        let msgs = cache.messages("c1");
        assert_eq!(msgs[0].id, "ma");
        assert_eq!(msgs[1].id, "mb");
    }

    #[test]
    fn append_comment_bumps_count_once() {
        let cache = EntityCache::new();
        cache.upsert_post(post("p1"));
        cache.set_comments("p1", vec![]);
        cache.append_comment(Comment {
            id: "c1".into(),
            post_id: "p1".into(),
            anonymous_tag: "Calm-Otter-3".into(),
            content: "nice".into(),
            created_at: Utc::now(),
        });
        assert_eq!(cache.get_post("p1").unwrap().comment_count, 1);
        assert_eq!(cache.comments("p1").unwrap().len(), 1);
    }

    #[test]
    fn clear_messaging_drops_conversations_and_logs() {
        let cache = EntityCache::new();
        cache.merge_messages("c1", vec![message("m1", "c1", 1)]);
        cache.clear_messaging();
        assert!(cache.conversations().is_empty());
        assert!(cache.messages("c1").is_empty());
    }
}
