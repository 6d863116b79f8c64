use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::api::{MessagingApi, MIN_SEARCH_LEN};
use crate::cache::EntityCache;
use crate::error::{ApiError, ApiResult};
use crate::models::{Conversation, Id, Message, NewMessage, User};
use crate::notify::{Notice, Notifier};

/// Refresh cadence while a messaging view is active.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Keeps the conversation list and the selected conversation's messages
/// eventually consistent with the server under fixed-interval refresh.
///
/// The conversation list is small and server-ordered, so each tick replaces
/// it wholesale. Message batches are merged by id: messages are immutable
/// once created, so a superset batch can only add entries. Selecting a
/// conversation fetches immediately, independent of the timer; a response
/// that arrives after the selection has moved on is dropped.
pub struct ConversationPoller<A: MessagingApi + ?Sized> {
    cache: Arc<EntityCache>,
    api: Arc<A>,
    notifier: Arc<dyn Notifier>,
    selected: RwLock<Option<Id>>,
    // current query's results only, replaced wholesale per keystroke
    search_results: RwLock<Vec<User>>,
}

impl<A: MessagingApi + ?Sized> ConversationPoller<A> {
    pub fn new(cache: Arc<EntityCache>, api: Arc<A>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            cache,
            api,
            notifier,
            selected: RwLock::new(None),
            search_results: RwLock::new(Vec::new()),
        }
    }

    pub fn selected(&self) -> Option<Id> {
        self.selected.read().unwrap().clone()
    }

    /// Messages of the selected conversation in render order.
    pub fn visible_messages(&self) -> Vec<Message> {
        match self.selected() {
            Some(id) => self.cache.messages(&id),
            None => Vec::new(),
        }
    }

    /// Selects a conversation and fetches its messages right away.
    pub async fn select(&self, conversation_id: &str) {
        *self.selected.write().unwrap() = Some(conversation_id.to_string());
        self.refresh_messages(conversation_id).await;
    }

    /// Leaves the chat pane; the timer keeps refreshing the list only.
    pub fn deselect(&self) {
        *self.selected.write().unwrap() = None;
    }

    /// One poll step: refetch the conversation list, then the open
    /// conversation's messages if one is selected.
    pub async fn tick(&self) {
        match self.api.list_conversations().await {
            Ok(conversations) => self.cache.set_conversations(conversations),
            Err(ApiError::Auth) => {
                self.notifier.notify(Notice::Error, "Please log in again");
                return;
            }
            Err(e) => {
                debug!(error = %e, "conversation refresh failed");
                self.notifier.notify(Notice::Error, "Failed to load conversations");
            }
        }
        if let Some(id) = self.selected() {
            self.refresh_messages(&id).await;
        }
    }

    /// Fetches and merges one conversation's messages. The merge is guarded
    /// by conversation id: if the selection moved while the request was in
    /// flight, the late response is dropped so it cannot overwrite the newly
    /// selected conversation's view.
    async fn refresh_messages(&self, conversation_id: &str) {
        match self.api.list_messages(conversation_id).await {
            Ok(batch) => {
                let still_selected = self
                    .selected
                    .read()
                    .unwrap()
                    .as_deref()
                    .map(|s| s == conversation_id)
                    .unwrap_or(false);
                if !still_selected {
                    debug!(conversation_id, "dropping stale message batch");
                    return;
                }
                self.cache.merge_messages(conversation_id, batch);
            }
            Err(e) => {
                debug!(conversation_id, error = %e, "message refresh failed");
                self.notifier.notify(Notice::Error, "Failed to load messages");
            }
        }
    }

    /// Sends to the selected conversation. Not optimistic: the message is
    /// appended only after the server acknowledges it, so a failed send never
    /// shows a message that was never persisted. A successful send also
    /// refreshes the conversation list so the preview text updates.
    pub async fn send_message(&self, content: &str) -> ApiResult<Message> {
        if content.trim().is_empty() {
            return Err(ApiError::EmptyContent);
        }
        let Some(conversation_id) = self.selected() else {
            return Err(ApiError::NotFound);
        };
        let new = NewMessage {
            content: content.to_string(),
            conversation_id: conversation_id.clone(),
        };
        match self.api.send_message(new).await {
            Ok(message) => {
                self.cache.merge_messages(&conversation_id, vec![message.clone()]);
                if let Ok(conversations) = self.api.list_conversations().await {
                    self.cache.set_conversations(conversations);
                }
                Ok(message)
            }
            Err(e) => {
                self.notifier.notify(Notice::Error, "Failed to send message");
                Err(e)
            }
        }
    }

    /// Get-or-create a conversation with another user, then open it.
    pub async fn open_conversation(&self, other_user_id: &str) -> ApiResult<Conversation> {
        match self.api.open_conversation(other_user_id).await {
            Ok(conversation) => {
                self.clear_search();
                self.select(&conversation.id).await;
                if let Ok(conversations) = self.api.list_conversations().await {
                    self.cache.set_conversations(conversations);
                }
                Ok(conversation)
            }
            Err(e) => {
                self.notifier.notify(Notice::Error, "Failed to start conversation");
                Err(e)
            }
        }
    }

    /// User directory search. Queries shorter than [`MIN_SEARCH_LEN`] clear
    /// the result set locally and never hit the network; that length gate is
    /// what suppresses excessive per-keystroke calls.
    pub async fn search_users(&self, query: &str) {
        if query.chars().count() < MIN_SEARCH_LEN {
            self.clear_search();
            return;
        }
        match self.api.search_users(query).await {
            Ok(users) => *self.search_results.write().unwrap() = users,
            Err(ApiError::Auth) => self.notifier.notify(Notice::Error, "Please log in again"),
            Err(_) => self.notifier.notify(Notice::Error, "Failed to search users"),
        }
    }

    pub fn search_results(&self) -> Vec<User> {
        self.search_results.read().unwrap().clone()
    }

    pub fn clear_search(&self) {
        self.search_results.write().unwrap().clear();
    }

    /// Teacher/staff directory; plain fetch with no caching.
    pub async fn special_accounts(&self) -> ApiResult<Vec<User>> {
        match self.api.special_accounts().await {
            Ok(users) => Ok(users),
            Err(e) => {
                self.notifier.notify(Notice::Error, "Failed to load special accounts");
                Err(e)
            }
        }
    }
}

impl<A: MessagingApi + ?Sized + 'static> ConversationPoller<A> {
    /// Spawns the periodic refresh task. The first tick fires immediately,
    /// which doubles as the initial load on view mount. The returned handle
    /// owns the timer; dropping or stopping it tears the task down so no
    /// timer leaks across navigation.
    pub fn start(self: &Arc<Self>) -> PollerHandle {
        let poller = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(POLL_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                poller.tick().await;
            }
        });
        PollerHandle { handle }
    }
}

/// Cancellation handle for the polling task.
pub struct PollerHandle {
    handle: JoinHandle<()>,
}

impl PollerHandle {
    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
