//! Reconciliation flows over an in-process fake backend: poll merges,
//! conversation switching, non-optimistic sends, and search gating.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::Notify;

use campusfeed::api::MessagingApi;
use campusfeed::cache::EntityCache;
use campusfeed::error::{ApiError, ApiResult};
use campusfeed::models::*;
use campusfeed::notify::{Notice, Notifier};
use campusfeed::poller::ConversationPoller;

#[derive(Default)]
struct RecordingNotifier {
    notices: Mutex<Vec<(Notice, String)>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: Notice, message: &str) {
        self.notices.lock().unwrap().push((level, message.to_string()));
    }
}

fn message(id: &str, conv: &str, secs: i64) -> Message {
    Message {
        id: id.into(),
        conversation_id: conv.into(),
        sender_id: "u2".into(),
        content: format!("msg {id}"),
        created_at: Utc.timestamp_opt(secs, 0).unwrap(),
    }
}

fn conversation(id: &str, preview: &str) -> Conversation {
    Conversation {
        id: id.into(),
        participant1_id: "u1".into(),
        participant2_id: "u2".into(),
        last_message: preview.into(),
        last_message_time: Utc.timestamp_opt(100, 0).unwrap(),
        created_at: Utc.timestamp_opt(0, 0).unwrap(),
    }
}

/// Scripted messaging backend. `slow_conversation` parks the first matching
/// message fetch until `release` fires, to simulate a response landing after
/// the user has moved on.
#[derive(Default)]
struct FakeMessaging {
    conversations: Mutex<Vec<Conversation>>,
    messages: Mutex<Vec<Message>>,
    slow_conversation: Option<String>,
    release: Notify,
    search_calls: AtomicUsize,
    fail_sends: bool,
    fail_auth: bool,
}

#[async_trait]
impl MessagingApi for FakeMessaging {
    async fn list_conversations(&self) -> ApiResult<Vec<Conversation>> {
        if self.fail_auth {
            return Err(ApiError::Auth);
        }
        Ok(self.conversations.lock().unwrap().clone())
    }

    async fn open_conversation(&self, other_user_id: &str) -> ApiResult<Conversation> {
        let conv = conversation("c-new", "");
        let _ = other_user_id;
        self.conversations.lock().unwrap().push(conv.clone());
        Ok(conv)
    }

    async fn list_messages(&self, conversation_id: &str) -> ApiResult<Vec<Message>> {
        if self.slow_conversation.as_deref() == Some(conversation_id) {
            self.release.notified().await;
        }
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect())
    }

    async fn send_message(&self, new: NewMessage) -> ApiResult<Message> {
        if self.fail_sends {
            return Err(ApiError::Status(500));
        }
        let msg = Message {
            id: format!("m-sent-{}", self.messages.lock().unwrap().len()),
            conversation_id: new.conversation_id.clone(),
            sender_id: "u1".into(),
            content: new.content.clone(),
            created_at: Utc.timestamp_opt(50, 0).unwrap(),
        };
        self.messages.lock().unwrap().push(msg.clone());
        if let Some(c) = self
            .conversations
            .lock()
            .unwrap()
            .iter_mut()
            .find(|c| c.id == new.conversation_id)
        {
            c.last_message = new.content;
        }
        Ok(msg)
    }

    async fn search_users(&self, query: &str) -> ApiResult<Vec<User>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![User {
            id: "u9".into(),
            name: query.into(),
            anonymous_tag: "Pale-Kite-1".into(),
            role: "Student".into(),
            username: None,
        }])
    }

    async fn special_accounts(&self) -> ApiResult<Vec<User>> {
        Ok(vec![])
    }
}

fn setup(
    api: Arc<FakeMessaging>,
) -> (Arc<ConversationPoller<FakeMessaging>>, Arc<EntityCache>, Arc<RecordingNotifier>) {
    let cache = Arc::new(EntityCache::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let p = Arc::new(ConversationPoller::new(cache.clone(), api, notifier.clone()));
    (p, cache, notifier)
}

#[tokio::test]
async fn poll_merges_superset_batch_without_duplicates() {
    let api = Arc::new(FakeMessaging::default());
    *api.conversations.lock().unwrap() = vec![conversation("c1", "hi")];
    *api.messages.lock().unwrap() = vec![message("m1", "c1", 1), message("m2", "c1", 2)];
    let (poller, cache, _) = setup(api.clone());

    poller.select("c1").await;
    assert_eq!(cache.messages("c1").len(), 2);

    // next poll returns a superset
    api.messages.lock().unwrap().push(message("m3", "c1", 3));
    poller.tick().await;
    poller.tick().await; // idempotent on repeat

    let msgs = poller.visible_messages();
    let ids: Vec<_> = msgs.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["m1", "m2", "m3"]);
}

#[tokio::test]
async fn late_response_for_deselected_conversation_is_dropped() {
    let api = Arc::new(FakeMessaging {
        slow_conversation: Some("c1".into()),
        ..Default::default()
    });
    *api.conversations.lock().unwrap() = vec![conversation("c1", ""), conversation("c2", "")];
    *api.messages.lock().unwrap() = vec![message("a1", "c1", 1), message("b1", "c2", 1)];
    let (poller, cache, _) = setup(api.clone());

    // c1's fetch parks on the gate; the user switches to c2 meanwhile
    let p1 = poller.clone();
    let pending = tokio::spawn(async move { p1.select("c1").await });
    tokio::task::yield_now().await;
    poller.select("c2").await;

    api.release.notify_one();
    pending.await.unwrap();

    // the late c1 batch must not land anywhere
    assert_eq!(poller.selected().as_deref(), Some("c2"));
    assert!(cache.messages("c1").is_empty());
    let visible: Vec<_> = poller.visible_messages().iter().map(|m| m.id.clone()).collect();
    assert_eq!(visible, vec!["b1".to_string()]);
}

#[tokio::test]
async fn send_appends_only_after_ack_and_refreshes_previews() {
    let api = Arc::new(FakeMessaging::default());
    *api.conversations.lock().unwrap() = vec![conversation("c1", "old preview")];
    let (poller, cache, _) = setup(api.clone());
    poller.select("c1").await;

    poller.send_message("fresh news").await.unwrap();

    assert_eq!(cache.messages("c1").len(), 1);
    assert_eq!(cache.conversations()[0].last_message, "fresh news");
}

#[tokio::test]
async fn failed_send_leaves_no_phantom_message() {
    let api = Arc::new(FakeMessaging { fail_sends: true, ..Default::default() });
    *api.conversations.lock().unwrap() = vec![conversation("c1", "")];
    let (poller, cache, notifier) = setup(api);
    poller.select("c1").await;

    let err = poller.send_message("will fail").await.unwrap_err();
    assert!(matches!(err, ApiError::Status(500)));
    assert!(cache.messages("c1").is_empty());
    assert!(notifier
        .notices
        .lock()
        .unwrap()
        .contains(&(Notice::Error, "Failed to send message".to_string())));
}

#[tokio::test]
async fn empty_send_never_reaches_the_network() {
    let api = Arc::new(FakeMessaging { fail_sends: true, ..Default::default() });
    *api.conversations.lock().unwrap() = vec![conversation("c1", "")];
    let (poller, _, notifier) = setup(api);
    poller.select("c1").await;

    let err = poller.send_message("   ").await.unwrap_err();
    assert!(matches!(err, ApiError::EmptyContent));
    // fail_sends would have produced a notice if the request had gone out
    assert!(notifier.notices.lock().unwrap().is_empty());
}

#[tokio::test]
async fn short_search_queries_clear_results_without_a_call() {
    let api = Arc::new(FakeMessaging::default());
    let (poller, _, _) = setup(api.clone());

    poller.search_users("ab").await;
    assert_eq!(poller.search_results().len(), 1);
    assert_eq!(api.search_calls.load(Ordering::SeqCst), 1);

    poller.search_users("a").await;
    assert!(poller.search_results().is_empty());
    assert_eq!(api.search_calls.load(Ordering::SeqCst), 1); // no second call
}

#[tokio::test]
async fn auth_failure_surfaces_login_notice() {
    let api = Arc::new(FakeMessaging { fail_auth: true, ..Default::default() });
    let (poller, cache, notifier) = setup(api);

    poller.tick().await;

    assert!(cache.conversations().is_empty());
    assert_eq!(
        notifier.notices.lock().unwrap()[0],
        (Notice::Error, "Please log in again".to_string())
    );
}

#[tokio::test]
async fn poller_handle_tears_down_the_timer() {
    let api = Arc::new(FakeMessaging::default());
    *api.conversations.lock().unwrap() = vec![conversation("c1", "hi")];
    let (poller, cache, _) = setup(api);

    let handle = poller.start();
    // first tick fires immediately and doubles as the initial load
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(cache.conversations().len(), 1);
    assert!(handle.is_running());

    handle.stop();
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    assert!(!handle.is_running());
}

#[tokio::test]
async fn open_conversation_selects_and_loads_it() {
    let api = Arc::new(FakeMessaging::default());
    let (poller, cache, _) = setup(api);

    let conv = poller.open_conversation("u2").await.unwrap();

    assert_eq!(poller.selected().as_deref(), Some(conv.id.as_str()));
    assert_eq!(cache.conversations().len(), 1);
}
