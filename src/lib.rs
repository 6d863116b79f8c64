pub mod api;
pub mod cache;
pub mod comments;
pub mod error;
pub mod feed;
pub mod groups;
pub mod models;
pub mod notify;
pub mod poller;
pub mod votes;

// Re-export commonly used items for binaries / external users
pub use api::{Api, HttpApi, MIN_SEARCH_LEN};
pub use cache::EntityCache;
pub use error::{ApiError, ApiResult};
pub use notify::{Notice, Notifier, TracingNotifier};
pub use poller::{ConversationPoller, PollerHandle, POLL_INTERVAL};
