use tracing::{info, warn};

/// Transient user-facing notices (the toast strip in the UI). Failed
/// operations report here and recover locally; nothing propagates beyond the
/// triggering action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Success,
    Error,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, level: Notice, message: &str);
}

/// Default sink when no UI is attached.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: Notice, message: &str) {
        match level {
            Notice::Success => info!("{message}"),
            Notice::Error => warn!("{message}"),
        }
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Records notices so tests can assert on surfaced errors.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub notices: Mutex<Vec<(Notice, String)>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, level: Notice, message: &str) {
            self.notices.lock().unwrap().push((level, message.to_string()));
        }
    }
}
