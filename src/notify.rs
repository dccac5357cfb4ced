//! Transient user-facing notices (toasts).

use tracing::{error, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self { Self { level: NoticeLevel::Success, message: message.into() } }
    pub fn error(message: impl Into<String>) -> Self { Self { level: NoticeLevel::Error, message: message.into() } }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Emits notices as log records when no UI surface is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => info!(notice = %notice.message, "success notice"),
            NoticeLevel::Error => error!(notice = %notice.message, "error notice"),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingNotifier {
        pub notices: Mutex<Vec<Notice>>,
    }

    impl RecordingNotifier {
        pub fn taken(&self) -> Vec<Notice> { std::mem::take(&mut *self.notices.lock().unwrap()) }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notice: Notice) { self.notices.lock().unwrap().push(notice); }
    }
}
