//! Transient inline notices.
//!
//! Success and failure messages share one channel and auto-dismiss after
//! three seconds. Expiry is computed against an injected instant so tests
//! never sleep.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// How long a notice stays visible.
pub const NOTICE_VISIBILITY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// Holds at most one notice; a newer one replaces the current one.
#[derive(Default)]
pub struct NoticeBoard {
    current: Mutex<Option<(Notice, Instant)>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self, message: impl Into<String>) {
        self.post(NoticeKind::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.post(NoticeKind::Error, message);
    }

    pub fn post(&self, kind: NoticeKind, message: impl Into<String>) {
        self.post_at(kind, message, Instant::now());
    }

    fn post_at(&self, kind: NoticeKind, message: impl Into<String>, at: Instant) {
        let notice = Notice {
            kind,
            message: message.into(),
        };
        *self.current.lock().expect("notice lock poisoned") = Some((notice, at));
    }

    /// The currently visible notice, if any.
    pub fn current(&self) -> Option<Notice> {
        self.current_at(Instant::now())
    }

    fn current_at(&self, now: Instant) -> Option<Notice> {
        let mut slot = self.current.lock().expect("notice lock poisoned");
        match &*slot {
            Some((_, posted)) if now.duration_since(*posted) >= NOTICE_VISIBILITY => {
                *slot = None;
                None
            }
            Some((notice, _)) => Some(notice.clone()),
            None => None,
        }
    }

    /// Takes the current notice, dismissing it immediately (for surfaces
    /// that print once rather than poll).
    pub fn take(&self) -> Option<Notice> {
        self.current
            .lock()
            .expect("notice lock poisoned")
            .take()
            .map(|(notice, _)| notice)
    }
}
