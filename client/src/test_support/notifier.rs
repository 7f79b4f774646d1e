//! Notifier double that records every notification.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::ports::{Notification, NotificationLevel, Notifier};

/// Collects notifications for later assertions. Clones share one log.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    log: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_log(&self) -> MutexGuard<'_, Vec<Notification>> {
        match self.log.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("notifier mutex"),
        }
    }

    /// Everything notified so far.
    pub fn notifications(&self) -> Vec<Notification> {
        self.lock_log().clone()
    }

    /// Messages only.
    pub fn messages(&self) -> Vec<String> {
        self.lock_log()
            .iter()
            .map(|notification| notification.message.clone())
            .collect()
    }

    /// Most recent notification.
    pub fn last(&self) -> Option<Notification> {
        self.lock_log().last().cloned()
    }

    /// True when a notification with `level` and `message` was recorded.
    pub fn contains(&self, level: NotificationLevel, message: &str) -> bool {
        self.lock_log()
            .iter()
            .any(|notification| notification.level == level && notification.message == message)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.lock_log().push(notification);
    }
}
