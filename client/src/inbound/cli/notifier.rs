//! Notifier printing transient messages to stderr.

use std::io::{self, Write};

use crate::domain::ports::{Notification, NotificationLevel, Notifier};

/// Prints each notification as one line on stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        let line = format_notification(&notification);
        if let Err(err) = writeln!(io::stderr().lock(), "{line}") {
            tracing::warn!(error = %err, "notification could not be printed");
        }
    }
}

fn format_notification(notification: &Notification) -> String {
    let tag = match notification.level {
        NotificationLevel::Success => "ok",
        NotificationLevel::Error => "error",
        NotificationLevel::Info => "info",
    };
    format!("[{tag}] {}", notification.message)
}
