//! Ambient notifications
//!
//! Notifications are fire-and-forget: the controller hands one to a
//! [`Notifier`] and never looks at the outcome.

use serde::{Deserialize, Serialize};

use crate::config::builtin;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub duration_ms: u64,
}

impl Notification {
    /// "Assistant is available" toast shown the first time the widget opens
    pub fn assistant_available(duration_ms: u64) -> Self {
        Self {
            title: builtin::NOTIFY_TITLE.to_string(),
            description: builtin::NOTIFY_DESCRIPTION.to_string(),
            duration_ms,
        }
    }
}

/// A surface that can show transient alerts outside the conversation
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Notifier that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        tracing::info!(
            title = %notification.title,
            duration_ms = notification.duration_ms,
            "{}",
            notification.description
        );
    }
}
