//! User-facing notifications (toasts).
//!
//! Stores report every terminal outcome of a cart or wishlist mutation
//! through a [`Notifier`]. The presentation layer decides how to show them.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Info,
    Error,
}

/// A short one-shot message for the shopper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Success,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Info,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
        }
    }
}

/// Accepts notifications. Must not block.
pub trait Notifier {
    fn notify(&self, notification: Notification);
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification);
    }
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification);
    }
}

/// Shared FIFO of pending notifications.
///
/// Clones share the same queue, so a store can push while the view drains.
#[derive(Debug, Clone, Default)]
pub struct NotificationQueue {
    inner: Arc<Mutex<VecDeque<Notification>>>,
}

impl NotificationQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every pending notification, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<Notification> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for NotificationQueue {
    fn notify(&self, notification: Notification) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(notification);
    }
}

/// Forwards notifications to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Error => tracing::error!(message = %notification.message, "notification"),
            Severity::Success | Severity::Info => {
                tracing::info!(message = %notification.message, "notification");
            }
        }
    }
}
