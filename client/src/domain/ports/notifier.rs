//! Driven port for user-visible notifications.

use crate::domain::Notification;

/// Sink for toasts raised by domain services.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Notifier that only traces what it would have shown.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureNotifier;

impl Notifier for FixtureNotifier {
    fn notify(&self, notification: Notification) {
        tracing::debug!(title = %notification.title, "notification dropped by fixture notifier");
    }
}
