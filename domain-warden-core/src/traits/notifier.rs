//! Notification sink abstraction

use crate::types::Notification;

/// Delivers lifecycle notifications.
///
/// `notify` must return immediately; delivery happens in the background and
/// failures are only logged.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// [`Notifier`] that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, notification: Notification) {
        log::debug!(
            "[notify] Dropping {:?} for {} (no notifier configured)",
            notification.kind,
            notification.domain
        );
    }
}
