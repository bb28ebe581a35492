//! Ephemeral user-facing notifications.
//!
//! Entries are kept in insertion order, which is also display order. Each
//! entry with a positive duration removes itself once the duration elapses.

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const SUCCESS_DURATION_MS: i64 = 3000;
const ERROR_DURATION_MS: i64 = 4000;
const WARNING_DURATION_MS: i64 = 3500;
const INFO_DURATION_MS: i64 = 3000;

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    #[default]
    Info,
    Warning,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
            Self::Warning => "warning",
        })
    }
}

/// A single notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique for the lifetime of the sink.
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
    /// Lifetime in milliseconds. Zero or negative never expires.
    pub duration_ms: i64,
}

/// In-memory notification queue.
#[derive(Clone, Default)]
pub struct Notifications {
    inner: Arc<NotificationsInner>,
}

#[derive(Default)]
struct NotificationsInner {
    next_id: AtomicU64,
    entries: RwLock<Vec<Notification>>,
}

impl NotificationsInner {
    fn remove(&self, id: u64) -> bool {
        let mut entries = self.entries.write();
        entries
            .iter()
            .position(|n| n.id == id)
            .map(|index| entries.remove(index))
            .is_some()
    }
}

impl Notifications {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a notification and return its id.
    ///
    /// With a positive `duration_ms`, a task on the current tokio runtime
    /// removes the entry when the duration elapses.
    pub fn notify(&self, message: impl Into<String>, kind: NotificationKind, duration_ms: i64) -> u64 {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let message = message.into();
        debug!(id, %kind, %message, "notification added");

        self.inner.entries.write().push(Notification {
            id,
            message,
            kind,
            duration_ms,
        });

        if let Ok(delay_ms) = u64::try_from(duration_ms)
            && delay_ms > 0
        {
            self.schedule_expiry(id, Duration::from_millis(delay_ms));
        }

        id
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.notify(message, NotificationKind::Success, SUCCESS_DURATION_MS)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.notify(message, NotificationKind::Error, ERROR_DURATION_MS)
    }

    pub fn warning(&self, message: impl Into<String>) -> u64 {
        self.notify(message, NotificationKind::Warning, WARNING_DURATION_MS)
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.notify(message, NotificationKind::Info, INFO_DURATION_MS)
    }

    /// Remove a notification. Returns `false` if it was already gone.
    pub fn remove(&self, id: u64) -> bool {
        self.inner.remove(id)
    }

    /// Remove every notification.
    pub fn clear_all(&self) {
        self.inner.entries.write().clear();
    }

    /// Snapshot of current notifications in display order.
    #[must_use]
    pub fn list(&self) -> Vec<Notification> {
        self.inner.entries.read().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.read().is_empty()
    }

    fn schedule_expiry(&self, id: u64, delay: Duration) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(id, "no async runtime, notification will not expire");
            return;
        };

        let inner: Weak<NotificationsInner> = Arc::downgrade(&self.inner);
        handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = inner.upgrade() {
                inner.remove(id);
            }
        });
    }
}
