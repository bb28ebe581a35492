//! Client-side services for the storefront.
//!
//! # Services
//!
//! - `auth` - Admin session: secret exchange, token validation, lazy refresh
//! - `catalog` - Product and category reads, authenticated product writes
//! - `cart` - Server-side cart keyed by a persisted session identifier
//! - `notifications` - Ephemeral user-facing messages with auto-expiry
//!
//! Each service is a cheaply cloneable handle over shared state. Overlapping
//! calls on the same service are not serialized: whichever response lands
//! last overwrites the cached state.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod notifications;

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

pub use auth::AuthSession;
pub use cart::{CartClient, LinkOpener, SessionIdManager, TracingOpener};
pub use catalog::{Catalog, ProductFilters};
pub use notifications::{Notification, NotificationKind, Notifications};

/// Loading flag and last error shared by every service.
#[derive(Debug, Default)]
pub(crate) struct StoreStatus {
    loading: AtomicBool,
    error: RwLock<Option<String>>,
}

impl StoreStatus {
    /// Mark an operation as started and clear the previous error.
    ///
    /// The loading flag drops back to `false` when the guard goes out of
    /// scope, on every exit path.
    pub(crate) fn begin(&self) -> LoadingGuard<'_> {
        self.loading.store(true, Ordering::Release);
        *self.error.write() = None;
        LoadingGuard { status: self }
    }

    pub(crate) fn fail(&self, message: impl Into<String>) {
        *self.error.write() = Some(message.into());
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub(crate) fn error(&self) -> Option<String> {
        self.error.read().clone()
    }
}

/// Resets the loading flag on drop.
pub(crate) struct LoadingGuard<'a> {
    status: &'a StoreStatus,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.status.loading.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loading_guard_resets_flag() {
        let status = StoreStatus::default();
        status.fail("old error");
        {
            let _guard = status.begin();
            assert!(status.is_loading());
            assert_eq!(status.error(), None);
            status.fail("new error");
        }
        assert!(!status.is_loading());
        assert_eq!(status.error().as_deref(), Some("new error"));
    }
}
