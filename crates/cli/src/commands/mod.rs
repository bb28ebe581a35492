//! CLI command implementations.

pub mod admin;
pub mod cart;
pub mod navigate;
pub mod products;

use pachamama_storefront::config::ConfigError;
use pachamama_storefront::error::ApiError;
use pachamama_storefront::services::{NotificationKind, Notifications};
use pachamama_storefront::StorefrontError;
use thiserror::Error;

/// Errors that can end a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Storefront(#[from] StorefrontError),

    #[error("{0}")]
    Api(#[from] ApiError),

    /// An operation reported failure; carries the recorded error message.
    #[error("{0}")]
    Failed(String),
}

impl CommandError {
    /// Failure with the service's recorded error, or `fallback`.
    pub(crate) fn failed(recorded: Option<String>, fallback: &str) -> Self {
        Self::Failed(recorded.unwrap_or_else(|| fallback.to_owned()))
    }
}

/// Log and drain pending notifications.
pub fn flush_notifications(notifications: &Notifications) {
    for notification in notifications.list() {
        match notification.kind {
            NotificationKind::Error => tracing::error!("{}", notification.message),
            NotificationKind::Warning => tracing::warn!("{}", notification.message),
            NotificationKind::Success | NotificationKind::Info => {
                tracing::info!("{}", notification.message);
            }
        }
    }
    notifications.clear_all();
}
