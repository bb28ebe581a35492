//! Service bundle shared by every entry point.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::middleware::NavigationGuard;
use crate::retry::RetryPolicy;
use crate::routes::RouteTable;
use crate::services::{
    AuthSession, CartClient, Catalog, LinkOpener, Notifications, SessionIdManager, TracingOpener,
};
use crate::storage::{FileStore, KeyValueStore, StorageError};

/// Error assembling the service bundle.
#[derive(Debug, thiserror::Error)]
pub enum StorefrontError {
    #[error("backend client: {0}")]
    Api(#[from] ApiError),
    #[error("state store: {0}")]
    Storage(#[from] StorageError),
}

/// All storefront services wired to one backend and one state store.
///
/// This struct is cheaply cloneable via `Arc`; clones share every service.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: ClientConfig,
    store: Arc<dyn KeyValueStore>,
    notifications: Notifications,
    auth: AuthSession,
    catalog: Catalog,
    cart: CartClient,
    guard: NavigationGuard,
}

impl Storefront {
    /// Create the bundle with the state file from `config`, the system clock
    /// and a logging checkout opener.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError` if the state file is unreadable or the HTTP
    /// client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, StorefrontError> {
        let store = Arc::new(FileStore::open(&config.state_file)?);
        Ok(Self::with_parts(
            config,
            store,
            Arc::new(SystemClock),
            Arc::new(TracingOpener),
        )?)
    }

    /// Create the bundle from explicit capabilities.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the HTTP client cannot be built.
    pub fn with_parts(
        config: ClientConfig,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        opener: Arc<dyn LinkOpener>,
    ) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config)?;
        let notifications = Notifications::new();
        let auth = AuthSession::new(
            api.clone(),
            Arc::clone(&store),
            clock,
            config.token_refresh_window,
        );
        let catalog = Catalog::new(
            api.clone(),
            auth.clone(),
            notifications.clone(),
            RetryPolicy::from(config.retry),
        );
        let cart = CartClient::new(api, SessionIdManager::new(Arc::clone(&store)), opener);
        let guard = NavigationGuard::new(RouteTable::default(), auth.clone());

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                config,
                store,
                notifications,
                auth,
                catalog,
                cart,
                guard,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Persisted state shared by the auth session and the cart.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.inner.store
    }

    #[must_use]
    pub fn notifications(&self) -> &Notifications {
        &self.inner.notifications
    }

    #[must_use]
    pub fn auth(&self) -> &AuthSession {
        &self.inner.auth
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn cart(&self) -> &CartClient {
        &self.inner.cart
    }

    #[must_use]
    pub fn guard(&self) -> &NavigationGuard {
        &self.inner.guard
    }
}
