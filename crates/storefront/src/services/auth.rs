//! Admin session management.
//!
//! The backend exchanges a shared secret for a bearer token. The token is
//! persisted under [`keys::AUTH_TOKEN`] and re-validated lazily: callers ask
//! [`AuthSession::check_and_refresh_token`] before an authenticated request
//! and the backend is only consulted once the last check is older than the
//! refresh window.
//!
//! The admin flag is derived from token presence, so a session is admin
//! exactly when it holds a token.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::StoreStatus;
use crate::api::ApiClient;
use crate::clock::Clock;
use crate::storage::{KeyValueStore, keys};

const AUTH_FAILED_MESSAGE: &str = "Authentication failed";
const ACCESS_DENIED_MESSAGE: &str = "Invalid access key";

// =============================================================================
// Wire types
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AdminAccessRequest<'a> {
    secret_key: &'a str,
}

#[derive(Deserialize)]
struct AdminAccessResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Serialize)]
struct VerifyTokenRequest<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
struct VerifyTokenResponse {
    #[serde(default)]
    success: bool,
}

// =============================================================================
// AuthSession
// =============================================================================

/// Admin authentication state.
///
/// Cheap to clone; clones share one session.
#[derive(Clone)]
pub struct AuthSession {
    inner: Arc<AuthInner>,
}

struct AuthInner {
    api: ApiClient,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    refresh_window: TimeDelta,
    state: RwLock<SessionState>,
    status: StoreStatus,
}

#[derive(Default)]
struct SessionState {
    token: Option<SecretString>,
    last_check: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("AuthSession")
            .field("is_admin", &state.token.is_some())
            .field("last_check", &state.last_check)
            .finish_non_exhaustive()
    }
}

impl AuthSession {
    /// Create an empty session.
    ///
    /// Nothing is read from the store until the first validity check.
    #[must_use]
    pub fn new(
        api: ApiClient,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        refresh_window: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(AuthInner {
                api,
                store,
                clock,
                refresh_window: TimeDelta::from_std(refresh_window).unwrap_or(TimeDelta::MAX),
                state: RwLock::new(SessionState::default()),
                status: StoreStatus::default(),
            }),
        }
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Exchange the admin secret for a token.
    ///
    /// Returns `true` and persists the token when the backend accepts the
    /// secret. Any failure returns `false` and is recorded in [`Self::error`].
    #[instrument(skip_all)]
    pub async fn verify_admin_access(&self, secret: &SecretString) -> bool {
        let _loading = self.inner.status.begin();

        let request = AdminAccessRequest {
            secret_key: secret.expose_secret(),
        };
        let result: Result<AdminAccessResponse, _> = self
            .inner
            .api
            .post(&["api", "auth", "admin-access"], &request, HeaderMap::new())
            .await;

        match result {
            Ok(AdminAccessResponse {
                success: true,
                token: Some(token),
                ..
            }) if !token.is_empty() => {
                self.establish(token);
                self.persist_token();
                info!("Admin access granted");
                true
            }
            Ok(response) => {
                debug!("Admin access rejected");
                self.inner
                    .status
                    .fail(response.message.unwrap_or_else(|| ACCESS_DENIED_MESSAGE.to_string()));
                false
            }
            Err(err) => {
                warn!(error = %err, "Admin access request failed");
                self.inner.status.fail(
                    err.server_message()
                        .map_or_else(|| AUTH_FAILED_MESSAGE.to_string(), str::to_owned),
                );
                false
            }
        }
    }

    /// Validate the persisted token with the backend.
    ///
    /// Without a persisted token the session is cleared and no request is
    /// made. A rejected token or a failed request logs the session out.
    #[instrument(skip_all)]
    pub async fn check_token_validity(&self) -> bool {
        let Some(token) = self.stored_token() else {
            self.inner.state.write().token = None;
            return false;
        };

        let _loading = self.inner.status.begin();

        let result: Result<VerifyTokenResponse, _> = self
            .inner
            .api
            .post(
                &["api", "auth", "verify-token"],
                &VerifyTokenRequest { token: &token },
                HeaderMap::new(),
            )
            .await;

        match result {
            Ok(VerifyTokenResponse { success: true }) => {
                self.establish(token);
                debug!("Stored token is valid");
                true
            }
            Ok(_) => {
                info!("Stored token rejected, logging out");
                self.logout();
                false
            }
            Err(err) => {
                warn!(error = %err, "Token verification failed, logging out");
                self.logout();
                false
            }
        }
    }

    /// Re-validate the token if the last check is older than the refresh
    /// window, then report whether the session is usable.
    ///
    /// A session that has never been checked is always stale. The check time
    /// is recorded whatever the outcome.
    pub async fn check_and_refresh_token(&self) -> bool {
        let now = self.inner.clock.now();
        let stale = self
            .inner
            .state
            .read()
            .last_check
            .is_none_or(|last| now - last > self.inner.refresh_window);

        if stale {
            debug!("Token check is stale, re-validating");
            self.check_token_validity().await;
            self.inner.state.write().last_check = Some(self.inner.clock.now());
        }

        self.is_admin()
    }

    /// Restore the session from the persisted token.
    pub async fn init_auth(&self) -> bool {
        self.check_token_validity().await
    }

    /// Drop the session and the persisted token. Safe to call repeatedly.
    pub fn logout(&self) {
        {
            let mut state = self.inner.state.write();
            state.token = None;
            state.last_check = None;
        }
        if let Err(err) = self.inner.store.remove(keys::AUTH_TOKEN) {
            warn!(error = %err, "Failed to remove persisted token");
        }
    }

    /// `Authorization: Bearer <token>` when a token is held, else empty.
    #[must_use]
    pub fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let state = self.inner.state.read();
        let Some(token) = &state.token else {
            return headers;
        };

        match HeaderValue::from_str(&format!("Bearer {}", token.expose_secret())) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(err) => warn!(error = %err, "Token is not a valid header value"),
        }
        headers
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.inner.state.read().token.is_some()
    }

    /// Current bearer token, if any.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.inner
            .state
            .read()
            .token
            .as_ref()
            .map(|token| SecretString::from(token.expose_secret().to_owned()))
    }

    /// Time of the last successful or lazy validity check.
    #[must_use]
    pub fn last_check(&self) -> Option<DateTime<Utc>> {
        self.inner.state.read().last_check
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.status.is_loading()
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.inner.status.error()
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn establish(&self, token: String) {
        let now = self.inner.clock.now();
        let mut state = self.inner.state.write();
        state.token = Some(SecretString::from(token));
        state.last_check = Some(now);
    }

    fn persist_token(&self) {
        let Some(token) = self.token() else {
            return;
        };
        if let Err(err) = self.inner.store.set(keys::AUTH_TOKEN, token.expose_secret()) {
            warn!(error = %err, "Failed to persist token");
        }
    }

    fn stored_token(&self) -> Option<String> {
        match self.inner.store.get(keys::AUTH_TOKEN) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(err) => {
                warn!(error = %err, "Failed to read persisted token");
                None
            }
        }
    }
}
