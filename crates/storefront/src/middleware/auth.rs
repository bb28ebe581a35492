//! Admin guard for flagged routes.
//!
//! Routes flagged `requires_auth` force a full token check before they are
//! entered. Anything else is entered without touching the auth session.

use tracing::{debug, info};

use crate::routes::{ADMIN_ACCESS_PATH, RouteMatch, RouteTable};
use crate::services::AuthSession;

/// Route-level redirects followed before giving up.
const MAX_REDIRECTS: usize = 5;

/// Outcome of a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Enter `route`. `path` is the final path after route redirects.
    Allow { path: String, route: RouteMatch },
    /// The guard refused entry; go to `to` instead.
    Redirect { to: String },
    /// No route matches the path.
    NotFound,
}

/// Guard applied to every navigation.
#[derive(Debug, Clone)]
pub struct NavigationGuard {
    routes: RouteTable,
    auth: AuthSession,
    fallback: String,
}

impl NavigationGuard {
    /// Guard that sends non-admins to the admin access view.
    #[must_use]
    pub fn new(routes: RouteTable, auth: AuthSession) -> Self {
        Self {
            routes,
            auth,
            fallback: ADMIN_ACCESS_PATH.to_owned(),
        }
    }

    /// Send refused navigations to `path` instead.
    #[must_use]
    pub fn with_fallback(mut self, path: impl Into<String>) -> Self {
        self.fallback = path.into();
        self
    }

    #[must_use]
    pub const fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Resolve a navigation to `path`.
    ///
    /// The auth check runs at most once per navigation, and only when a
    /// flagged route is reached.
    pub async fn navigate(&self, path: &str) -> Navigation {
        let mut current = path.to_owned();
        let mut admitted = false;

        for _ in 0..=MAX_REDIRECTS {
            let Some(matched) = self.routes.resolve(&current) else {
                debug!(path = %current, "No route matches");
                return Navigation::NotFound;
            };

            if matched.route.requires_auth && !admitted {
                self.auth.init_auth().await;
                if !self.auth.is_admin() {
                    info!(path = %current, to = %self.fallback, "Admin route refused");
                    return Navigation::Redirect {
                        to: self.fallback.clone(),
                    };
                }
                admitted = true;
            }

            match matched.route.redirect {
                Some(target) => {
                    debug!(from = %current, to = target, "Following route redirect");
                    target.clone_into(&mut current);
                }
                None => {
                    return Navigation::Allow {
                        path: current,
                        route: matched,
                    };
                }
            }
        }

        debug!(path, "Too many route redirects");
        Navigation::NotFound
    }
}
