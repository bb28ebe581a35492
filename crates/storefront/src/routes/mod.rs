//! Client-side route table.
//!
//! # Routes
//!
//! ```text
//! /                - Home
//! /product/:id     - Product detail
//! /cart            - Cart
//! /admin-access    - Admin secret entry
//! /admin           - Redirects to /admin/products (requires auth)
//! /admin/products  - Product management (requires auth)
//! ```

use std::collections::BTreeMap;

/// Path of the admin secret entry view.
pub const ADMIN_ACCESS_PATH: &str = "/admin-access";

/// A single route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Pattern; segments starting with `:` match any single segment.
    pub path: &'static str,
    pub name: &'static str,
    /// Entering the route requires a valid admin session.
    pub requires_auth: bool,
    /// Path to continue to once the route is entered.
    pub redirect: Option<&'static str>,
}

impl Route {
    #[must_use]
    pub const fn new(path: &'static str, name: &'static str) -> Self {
        Self {
            path,
            name,
            requires_auth: false,
            redirect: None,
        }
    }

    #[must_use]
    pub const fn requires_auth(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    #[must_use]
    pub const fn redirect_to(mut self, path: &'static str) -> Self {
        self.redirect = Some(path);
        self
    }

    /// Match `path` against this route's pattern, returning captured params.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let mut pattern = segments(self.path);
        let mut actual = segments(path);
        let mut params = BTreeMap::new();

        loop {
            match (pattern.next(), actual.next()) {
                (None, None) => return Some(params),
                (Some(expected), Some(segment)) => {
                    if let Some(name) = expected.strip_prefix(':') {
                        params.insert(name.to_owned(), segment.to_owned());
                    } else if expected != segment {
                        return None;
                    }
                }
                _ => return None,
            }
        }
    }
}

/// A route matched against a concrete path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub route: Route,
    pub params: BTreeMap<String, String>,
}

impl RouteMatch {
    /// Value captured for `:name`.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Ordered route list. The first matching route wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    #[must_use]
    pub const fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// Resolve `path`, ignoring any query string or fragment.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<RouteMatch> {
        let path = strip_query(path);
        self.routes.iter().find_map(|route| {
            route.matches(path).map(|params| RouteMatch {
                route: route.clone(),
                params,
            })
        })
    }

    /// Look up a route by name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.name == name)
    }

    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(vec![
            Route::new("/", "Home"),
            Route::new("/product/:id", "ProductDetail"),
            Route::new("/cart", "Cart"),
            Route::new(ADMIN_ACCESS_PATH, "AdminAccess"),
            Route::new("/admin", "Admin")
                .requires_auth()
                .redirect_to("/admin/products"),
            Route::new("/admin/products", "AdminProducts").requires_auth(),
        ])
    }
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_static_routes() {
        let table = RouteTable::default();
        assert_eq!(table.resolve("/").unwrap().route.name, "Home");
        assert_eq!(table.resolve("/cart").unwrap().route.name, "Cart");
        assert_eq!(table.resolve("/cart/").unwrap().route.name, "Cart");
        assert_eq!(table.resolve("/admin-access").unwrap().route.name, "AdminAccess");
        assert!(table.resolve("/nope").is_none());
    }

    #[test]
    fn test_resolve_captures_params() {
        let table = RouteTable::default();
        let matched = table.resolve("/product/64f1c2?ref=home").unwrap();
        assert_eq!(matched.route.name, "ProductDetail");
        assert_eq!(matched.param("id"), Some("64f1c2"));
        assert!(table.resolve("/product").is_none());
        assert!(table.resolve("/product/1/extra").is_none());
    }

    #[test]
    fn test_admin_routes_are_flagged() {
        let table = RouteTable::default();
        let admin = table.by_name("Admin").unwrap();
        assert!(admin.requires_auth);
        assert_eq!(admin.redirect, Some("/admin/products"));
        assert!(table.resolve("/admin/products").unwrap().route.requires_auth);
        assert!(!table.resolve("/").unwrap().route.requires_auth);
    }
}
