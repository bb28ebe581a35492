//! Navigation middleware.
//!
//! Runs before a route is entered and decides whether to enter it, send the
//! user elsewhere, or report that nothing matched.

pub mod auth;

pub use auth::{Navigation, NavigationGuard};
