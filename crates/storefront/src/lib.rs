//! Pachamama storefront client library.
//!
//! Client-side services for the Pachamama storefront backend: admin
//! session management, the product catalog, the server-side cart,
//! user-facing notifications and the navigation guard for admin routes.
//!
//! [`Storefront`] wires every service to one backend and one state store.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod middleware;
pub mod retry;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;

pub use state::{Storefront, StorefrontError};
