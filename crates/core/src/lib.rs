//! Pachamama Core - Shared types library.
//!
//! This crate provides the domain types used across all Pachamama components:
//! - `storefront` - Client services for the storefront REST backend
//! - `cli` - Command-line front end over the storefront services
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere,
//! including in test doubles of the backend.
//!
//! # Modules
//!
//! - [`types`] - IDs, prices, products and carts
//! - [`text`] - Display helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod text;
pub mod types;

pub use types::*;
