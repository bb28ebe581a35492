//! Core types for the Pachamama storefront.
//!
//! This module provides type-safe wrappers and wire types for the storefront
//! backend's domain.

pub mod cart;
pub mod id;
pub mod price;
pub mod product;

pub use cart::{Cart, CartItem, CustomerInfo};
pub use id::{ProductId, SessionId};
pub use price::Price;
pub use product::{
    ALL_CATEGORIES, GENERAL_CATEGORY, Product, ProductInput, categories_from_products,
    is_listed_category, normalize_categories,
};
