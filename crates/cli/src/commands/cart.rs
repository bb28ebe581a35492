//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! pachamama cart add 64f1c2 --quantity 2
//! pachamama cart show
//! pachamama cart checkout --name "Ana" --address "Calle 1" --phone 555
//! ```

use clap::Args;
use pachamama_core::{CustomerInfo, ProductId};
use pachamama_storefront::Storefront;

use super::CommandError;

/// Customer details sent with a checkout.
#[derive(Debug, Args)]
pub struct CheckoutArgs {
    #[arg(long, default_value = "")]
    pub name: String,

    #[arg(long, default_value = "")]
    pub address: String,

    #[arg(long, default_value = "")]
    pub phone: String,

    /// Extra notes for the order
    #[arg(long, default_value = "")]
    pub comments: String,
}

impl From<CheckoutArgs> for CustomerInfo {
    fn from(args: CheckoutArgs) -> Self {
        Self {
            name: args.name,
            address: args.address,
            phone: args.phone,
            comments: args.comments,
        }
    }
}

/// Show the cart.
///
/// # Errors
///
/// Returns `CommandError` if the cart cannot be loaded.
pub async fn show(storefront: &Storefront) -> Result<(), CommandError> {
    let cart = storefront.cart();
    if !cart.fetch_cart().await {
        return Err(CommandError::failed(cart.error(), "Failed to load cart"));
    }
    log_cart(storefront);
    Ok(())
}

/// Add units of a product.
///
/// # Errors
///
/// Returns `CommandError` if the backend rejects the change.
pub async fn add(storefront: &Storefront, product_id: &str, quantity: u32) -> Result<(), CommandError> {
    let cart = storefront.cart();
    if !cart.add_to_cart(&ProductId::new(product_id), quantity).await {
        return Err(CommandError::failed(cart.error(), "Failed to add to cart"));
    }
    log_cart(storefront);
    Ok(())
}

/// Remove a product.
///
/// # Errors
///
/// Returns `CommandError` if the backend rejects the change.
pub async fn remove(storefront: &Storefront, product_id: &str) -> Result<(), CommandError> {
    let cart = storefront.cart();
    if !cart.remove_from_cart(&ProductId::new(product_id)).await {
        return Err(CommandError::failed(cart.error(), "Failed to remove from cart"));
    }
    log_cart(storefront);
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns `CommandError` if the backend rejects the change.
pub async fn clear(storefront: &Storefront) -> Result<(), CommandError> {
    let cart = storefront.cart();
    if !cart.clear_cart().await {
        return Err(CommandError::failed(cart.error(), "Failed to clear cart"));
    }
    tracing::info!("Cart cleared");
    Ok(())
}

/// Submit the cart.
///
/// The cart is loaded first so checkout sees the server's contents.
///
/// # Errors
///
/// Returns `CommandError` if the cart is empty or the checkout fails.
pub async fn checkout(storefront: &Storefront, args: CheckoutArgs) -> Result<(), CommandError> {
    let cart = storefront.cart();
    if !cart.fetch_cart().await {
        return Err(CommandError::failed(cart.error(), "Failed to load cart"));
    }
    if cart.item_count() == 0 {
        return Err(CommandError::Failed("Cart is empty".to_owned()));
    }
    if !cart.checkout(&args.into()).await {
        return Err(CommandError::failed(cart.error(), "Checkout failed"));
    }
    tracing::info!("Order sent");
    Ok(())
}

fn log_cart(storefront: &Storefront) {
    let cart = storefront.cart().cart();
    tracing::info!("Session {}", storefront.cart().session_id());
    for item in &cart.items {
        let name = item
            .product
            .as_ref()
            .map_or_else(|| item.product_id.to_string(), |p| p.name.clone());
        tracing::info!("  {} x{}  ${}", name, item.quantity, item.line_total());
    }
    tracing::info!("{} item(s), total ${}", cart.item_count(), cart.total());
}
