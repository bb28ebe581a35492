//! Catalog commands.
//!
//! # Usage
//!
//! ```bash
//! # List products, optionally filtered
//! pachamama products list --search maca --category superfoods
//!
//! # Show one product
//! pachamama products show 64f1c2
//!
//! # Create a product (requires `pachamama admin login`)
//! pachamama products create --name "Maca" --price 18.50 --category Superfoods
//! ```

use clap::Args;
use pachamama_core::text::capitalize_first_letter;
use pachamama_core::{Price, Product, ProductId, ProductInput};
use pachamama_storefront::Storefront;

use super::CommandError;

/// Product fields accepted by `create` and `update`.
#[derive(Debug, Args)]
pub struct ProductArgs {
    /// Product name
    #[arg(short, long)]
    pub name: String,

    /// Unit price
    #[arg(short, long)]
    pub price: Price,

    /// Category (blank means uncategorized)
    #[arg(short, long, default_value = "")]
    pub category: String,

    /// Description
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Image URL
    #[arg(long)]
    pub image_url: Option<String>,

    /// Units in stock
    #[arg(long)]
    pub stock: Option<u32>,
}

impl From<ProductArgs> for ProductInput {
    fn from(args: ProductArgs) -> Self {
        let mut input = Self::new(args.name, args.price).with_category(args.category);
        input.description = args.description;
        input.image_url = args.image_url;
        input.stock = args.stock;
        input
    }
}

/// List products matching the given filters.
///
/// # Errors
///
/// Returns `CommandError` if the listing fails.
pub async fn list(
    storefront: &Storefront,
    search: Option<String>,
    category: Option<String>,
) -> Result<(), CommandError> {
    let catalog = storefront.catalog();
    if let Some(search) = search {
        catalog.set_search_term(search);
    }
    if let Some(category) = category {
        catalog.set_category(category);
    }

    let products = catalog.fetch_products().await;
    if let Some(error) = catalog.error() {
        return Err(CommandError::Failed(error));
    }

    tracing::info!("{} product(s)", products.len());
    for product in &products {
        log_product(product);
    }
    Ok(())
}

/// Show a single product.
///
/// # Errors
///
/// Returns `CommandError` if the product cannot be loaded.
pub async fn show(storefront: &Storefront, id: &str) -> Result<(), CommandError> {
    let catalog = storefront.catalog();
    let product = catalog
        .fetch_product(&ProductId::new(id))
        .await
        .ok_or_else(|| CommandError::failed(catalog.error(), "Product not found"))?;

    log_product(&product);
    if !product.description.is_empty() {
        tracing::info!("  {}", product.description);
    }
    if let Some(image_url) = &product.image_url {
        tracing::info!("  image: {image_url}");
    }
    Ok(())
}

/// List the listed categories.
pub async fn categories(storefront: &Storefront) {
    let categories = storefront.catalog().fetch_categories().await;
    tracing::info!("{} categor(ies)", categories.len());
    for category in &categories {
        tracing::info!("  {}", capitalize_first_letter(category));
    }
}

/// Create a product.
///
/// # Errors
///
/// Returns the backend error after retries.
pub async fn create(storefront: &Storefront, args: ProductArgs) -> Result<(), CommandError> {
    let product = storefront.catalog().create_product(&args.into()).await?;
    log_product(&product);
    Ok(())
}

/// Replace a product's fields.
///
/// # Errors
///
/// Returns the backend error after retries.
pub async fn update(storefront: &Storefront, id: &str, args: ProductArgs) -> Result<(), CommandError> {
    let product = storefront
        .catalog()
        .update_product(&ProductId::new(id), &args.into())
        .await?;
    log_product(&product);
    Ok(())
}

/// Delete a product.
///
/// # Errors
///
/// Returns the backend error after retries.
pub async fn delete(storefront: &Storefront, id: &str) -> Result<(), CommandError> {
    storefront.catalog().delete_product(&ProductId::new(id)).await?;
    Ok(())
}

fn log_product(product: &Product) {
    let stock = product
        .stock
        .map_or_else(String::new, |stock| format!(", {stock} in stock"));
    tracing::info!(
        "{}  {}  ${}  [{}]{}",
        product.id,
        product.name,
        product.price,
        capitalize_first_letter(&product.category),
        stock
    );
}
