//! Catalog product types.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Category value meaning "uncategorized".
///
/// Products fall back to it when no category is given, and it never shows
/// up in category listings.
pub const GENERAL_CATEGORY: &str = "General";

/// Filter value meaning "every category".
pub const ALL_CATEGORIES: &str = "all";

fn default_category() -> String {
    GENERAL_CATEGORY.to_owned()
}

/// A product as returned by the storefront backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Backend identifier.
    #[serde(rename = "_id", alias = "id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
}

impl Product {
    /// Whether this product carries a real, listable category.
    #[must_use]
    pub fn has_listed_category(&self) -> bool {
        is_listed_category(&self.category)
    }
}

/// Request body for creating or updating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
}

impl ProductInput {
    /// Create an input with the required fields; everything else defaults.
    #[must_use]
    pub fn new(name: impl Into<String>, price: Price) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            price,
            category: default_category(),
            image_url: None,
            stock: None,
        }
    }

    /// Set the category. Blank values fall back to [`GENERAL_CATEGORY`].
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        let category = category.into();
        self.category = if category.trim().is_empty() {
            default_category()
        } else {
            category
        };
        self
    }

    /// Build the product the backend would store under `id`.
    #[must_use]
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            category: self.category,
            image_url: self.image_url,
            stock: self.stock,
        }
    }
}

impl From<Product> for ProductInput {
    fn from(product: Product) -> Self {
        Self {
            name: product.name,
            description: product.description,
            price: product.price,
            category: product.category,
            image_url: product.image_url,
            stock: product.stock,
        }
    }
}

/// Whether a category should appear in category listings.
///
/// Blank values and the sentinel [`GENERAL_CATEGORY`] are excluded.
#[must_use]
pub fn is_listed_category(category: &str) -> bool {
    let trimmed = category.trim();
    !trimmed.is_empty() && trimmed != GENERAL_CATEGORY
}

/// Normalize a list of raw category names.
///
/// Trims every entry, drops unlisted ones and removes duplicates while
/// keeping first-seen order.
#[must_use]
pub fn normalize_categories<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut categories: Vec<String> = Vec::new();
    for category in raw {
        let trimmed = category.as_ref().trim();
        if is_listed_category(trimmed) && !categories.iter().any(|c| c == trimmed) {
            categories.push(trimmed.to_owned());
        }
    }
    categories
}

/// Collect the listed categories present in a set of products.
#[must_use]
pub fn categories_from_products(products: &[Product]) -> Vec<String> {
    normalize_categories(products.iter().map(|p| p.category.as_str()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: &str, category: &str) -> Product {
        ProductInput::new("Quinoa", Price::from_units(12))
            .with_category(category)
            .into_product(ProductId::new(id))
    }

    #[test]
    fn test_product_deserializes_backend_shape() {
        let json = r#"{
            "_id": "64f1",
            "name": "Maca en polvo",
            "price": 18.5,
            "imageUrl": "https://cdn.example/maca.jpg"
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, ProductId::new("64f1"));
        assert_eq!(product.category, GENERAL_CATEGORY);
        assert_eq!(product.description, "");
        assert_eq!(product.image_url.as_deref(), Some("https://cdn.example/maca.jpg"));
        assert!(!product.has_listed_category());
    }

    #[test]
    fn test_product_accepts_plain_id_field() {
        let json = r#"{"id": "7", "name": "Cacao", "price": 4, "category": "Superfoods"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id.as_str(), "7");
        assert!(product.has_listed_category());
    }

    #[test]
    fn test_input_serializes_camel_case() {
        let mut input = ProductInput::new("Cacao", Price::from_units(4)).with_category("Superfoods");
        input.image_url = Some("img.png".to_string());
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["imageUrl"], "img.png");
        assert_eq!(json["category"], "Superfoods");
        assert!(json.get("stock").is_none());
    }

    #[test]
    fn test_blank_category_falls_back_to_general() {
        let input = ProductInput::new("Cacao", Price::from_units(4)).with_category("   ");
        assert_eq!(input.category, GENERAL_CATEGORY);
    }

    #[test]
    fn test_normalize_categories() {
        let categories = normalize_categories([" Teas ", "General", "", "Teas", "Grains"]);
        assert_eq!(categories, vec!["Teas".to_string(), "Grains".to_string()]);
    }

    #[test]
    fn test_categories_from_products() {
        let products = vec![
            product("1", "Teas"),
            product("2", GENERAL_CATEGORY),
            product("3", "Grains"),
            product("4", "Teas"),
        ];
        assert_eq!(categories_from_products(&products), vec!["Teas", "Grains"]);
    }
}
