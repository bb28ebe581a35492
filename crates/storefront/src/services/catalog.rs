//! Product catalog client.
//!
//! Reads are best-effort: a failed read records an error and returns an
//! empty result. Writes are authenticated, retried on transient failures,
//! and report their outcome through [`Notifications`].

use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::header::HeaderMap;
use tracing::{debug, error, info, instrument, warn};

use pachamama_core::{
    ALL_CATEGORIES, Product, ProductId, ProductInput, categories_from_products,
    is_listed_category, normalize_categories,
};

use super::StoreStatus;
use super::auth::AuthSession;
use super::notifications::Notifications;
use crate::api::ApiClient;
use crate::error::{ApiError, ErrorKind, WriteAction};
use crate::retry::RetryPolicy;

/// Search and category filters applied to product listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFilters {
    pub search_term: String,
    /// Category name, or `"all"` for no category filter.
    pub category: String,
}

impl Default for ProductFilters {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            category: ALL_CATEGORIES.to_owned(),
        }
    }
}

impl ProductFilters {
    /// Query parameters for the product listing. Unset filters are omitted.
    #[must_use]
    pub fn query(&self) -> Vec<(&'static str, &str)> {
        let mut query = Vec::new();
        if !self.search_term.is_empty() {
            query.push(("search", self.search_term.as_str()));
        }
        if !self.category.is_empty() && self.category != ALL_CATEGORIES {
            query.push(("category", self.category.as_str()));
        }
        query
    }
}

/// Catalog client.
///
/// Cheap to clone; clones share the cached product and category lists.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    api: ApiClient,
    auth: AuthSession,
    notifications: Notifications,
    retry: RetryPolicy,
    products: RwLock<Vec<Product>>,
    categories: RwLock<Vec<String>>,
    filters: RwLock<ProductFilters>,
    status: StoreStatus,
}

impl Catalog {
    #[must_use]
    pub fn new(
        api: ApiClient,
        auth: AuthSession,
        notifications: Notifications,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(CatalogInner {
                api,
                auth,
                notifications,
                retry,
                products: RwLock::new(Vec::new()),
                categories: RwLock::new(Vec::new()),
                filters: RwLock::new(ProductFilters::default()),
                status: StoreStatus::default(),
            }),
        }
    }

    // =========================================================================
    // Filters
    // =========================================================================

    pub fn set_search_term(&self, term: impl Into<String>) {
        self.inner.filters.write().search_term = term.into();
    }

    pub fn set_category(&self, category: impl Into<String>) {
        self.inner.filters.write().category = category.into();
    }

    pub fn reset_filters(&self) {
        *self.inner.filters.write() = ProductFilters::default();
    }

    #[must_use]
    pub fn filters(&self) -> ProductFilters {
        self.inner.filters.read().clone()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetch products matching the current filters and cache them.
    ///
    /// On failure the cache is left as it was and an empty list is returned.
    #[instrument(skip_all)]
    pub async fn fetch_products(&self) -> Vec<Product> {
        let _loading = self.inner.status.begin();
        let filters = self.filters();

        match self
            .inner
            .api
            .get::<Vec<Product>>(&["api", "products"], &filters.query())
            .await
        {
            Ok(products) => {
                debug!(count = products.len(), "Fetched products");
                self.inner.products.write().clone_from(&products);
                products
            }
            Err(err) => {
                error!(error = %err, "Failed to fetch products");
                self.inner.status.fail("Failed to load products");
                Vec::new()
            }
        }
    }

    /// Fetch a single product.
    #[instrument(skip(self, id), fields(product_id = %id))]
    pub async fn fetch_product(&self, id: &ProductId) -> Option<Product> {
        let _loading = self.inner.status.begin();

        match self
            .inner
            .api
            .get::<Product>(&["api", "products", id.as_str()], &[])
            .await
        {
            Ok(product) => Some(product),
            Err(err) => {
                error!(error = %err, "Failed to fetch product");
                self.inner.status.fail("Failed to load product");
                None
            }
        }
    }

    /// Fetch the listed categories.
    ///
    /// Falls back to the categories present in the cached products when the
    /// categories endpoint fails, loading products first if the cache is
    /// empty.
    #[instrument(skip_all)]
    pub async fn fetch_categories(&self) -> Vec<String> {
        let categories = match self
            .inner
            .api
            .get::<Vec<String>>(&["api", "products", "categories"], &[])
            .await
        {
            Ok(raw) => normalize_categories(raw),
            Err(err) => {
                warn!(error = %err, "Categories endpoint failed, deriving from products");
                if self.inner.products.read().is_empty() {
                    self.fetch_products().await;
                }
                categories_from_products(&self.inner.products.read())
            }
        };

        debug!(count = categories.len(), "Loaded categories");
        self.inner.categories.write().clone_from(&categories);
        categories
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns the final `ApiError` after retries. The failure is also pushed
    /// to the notification sink; an unauthorized response ends the admin
    /// session.
    #[instrument(skip_all, fields(name = %input.name))]
    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, ApiError> {
        let product = self
            .authenticated_write(WriteAction::Create, move |api, headers| async move {
                api.post::<_, Product>(&["api", "products"], input, headers).await
            })
            .await?;

        info!(product_id = %product.id, "Product created");
        self.reconcile_category(&input.category);
        self.inner.products.write().push(product.clone());
        self.inner.notifications.success("Product created successfully");
        Ok(product)
    }

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// Returns the final `ApiError` after retries. The failure is also pushed
    /// to the notification sink; an unauthorized response ends the admin
    /// session.
    #[instrument(skip_all, fields(product_id = %id))]
    pub async fn update_product(&self, id: &ProductId, input: &ProductInput) -> Result<Product, ApiError> {
        let product = self
            .authenticated_write(WriteAction::Update, move |api, headers| async move {
                api.put::<_, Product>(&["api", "products", id.as_str()], input, headers)
                    .await
            })
            .await?;

        info!(product_id = %product.id, "Product updated");
        self.reconcile_category(&input.category);
        if let Some(cached) = self
            .inner
            .products
            .write()
            .iter_mut()
            .find(|p| p.id == *id)
        {
            cached.clone_from(&product);
        }
        self.inner.notifications.success("Product updated successfully");
        Ok(product)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns the final `ApiError` after retries. The failure is also pushed
    /// to the notification sink; an unauthorized response ends the admin
    /// session.
    #[instrument(skip_all, fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), ApiError> {
        self.authenticated_write(WriteAction::Delete, move |api, headers| async move {
            api.delete(&["api", "products", id.as_str()], headers).await
        })
        .await?;

        info!(product_id = %id, "Product deleted");
        self.inner.products.write().retain(|p| p.id != *id);
        self.inner.notifications.success("Product deleted successfully");
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Products from the last successful listing.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.inner.products.read().clone()
    }

    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        self.inner.categories.read().clone()
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

    /// Refresh the token, then run `op` with auth headers under the retry
    /// policy. Only transient errors are retried.
    async fn authenticated_write<T, F, Fut>(&self, action: WriteAction, op: F) -> Result<T, ApiError>
    where
        F: Fn(ApiClient, HeaderMap) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let _loading = self.inner.status.begin();

        if !self.inner.auth.check_and_refresh_token().await {
            debug!(%action, "No valid admin session, sending request anyway");
        }
        let headers = self.inner.auth.auth_headers();

        self.inner
            .retry
            .run_if(
                || op(self.inner.api.clone(), headers.clone()),
                ApiError::is_transient,
            )
            .await
            .map_err(|err| self.write_failed(action, err))
    }

    fn write_failed(&self, action: WriteAction, err: ApiError) -> ApiError {
        if err.kind == ErrorKind::Unauthorized {
            warn!(%action, "Write rejected as unauthorized, ending admin session");
            self.inner.auth.logout();
        }

        let message = err.user_message(action);
        error!(%action, error = %err, "Product write failed");
        self.inner.notifications.error(message.clone());
        self.inner.status.fail(message);
        err
    }

    /// Add a newly seen category to the cached list.
    fn reconcile_category(&self, category: &str) {
        let category = category.trim();
        if !is_listed_category(category) {
            return;
        }
        let mut categories = self.inner.categories.write();
        if !categories.iter().any(|c| c == category) {
            categories.push(category.to_owned());
        }
    }
}
