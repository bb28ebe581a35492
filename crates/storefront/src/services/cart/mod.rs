//! Server-side cart client.
//!
//! The backend owns the cart. Every successful response replaces the local
//! copy wholesale; counts and totals are derived from whatever was last
//! received.

mod handoff;
mod session;

pub use handoff::{LinkOpener, TracingOpener};
pub use session::SessionIdManager;

use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use pachamama_core::{Cart, CustomerInfo, Price, ProductId, SessionId};

use super::StoreStatus;
use crate::api::ApiClient;
use crate::error::ApiError;

// =============================================================================
// Wire types
// =============================================================================

/// `{ "data": ... }` wrapper used by every cart endpoint.
#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddRequest<'a> {
    session_id: &'a SessionId,
    product_id: &'a ProductId,
    quantity: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RemoveRequest<'a> {
    session_id: &'a SessionId,
    product_id: &'a ProductId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClearRequest<'a> {
    session_id: &'a SessionId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutRequest<'a> {
    session_id: &'a SessionId,
    customer_name: &'a str,
    customer_address: &'a str,
    customer_phone: &'a str,
    additional_info: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutData {
    #[serde(default)]
    whatsapp_url: Option<String>,
}

// =============================================================================
// CartClient
// =============================================================================

/// Client for the cart endpoints.
///
/// Cheap to clone; clones share one cart.
#[derive(Clone)]
pub struct CartClient {
    inner: Arc<CartInner>,
}

struct CartInner {
    api: ApiClient,
    session: SessionIdManager,
    opener: Arc<dyn LinkOpener>,
    cart: RwLock<Cart>,
    status: StoreStatus,
}

impl CartClient {
    #[must_use]
    pub fn new(api: ApiClient, session: SessionIdManager, opener: Arc<dyn LinkOpener>) -> Self {
        Self {
            inner: Arc::new(CartInner {
                api,
                session,
                opener,
                cart: RwLock::new(Cart::default()),
                status: StoreStatus::default(),
            }),
        }
    }

    /// Load the cart for this profile's session.
    ///
    /// A response without a cart payload is treated as an empty cart.
    #[instrument(skip_all)]
    pub async fn fetch_cart(&self) -> bool {
        let session_id = self.inner.session.get_or_create();
        let _loading = self.inner.status.begin();

        let result: Result<Envelope<Cart>, _> = self
            .inner
            .api
            .get(&["api", "cart", session_id.as_str()], &[])
            .await;

        match result {
            Ok(envelope) => {
                self.replace(envelope.data.unwrap_or_default());
                true
            }
            Err(err) => self.record_failure(&err, "Failed to load cart"),
        }
    }

    /// Add `quantity` units of a product.
    #[instrument(skip(self, product_id), fields(product_id = %product_id))]
    pub async fn add_to_cart(&self, product_id: &ProductId, quantity: u32) -> bool {
        let session_id = self.inner.session.get_or_create();
        let _loading = self.inner.status.begin();

        let request = AddRequest {
            session_id: &session_id,
            product_id,
            quantity,
        };
        let result = self.post_for_cart("add", &request).await;
        self.apply(result, "Failed to add to cart")
    }

    /// Remove every unit of a product.
    #[instrument(skip(self, product_id), fields(product_id = %product_id))]
    pub async fn remove_from_cart(&self, product_id: &ProductId) -> bool {
        let session_id = self.inner.session.get_or_create();
        let _loading = self.inner.status.begin();

        let request = RemoveRequest {
            session_id: &session_id,
            product_id,
        };
        let result = self.post_for_cart("remove", &request).await;
        self.apply(result, "Failed to remove from cart")
    }

    /// Empty the cart.
    #[instrument(skip_all)]
    pub async fn clear_cart(&self) -> bool {
        let session_id = self.inner.session.get_or_create();
        let _loading = self.inner.status.begin();

        let result = self
            .post_for_cart("clear", &ClearRequest { session_id: &session_id })
            .await;
        self.apply(result, "Failed to clear cart")
    }

    /// Submit the cart and hand the returned link to the [`LinkOpener`].
    ///
    /// An empty cart returns `false` without contacting the backend. On
    /// success the local cart is emptied.
    #[instrument(skip_all)]
    pub async fn checkout(&self, customer: &CustomerInfo) -> bool {
        if self.item_count() == 0 {
            debug!("Checkout skipped, cart is empty");
            return false;
        }

        let session_id = self.inner.session.get_or_create();
        let _loading = self.inner.status.begin();

        let request = CheckoutRequest {
            session_id: &session_id,
            customer_name: &customer.name,
            customer_address: &customer.address,
            customer_phone: &customer.phone,
            additional_info: &customer.comments,
        };
        let result: Result<Envelope<CheckoutData>, _> = self
            .inner
            .api
            .post(&["api", "cart", "checkout"], &request, HeaderMap::new())
            .await;

        match result {
            Ok(envelope) => {
                self.replace(Cart::default());
                match envelope.data.and_then(|data| data.whatsapp_url) {
                    Some(url) => {
                        info!(session_id = %session_id, "Checkout submitted");
                        self.inner.opener.open(&url);
                        true
                    }
                    None => {
                        warn!("Checkout response did not include a link");
                        self.inner.status.fail("Checkout did not return a link");
                        false
                    }
                }
            }
            Err(err) => self.record_failure(&err, "Failed to process checkout"),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Snapshot of the last cart received.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.inner.cart.read().clone()
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.inner.cart.read().item_count()
    }

    #[must_use]
    pub fn total(&self) -> Price {
        self.inner.cart.read().total()
    }

    /// Session identifier keying this cart, created on first use.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.inner.session.get_or_create()
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

    async fn post_for_cart<B: Serialize>(&self, action: &str, body: &B) -> Result<Envelope<Cart>, ApiError> {
        self.inner
            .api
            .post(&["api", "cart", action], body, HeaderMap::new())
            .await
    }

    fn apply(&self, result: Result<Envelope<Cart>, ApiError>, fallback: &str) -> bool {
        match result {
            Ok(envelope) => {
                self.replace(envelope.data.unwrap_or_default());
                true
            }
            Err(err) => self.record_failure(&err, fallback),
        }
    }

    fn replace(&self, cart: Cart) {
        *self.inner.cart.write() = cart;
    }

    fn record_failure(&self, err: &ApiError, fallback: &str) -> bool {
        warn!(error = %err, "{fallback}");
        self.inner
            .status
            .fail(err.server_message().unwrap_or(fallback));
        false
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use url::Url;

    use super::*;
    use crate::config::ClientConfig;
    use crate::storage::{KeyValueStore, MemoryStore};

    fn client() -> CartClient {
        let config = ClientConfig::new(Url::parse("http://127.0.0.1:9").unwrap());
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        CartClient::new(
            ApiClient::new(&config).unwrap(),
            SessionIdManager::new(store),
            Arc::new(TracingOpener),
        )
    }

    #[tokio::test]
    async fn test_checkout_on_empty_cart_is_rejected() {
        let cart = client();
        assert!(!cart.checkout(&CustomerInfo::default()).await);
        assert_eq!(cart.error(), None);
        assert!(cart.inner.session.current().is_none());
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_cart_and_records_error() {
        let cart = client();
        assert!(!cart.fetch_cart().await);
        assert_eq!(cart.error().as_deref(), Some("Failed to load cart"));
        assert!(cart.cart().items.is_empty());
        assert!(!cart.is_loading());
    }

    #[test]
    fn test_envelope_without_data_is_empty() {
        let envelope: Envelope<Cart> = serde_json::from_str("{}").unwrap();
        assert!(envelope.data.is_none());

        let envelope: Envelope<Cart> = serde_json::from_str(
            r#"{"data":{"items":[{"productId":"p1","quantity":2,"product":{"_id":"p1","name":"Tea","price":10}}]}}"#,
        )
        .unwrap();
        let cart = envelope.data.unwrap();
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total(), Price::from_units(20));
    }

    #[test]
    fn test_checkout_envelope_without_link() {
        let envelope: Envelope<CheckoutData> = serde_json::from_str(r#"{"data":{}}"#).unwrap();
        assert!(envelope.data.unwrap().whatsapp_url.is_none());

        let envelope: Envelope<CheckoutData> =
            serde_json::from_str(r#"{"data":{"whatsappUrl":"https://wa.me/1"}}"#).unwrap();
        assert_eq!(
            envelope.data.unwrap().whatsapp_url.as_deref(),
            Some("https://wa.me/1")
        );
    }

    #[test]
    fn test_checkout_request_wire_names() {
        let session_id = SessionId::new("session_abc");
        let request = CheckoutRequest {
            session_id: &session_id,
            customer_name: "Ana",
            customer_address: "Calle 1",
            customer_phone: "555",
            additional_info: "ring twice",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["sessionId"], "session_abc");
        assert_eq!(json["customerName"], "Ana");
        assert_eq!(json["customerAddress"], "Calle 1");
        assert_eq!(json["customerPhone"], "555");
        assert_eq!(json["additionalInfo"], "ring twice");
    }
}
