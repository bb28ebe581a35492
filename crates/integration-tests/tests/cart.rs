//! Cart flows against the stub backend.

#![allow(clippy::unwrap_used)]

use pachamama_core::{CustomerInfo, Price, ProductId};
use pachamama_integration_tests::TestContext;
use pachamama_storefront::storage::{KeyValueStore, keys};

fn seed(ctx: &TestContext) {
    ctx.stub().insert_product("p10", "Maca", 10, "Superfoods");
    ctx.stub().insert_product("p5", "Quinoa", 5, "Grains");
}

#[tokio::test]
async fn test_totals_follow_server_cart() {
    let ctx = TestContext::new().await;
    seed(&ctx);
    let cart = ctx.storefront.cart();

    assert!(cart.add_to_cart(&ProductId::new("p10"), 2).await);
    assert!(cart.add_to_cart(&ProductId::new("p5"), 1).await);

    assert_eq!(cart.item_count(), 3);
    assert_eq!(cart.total(), Price::from_units(25));
}

#[tokio::test]
async fn test_session_id_is_persisted_and_reused() {
    let ctx = TestContext::new().await;
    seed(&ctx);
    let cart = ctx.storefront.cart();

    assert!(cart.add_to_cart(&ProductId::new("p10"), 1).await);
    let session_id = ctx.store.get(keys::CART_SESSION_ID).unwrap().unwrap();
    assert!(session_id.starts_with("session_"));

    assert!(cart.fetch_cart().await);
    assert_eq!(cart.session_id().as_str(), session_id);
    assert_eq!(cart.item_count(), 1);
}

#[tokio::test]
async fn test_remove_and_clear_replace_local_cart() {
    let ctx = TestContext::new().await;
    seed(&ctx);
    let cart = ctx.storefront.cart();
    cart.add_to_cart(&ProductId::new("p10"), 2).await;
    cart.add_to_cart(&ProductId::new("p5"), 3).await;

    assert!(cart.remove_from_cart(&ProductId::new("p10")).await);
    assert_eq!(cart.item_count(), 3);

    assert!(cart.clear_cart().await);
    assert_eq!(cart.item_count(), 0);
    assert_eq!(cart.total(), Price::ZERO);
}

#[tokio::test]
async fn test_failed_add_records_server_message() {
    let ctx = TestContext::new().await;
    let cart = ctx.storefront.cart();

    assert!(!cart.add_to_cart(&ProductId::new("nope"), 1).await);
    assert_eq!(cart.error().as_deref(), Some("Product not found"));
}

#[tokio::test]
async fn test_checkout_on_empty_cart_makes_no_call() {
    let ctx = TestContext::new().await;

    assert!(!ctx.storefront.cart().checkout(&CustomerInfo::default()).await);
    assert_eq!(ctx.stub().total_calls(), 0);
    assert!(ctx.opener.opened().is_empty());
}

#[tokio::test]
async fn test_checkout_opens_link_and_empties_cart() {
    let ctx = TestContext::new().await;
    seed(&ctx);
    let cart = ctx.storefront.cart();
    cart.add_to_cart(&ProductId::new("p10"), 2).await;

    let customer = CustomerInfo {
        name: "Ana".to_string(),
        address: "Calle 1".to_string(),
        phone: "555".to_string(),
        comments: "ring twice".to_string(),
    };
    assert!(cart.checkout(&customer).await);

    assert_eq!(cart.item_count(), 0);
    let opened = ctx.opener.opened();
    assert_eq!(opened.len(), 1);
    assert!(opened.first().unwrap().starts_with("https://wa.me/"));

    let body = ctx.stub().checkouts().pop().unwrap();
    assert_eq!(body["customerName"], "Ana");
    assert_eq!(body["customerAddress"], "Calle 1");
    assert_eq!(body["customerPhone"], "555");
    assert_eq!(body["additionalInfo"], "ring twice");
    assert_eq!(body["sessionId"], cart.session_id().as_str());
}

#[tokio::test]
async fn test_checkout_without_link_clears_cart_and_reports() {
    let ctx = TestContext::new().await;
    seed(&ctx);
    ctx.stub().omit_checkout_link();
    let cart = ctx.storefront.cart();
    cart.add_to_cart(&ProductId::new("p5"), 1).await;

    assert!(!cart.checkout(&CustomerInfo::default()).await);

    assert_eq!(cart.item_count(), 0);
    assert_eq!(
        cart.error().as_deref(),
        Some("Checkout did not return a link")
    );
    assert!(ctx.opener.opened().is_empty());
    assert_eq!(ctx.stub().checkouts().len(), 1);
}
