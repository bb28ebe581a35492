//! Navigation guard against the stub backend.

#![allow(clippy::unwrap_used)]

use pachamama_integration_tests::{TestContext, VALID_TOKEN};
use pachamama_storefront::middleware::Navigation;
use pachamama_storefront::storage::{KeyValueStore, keys};

#[tokio::test]
async fn test_admin_enters_flagged_route() {
    let ctx = TestContext::new().await;
    ctx.store.set(keys::AUTH_TOKEN, VALID_TOKEN).unwrap();

    let nav = ctx.storefront.guard().navigate("/admin/products").await;

    let Navigation::Allow { path, route } = nav else {
        panic!("expected Allow, got {nav:?}");
    };
    assert_eq!(path, "/admin/products");
    assert_eq!(route.route.name, "AdminProducts");
    assert_eq!(ctx.stub().calls("verify-token"), 1);
}

#[tokio::test]
async fn test_admin_follows_route_redirect_with_one_check() {
    let ctx = TestContext::new().await;
    ctx.store.set(keys::AUTH_TOKEN, VALID_TOKEN).unwrap();

    let nav = ctx.storefront.guard().navigate("/admin").await;

    let Navigation::Allow { path, .. } = nav else {
        panic!("expected Allow, got {nav:?}");
    };
    assert_eq!(path, "/admin/products");
    assert_eq!(ctx.stub().calls("verify-token"), 1);
}

#[tokio::test]
async fn test_non_admin_is_redirected() {
    let ctx = TestContext::new().await;
    ctx.store.set(keys::AUTH_TOKEN, "forged").unwrap();

    assert_eq!(
        ctx.storefront.guard().navigate("/admin/products").await,
        Navigation::Redirect {
            to: "/admin-access".to_string()
        }
    );
    assert!(!ctx.storefront.auth().is_admin());
}

#[tokio::test]
async fn test_public_routes_never_check_token() {
    let ctx = TestContext::new().await;
    ctx.store.set(keys::AUTH_TOKEN, VALID_TOKEN).unwrap();
    let guard = ctx.storefront.guard();

    for path in ["/", "/cart", "/product/p1", "/admin-access"] {
        assert!(matches!(guard.navigate(path).await, Navigation::Allow { .. }));
    }
    assert_eq!(ctx.stub().total_calls(), 0);
}

#[tokio::test]
async fn test_guard_rechecks_on_every_flagged_navigation() {
    let ctx = TestContext::new().await;
    ctx.login().await;
    let guard = ctx.storefront.guard();

    guard.navigate("/admin/products").await;
    ctx.stub().revoke_token();

    assert!(matches!(
        guard.navigate("/admin/products").await,
        Navigation::Redirect { .. }
    ));
    assert_eq!(ctx.stub().calls("verify-token"), 2);
}
