//! Admin session against the stub backend.

#![allow(clippy::unwrap_used)]

use chrono::TimeDelta;
use pachamama_integration_tests::{TestContext, VALID_TOKEN};
use pachamama_storefront::storage::{KeyValueStore, keys};
use secrecy::{ExposeSecret, SecretString};

#[tokio::test]
async fn test_login_stores_token_and_sets_admin() {
    let ctx = TestContext::new().await;
    let auth = ctx.storefront.auth();

    ctx.login().await;

    assert!(auth.is_admin());
    assert_eq!(auth.token().unwrap().expose_secret(), VALID_TOKEN);
    assert_eq!(ctx.store.get(keys::AUTH_TOKEN).unwrap().as_deref(), Some(VALID_TOKEN));
    assert!(auth.last_check().is_some());
    assert_eq!(auth.error(), None);
}

#[tokio::test]
async fn test_wrong_secret_records_server_message() {
    let ctx = TestContext::new().await;
    let auth = ctx.storefront.auth();

    let ok = auth
        .verify_admin_access(&SecretString::from("wrong".to_string()))
        .await;

    assert!(!ok);
    assert!(!auth.is_admin());
    assert!(auth.token().is_none());
    assert_eq!(auth.error().as_deref(), Some("Invalid access key"));
    assert_eq!(ctx.store.get(keys::AUTH_TOKEN).unwrap(), None);
}

#[tokio::test]
async fn test_admin_flag_tracks_token_through_every_transition() {
    let ctx = TestContext::new().await;
    let auth = ctx.storefront.auth();
    let consistent = || auth.is_admin() == auth.token().is_some();

    assert!(consistent());
    ctx.login().await;
    assert!(consistent());
    assert!(auth.check_token_validity().await);
    assert!(consistent());
    ctx.stub().revoke_token();
    assert!(!auth.check_token_validity().await);
    assert!(consistent());
    auth.logout();
    assert!(consistent());
}

#[tokio::test]
async fn test_stored_token_restores_session() {
    let ctx = TestContext::new().await;
    ctx.store.set(keys::AUTH_TOKEN, VALID_TOKEN).unwrap();

    assert!(ctx.storefront.auth().init_auth().await);
    assert!(ctx.storefront.auth().is_admin());
    assert_eq!(ctx.stub().calls("verify-token"), 1);
}

#[tokio::test]
async fn test_missing_token_skips_network() {
    let ctx = TestContext::new().await;

    assert!(!ctx.storefront.auth().check_token_validity().await);
    assert_eq!(ctx.stub().total_calls(), 0);
}

#[tokio::test]
async fn test_rejected_token_logs_out() {
    let ctx = TestContext::new().await;
    ctx.store.set(keys::AUTH_TOKEN, "forged").unwrap();

    assert!(!ctx.storefront.auth().init_auth().await);
    assert_eq!(ctx.store.get(keys::AUTH_TOKEN).unwrap(), None);
}

#[tokio::test]
async fn test_refresh_checks_only_when_stale() {
    let ctx = TestContext::new().await;
    let auth = ctx.storefront.auth();
    ctx.store.set(keys::AUTH_TOKEN, VALID_TOKEN).unwrap();

    // Never checked, so the first call goes to the backend.
    assert!(auth.check_and_refresh_token().await);
    assert!(auth.check_and_refresh_token().await);
    assert_eq!(ctx.stub().calls("verify-token"), 1);

    ctx.clock.advance(TimeDelta::minutes(24));
    assert!(auth.check_and_refresh_token().await);
    assert_eq!(ctx.stub().calls("verify-token"), 1);

    ctx.clock.advance(TimeDelta::minutes(2));
    assert!(auth.check_and_refresh_token().await);
    assert_eq!(ctx.stub().calls("verify-token"), 2);
}

#[tokio::test]
async fn test_refresh_after_login_is_fresh() {
    let ctx = TestContext::new().await;
    ctx.login().await;

    assert!(ctx.storefront.auth().check_and_refresh_token().await);
    assert_eq!(ctx.stub().calls("verify-token"), 0);
}

#[tokio::test]
async fn test_stale_revoked_token_ends_session() {
    let ctx = TestContext::new().await;
    let auth = ctx.storefront.auth();
    ctx.login().await;

    ctx.stub().revoke_token();
    ctx.clock.advance(TimeDelta::minutes(30));

    assert!(!auth.check_and_refresh_token().await);
    assert!(!auth.is_admin());
    // The failed check still counts as a check.
    assert!(!auth.check_and_refresh_token().await);
    assert_eq!(ctx.stub().calls("verify-token"), 1);
}

#[tokio::test]
async fn test_logout_twice_matches_once() {
    let ctx = TestContext::new().await;
    let auth = ctx.storefront.auth();
    ctx.login().await;

    auth.logout();
    let after_one = (auth.is_admin(), auth.token().is_none(), auth.last_check());
    auth.logout();
    let after_two = (auth.is_admin(), auth.token().is_none(), auth.last_check());

    assert_eq!(after_one, after_two);
    assert!(auth.auth_headers().is_empty());
    assert_eq!(ctx.store.get(keys::AUTH_TOKEN).unwrap(), None);
}
