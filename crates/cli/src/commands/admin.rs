//! Admin session commands.
//!
//! # Usage
//!
//! ```bash
//! # Exchange the admin secret for a token (prompts from the environment)
//! pachamama admin login
//!
//! # Check whether the stored token is still valid
//! pachamama admin status
//!
//! # Forget the stored token
//! pachamama admin logout
//! ```
//!
//! # Environment Variables
//!
//! - `PACHAMAMA_ADMIN_KEY` - Admin secret used when `--secret` is not given

use pachamama_storefront::Storefront;
use pachamama_storefront::config::get_required_env;
use secrecy::SecretString;

use super::CommandError;

/// Exchange the admin secret for a token and persist it.
///
/// # Errors
///
/// Returns `CommandError` if no secret is available or the backend rejects it.
pub async fn login(storefront: &Storefront, secret: Option<String>) -> Result<(), CommandError> {
    let secret = match secret {
        Some(secret) => secret,
        None => get_required_env("PACHAMAMA_ADMIN_KEY")?,
    };
    let secret = SecretString::from(secret);

    let auth = storefront.auth();
    if !auth.verify_admin_access(&secret).await {
        return Err(CommandError::failed(auth.error(), "Admin access denied"));
    }

    tracing::info!("Admin access granted, token stored");
    Ok(())
}

/// Validate the stored token and report the session state.
pub async fn status(storefront: &Storefront) {
    let auth = storefront.auth();
    if auth.init_auth().await {
        tracing::info!("Admin session active");
    } else {
        tracing::info!("No admin session");
    }
}

/// Drop the admin session.
pub fn logout(storefront: &Storefront) {
    storefront.auth().logout();
    tracing::info!("Logged out");
}
