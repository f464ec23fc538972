//! Session middleware configuration for admin.
//!
//! In-memory sessions using tower-sessions with a signed cookie
//! (SameSite=Strict, HttpOnly, 24hr inactivity expiry). Sessions do not
//! survive a restart; admins sign in again through the proxy.

use axum::Router;
use secrecy::ExposeSecret;
use tower_sessions::cookie::{Key, SameSite, time::Duration};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::{AdminConfig, ConfigError};

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "thala_admin_session";

/// Session expiry time in seconds (24 hours of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Derive the cookie signing key from the session secret.
///
/// # Errors
///
/// Returns `ConfigError::InsecureSecret` if the secret is shorter than 64 bytes.
pub fn signing_key(config: &AdminConfig) -> Result<Key, ConfigError> {
    Key::try_from(config.session_secret.expose_secret().as_bytes()).map_err(|_| {
        ConfigError::InsecureSecret(
            "ADMIN_SESSION_SECRET".to_string(),
            "must be at least 64 bytes to sign cookies".to_string(),
        )
    })
}

/// Wrap `router` in the signed session layer.
///
/// # Errors
///
/// Returns `ConfigError` if the signing key cannot be derived.
pub fn with_session_layer<S>(router: Router<S>, config: &AdminConfig) -> Result<Router<S>, ConfigError>
where
    S: Clone + Send + Sync + 'static,
{
    let key = signing_key(config)?;

    let layer = SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(SESSION_EXPIRY_SECONDS)))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key);

    Ok(router.layer(layer))
}
