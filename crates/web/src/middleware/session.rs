//! Session middleware configuration.
//!
//! Sessions carry the cart, flash messages and the admin login. The cookie
//! holds only the session id, signed with `SESSION_SECRET`.

use secrecy::ExposeSecret;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::config::{CrumbConfig, MIN_SESSION_SECRET_LENGTH};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "crumb_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// The session secret is too short to derive a signing key.
#[derive(Debug, thiserror::Error)]
#[error("session secret must be at least {MIN_SESSION_SECRET_LENGTH} bytes")]
pub struct SessionKeyError;

/// Create the session layer over any store.
///
/// Production uses `tower_sessions_sqlx_store::PostgresStore`; tests use
/// `tower_sessions::MemoryStore`.
///
/// # Errors
///
/// Returns `SessionKeyError` if the configured secret is shorter than
/// [`MIN_SESSION_SECRET_LENGTH`] bytes.
pub fn create_session_layer<S>(
    store: S,
    config: &CrumbConfig,
) -> Result<SessionManagerLayer<S, SignedCookie>, SessionKeyError>
where
    S: SessionStore + Clone,
{
    let key = Key::try_from(config.session_secret.expose_secret().as_bytes())
        .map_err(|_| SessionKeyError)?;

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}
