//! Integration tests for The Crocheted Crumb.
//!
//! # Running Tests
//!
//! ```bash
//! # Router tests (no database needed)
//! cargo test -p crumb-integration-tests
//!
//! # Database tests
//! TEST_DATABASE_URL=postgres://postgres@localhost/crumb_test \
//!     cargo test -p crumb-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `storefront` - Public pages, cart, contact form, rate limiting
//! - `admin_auth` - Login, logout and the admin guard
//! - `database` - Repositories and checkout against a real `PostgreSQL`
//!
//! Router tests drive the application in-process with `tower::ServiceExt`,
//! an in-memory session store and a pool that never connects.

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::HashMap;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use sqlx::PgPool;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use crumb_web::config::CrumbConfig;
use crumb_web::db;
use crumb_web::state::AppState;

/// Admin login used by every test app.
pub const ADMIN_USERNAME: &str = "sarah";
/// Plaintext admin password; hashed when the state is built.
pub const ADMIN_PASSWORD: &str = "granny-square-42";

/// High-entropy signing key accepted by the config checks.
const SESSION_SECRET: &str = "q8Vt3LzR1mXa7NcKpW0yHs5JdFgB2eUi9oTnZrQx4vCl6MbAjYk8PwSfGhE3uDt1";

/// Set once the schema exists in the test database.
static SCHEMA_READY: tokio::sync::Mutex<bool> = tokio::sync::Mutex::const_new(false);

/// Nothing listens here, so a lazy pool fails fast.
const UNREACHABLE_DATABASE_URL: &str = "postgres://crumb@127.0.0.1:1/crumb_test";

/// Build a configuration for tests.
#[must_use]
pub fn test_config(database_url: &str, mock_mode: bool) -> CrumbConfig {
    let vars = HashMap::from([
        ("DATABASE_URL".to_string(), database_url.to_string()),
        ("DB_ACQUIRE_TIMEOUT_SECS".to_string(), "1".to_string()),
        ("SESSION_SECRET".to_string(), SESSION_SECRET.to_string()),
        ("ADMIN_USERNAME".to_string(), ADMIN_USERNAME.to_string()),
        ("ADMIN_PASSWORD".to_string(), ADMIN_PASSWORD.to_string()),
        ("MOCK_MODE".to_string(), mock_mode.to_string()),
    ]);
    CrumbConfig::from_map(&vars).expect("test configuration should be valid")
}

/// Application state whose pool never reaches a database.
#[must_use]
pub fn offline_state() -> AppState {
    let config = test_config(UNREACHABLE_DATABASE_URL, true);
    let pool = db::create_lazy_pool(&config.database).expect("lazy pool");
    AppState::new(config, pool).expect("state")
}

/// Build the full router with an in-memory session store.
#[must_use]
pub fn router(state: AppState) -> Router {
    crumb_web::app(state, MemoryStore::default()).expect("router")
}

/// Send one request through the router.
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone()
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {})
}

/// A GET request, optionally carrying a session cookie.
#[must_use]
pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

/// A form POST from `client_ip`, optionally carrying a session cookie.
#[must_use]
pub fn post_form(uri: &str, body: &str, client_ip: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("x-forwarded-for", client_ip);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_owned())).expect("request")
}

/// The `name=value` pair of the session cookie set by a response.
#[must_use]
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(crumb_web::middleware::session::SESSION_COOKIE_NAME))
        .and_then(|v| v.split(';').next())
        .map(str::to_owned)
}

/// Redirect target of a response.
#[must_use]
pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// Read a response body as text.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Log in as the test admin and return the session cookie.
pub async fn login(app: &Router, client_ip: &str) -> String {
    let body = format!("username={ADMIN_USERNAME}&password={ADMIN_PASSWORD}");
    let response = send(app, post_form("/admin/login", &body, client_ip, None)).await;
    assert_eq!(location(&response), Some("/admin"));
    session_cookie(&response).expect("login should set a session cookie")
}

/// Connect to `TEST_DATABASE_URL` and create the schema.
///
/// Returns `None` when the variable is unset so ignored tests can be run
/// selectively.
pub async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = PgPool::connect(&url).await.expect("connect to test database");

    // Concurrent CREATE TABLE IF NOT EXISTS can still collide in the catalog
    let mut initialized = SCHEMA_READY.lock().await;
    if !*initialized {
        db::initialize_schema(&pool).await.expect("schema");
        *initialized = true;
    }
    drop(initialized);

    Some(pool)
}

/// A unique email so tests do not collide on the unique constraint.
#[must_use]
pub fn unique_email(prefix: &str) -> crumb_core::Email {
    crumb_core::Email::parse(&format!("{prefix}-{}@crumb.test", uuid::Uuid::new_v4().simple()))
        .expect("valid email")
}
