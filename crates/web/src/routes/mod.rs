//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Readiness check (database)
//!
//! # Catalog
//! GET  /products[?category=]      - Product listing
//! GET  /products/{id}             - Product detail
//!
//! # Cart
//! GET  /cart                      - Cart page
//! POST /cart/add/{id}             - Add (merges into an existing line)
//! POST /cart/update/{id}          - Set quantity (0 removes)
//! POST /cart/remove/{id}          - Remove line
//!
//! # Checkout
//! GET  /checkout                  - Checkout form
//! POST /checkout                  - Place order
//! GET  /order/{id}                - Order confirmation
//!
//! # Contact
//! GET  /contact                   - Contact form
//! POST /contact                   - Submit inquiry (rate limited)
//!
//! # Payments
//! POST /webhooks/payments         - Processor webhook
//!
//! # Admin (see `admin` module)
//! /admin/...
//! ```

pub mod admin;
pub mod cart;
pub mod checkout;
pub mod contact;
pub mod home;
pub mod orders;
pub mod page;
pub mod products;
pub mod webhooks;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::SessionStore;
use tracing::Span;

use crate::middleware::{
    SessionKeyError, create_session_layer, form_rate_limiter, request_id_middleware,
    security_headers_middleware,
};
use crate::state::AppState;

/// Static assets served under `/static`.
const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add/{id}", post(cart::add))
        .route("/update/{id}", post(cart::update))
        .route("/remove/{id}", post(cart::remove))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create all storefront routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", get(checkout::show).post(checkout::submit))
        .route("/order/{id}", get(orders::confirmation))
        .route(
            "/contact",
            get(contact::show).merge(post(contact::submit).layer(form_rate_limiter())),
        )
        .route("/webhooks/payments", post(webhooks::payments))
}

/// Build the complete application.
///
/// The session store is injected so production can use `PostgreSQL` and tests
/// an in-memory store.
///
/// # Errors
///
/// Returns `SessionKeyError` if the session secret cannot sign cookies.
pub fn app<S>(state: AppState, session_store: S) -> Result<Router, SessionKeyError>
where
    S: SessionStore + Clone,
{
    let session_layer = create_session_layer(session_store, state.config())?;

    Ok(Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .nest("/admin", admin::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(from_fn(security_headers_middleware))
        .layer(session_layer)
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction()))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
