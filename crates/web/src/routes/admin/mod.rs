//! Back office route handlers, mounted under `/admin`.
//!
//! # Route Structure
//!
//! ```text
//! GET  /login                       - Login page
//! POST /login                       - Login action (rate limited)
//! GET  /logout                      - Logout action
//!
//! # Everything below requires a logged-in admin
//! GET  /, /dashboard                - Dashboard
//! GET  /customers[?search=]         - Customer list / search
//! GET  /customers/{id}              - Customer detail with order history
//! POST /customers/{id}              - Update customer
//! GET  /products[?category=]        - Product list
//! GET  /products/new                - New product form
//! POST /products/new                - Create product
//! GET  /products/{id}               - Product detail / edit form
//! POST /products/{id}               - Update product
//! GET  /orders[?status=]            - Order list
//! GET  /orders/{id}                 - Order detail with items
//! POST /orders/{id}/update-status   - Change status
//! POST /orders/{id}/refund          - Refund and cancel
//! GET  /inquiries[?status=]         - Inquiry list
//! GET  /inquiries/{id}              - Inquiry detail
//! POST /inquiries/{id}/update-status - Change status
//! ```

pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod inquiries;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::form_rate_limiter;
use crate::state::AppState;

/// Number of rows per admin list page.
pub const PER_PAGE: i64 = 25;

/// Create the admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(form_rate_limiter())),
        )
        .route("/logout", get(auth::logout))
        .route("/", get(dashboard::index))
        .route("/dashboard", get(dashboard::index))
        .route("/customers", get(customers::index))
        .route("/customers/{id}", get(customers::show).post(customers::update))
        .route("/products", get(products::index))
        .route("/products/new", get(products::new).post(products::create))
        .route("/products/{id}", get(products::show).post(products::update))
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/update-status", post(orders::update_status))
        .route("/orders/{id}/refund", post(orders::refund))
        .route("/inquiries", get(inquiries::index))
        .route("/inquiries/{id}", get(inquiries::show))
        .route("/inquiries/{id}/update-status", post(inquiries::update_status))
}
