//! Crumb Web library.
//!
//! The storefront (`/`) and the admin back office (`/admin`) are served by a
//! single axum application. Everything except process bootstrapping lives in
//! this library so the integration tests can drive the router directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use routes::app;
