//! Crumb Core - Shared domain types.
//!
//! This crate provides the types shared by every Crocheted Crumb component:
//! - `web` - Storefront and admin back office (one axum binary)
//! - `cli` - Schema initialization and admin credential tooling
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. Database encoding is opt-in through the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Entity IDs, emails, money helpers, categories and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
