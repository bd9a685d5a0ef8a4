//! Core types for The Crocheted Crumb.
//!
//! This module provides type-safe wrappers for the shop's domain concepts.

pub mod email;
pub mod id;
pub mod lenient;
pub mod money;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use lenient::Lenient;
pub use money::{MoneyError, format_money, to_minor_units};
pub use status::*;
