//! Session-related types.
//!
//! Types stored in the session for authentication and shopping state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session-stored admin identity.
///
/// Its presence in the session is the logged-in flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Configured admin username.
    pub username: String,
    /// When the login happened.
    pub logged_in_at: DateTime<Utc>,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for the shopping cart.
    pub const CART: &str = "cart";

    /// Key for pending flash messages.
    pub const FLASHES: &str = "flashes";

    /// Key for ids of orders placed in this session.
    pub const PLACED_ORDERS: &str = "placed_orders";
}
