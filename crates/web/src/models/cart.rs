//! Session-held shopping cart.
//!
//! The cart stores product ids and quantities only. Prices are read from the
//! catalog whenever the cart is shown and again at checkout.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_sessions::Session;

use crumb_core::ProductId;

use super::session_keys;

/// Largest quantity a single line may hold.
pub const MAX_LINE_QUANTITY: u32 = 999;

/// Errors from cart mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// Quantities must be at least one.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    /// The line would exceed [`MAX_LINE_QUANTITY`].
    #[error("quantity cannot exceed {MAX_LINE_QUANTITY}")]
    TooMany,
}

/// One product in the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A shopper's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Add `quantity` of a product, merging into an existing line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] for a zero quantity or an oversized line; the cart
    /// is unchanged in that case.
    pub fn add(&mut self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            let merged = line
                .quantity
                .checked_add(quantity)
                .filter(|q| *q <= MAX_LINE_QUANTITY)
                .ok_or(CartError::TooMany)?;
            line.quantity = merged;
        } else {
            if quantity > MAX_LINE_QUANTITY {
                return Err(CartError::TooMany);
            }
            self.lines.push(CartLine {
                product_id,
                quantity,
            });
        }
        Ok(())
    }

    /// Replace a line's quantity; zero removes the line.
    ///
    /// Returns `false` if the product was not in the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::TooMany`] for quantities above the line limit.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> Result<bool, CartError> {
        if quantity == 0 {
            return Ok(self.remove(product_id));
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(CartError::TooMany);
        }
        Ok(self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .map(|line| line.quantity = quantity)
            .is_some())
    }

    /// Remove a product's line. Returns `false` if it was not present.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Product ids in the cart.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.lines.iter().map(|l| l.product_id).collect()
    }

    // =========================================================================
    // Session persistence
    // =========================================================================

    /// Load the cart from the session. A missing or unreadable entry is an
    /// empty cart.
    pub async fn load(session: &Session) -> Self {
        match session.get::<Self>(session_keys::CART).await {
            Ok(cart) => cart.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read cart from session");
                Self::default()
            }
        }
    }

    /// Store the cart in the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn save(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(session_keys::CART, self).await
    }

    /// Remove the cart from the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn clear(session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.remove::<Self>(session_keys::CART).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const BUNNY: ProductId = ProductId::new(7);
    const SCARF: ProductId = ProductId::new(9);

    #[test]
    fn test_add_merges_quantities() {
        let mut cart = Cart::default();
        cart.add(BUNNY, 1).unwrap();
        cart.add(BUNNY, 2).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_add_keeps_insertion_order() {
        let mut cart = Cart::default();
        cart.add(SCARF, 1).unwrap();
        cart.add(BUNNY, 1).unwrap();
        cart.add(SCARF, 1).unwrap();
        assert_eq!(cart.product_ids(), vec![SCARF, BUNNY]);
    }

    #[test]
    fn test_add_rejects_zero_and_overflow() {
        let mut cart = Cart::default();
        assert_eq!(cart.add(BUNNY, 0), Err(CartError::ZeroQuantity));
        cart.add(BUNNY, MAX_LINE_QUANTITY).unwrap();
        assert_eq!(cart.add(BUNNY, 1), Err(CartError::TooMany));
        assert_eq!(cart.add(SCARF, u32::MAX), Err(CartError::TooMany));
        assert_eq!(cart.lines()[0].quantity, MAX_LINE_QUANTITY);
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn test_set_quantity_and_remove() {
        let mut cart = Cart::default();
        cart.add(BUNNY, 2).unwrap();
        assert!(cart.set_quantity(BUNNY, 5).unwrap());
        assert_eq!(cart.item_count(), 5);
        assert!(!cart.set_quantity(SCARF, 1).unwrap());

        assert!(cart.set_quantity(BUNNY, 0).unwrap());
        assert!(cart.is_empty());
        assert!(!cart.remove(BUNNY));
    }

    #[tokio::test]
    async fn test_session_round_trip() {
        use std::sync::Arc;
        use tower_sessions::MemoryStore;

        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        assert!(Cart::load(&session).await.is_empty());

        let mut cart = Cart::default();
        cart.add(BUNNY, 2).unwrap();
        cart.save(&session).await.unwrap();
        assert_eq!(Cart::load(&session).await, cart);

        Cart::clear(&session).await.unwrap();
        assert!(Cart::load(&session).await.is_empty());
    }
}
