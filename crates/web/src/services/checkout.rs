//! Checkout orchestration.
//!
//! Turns a session cart into a paid order. Everything from pricing the cart to
//! the last order line happens inside one database transaction, so a failure
//! at any step leaves no customer, order or item rows behind.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use crumb_core::{Email, OrderId, OrderStatus, ProductId};

use super::payments::{DEFAULT_CURRENCY, PaymentError, PaymentGateway};
use crate::db::{RepositoryError, customers, order_items, orders, products};
use crate::models::{Cart, CartLine, NewCustomer, NewOrder, NewOrderItem, Product};

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to buy.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart line refers to a product that no longer exists.
    #[error("product {0} is no longer available")]
    UnknownProduct(ProductId),

    /// A line quantity does not fit the order table.
    #[error("invalid quantity for product {0}")]
    InvalidQuantity(ProductId),

    /// The payment processor refused or failed.
    #[error("payment failed: {0}")]
    Payment(#[from] PaymentError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::from(err))
    }
}

/// Buyer details collected by the checkout form.
#[derive(Debug, Clone)]
pub struct CheckoutDetails {
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// A committed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub total: Decimal,
    pub payment_intent_id: String,
}

/// One cart line with the price it will be charged at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl PricedLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Match cart lines to current catalog prices.
///
/// # Errors
///
/// Returns `CheckoutError::UnknownProduct` for the first line whose product is
/// missing from `catalog`.
pub fn price_lines(lines: &[CartLine], catalog: &[Product]) -> Result<Vec<PricedLine>, CheckoutError> {
    let prices: HashMap<ProductId, Decimal> = catalog.iter().map(|p| (p.id, p.price)).collect();

    lines
        .iter()
        .map(|line| {
            let unit_price = *prices
                .get(&line.product_id)
                .ok_or(CheckoutError::UnknownProduct(line.product_id))?;
            Ok(PricedLine {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price,
            })
        })
        .collect()
}

/// Sum of line totals. No tax, shipping or discounts.
#[must_use]
pub fn order_total(lines: &[PricedLine]) -> Decimal {
    lines.iter().map(PricedLine::line_total).sum()
}

/// Places orders against the database and a payment gateway.
pub struct CheckoutService<'a, P> {
    pool: &'a PgPool,
    payments: &'a P,
}

impl<'a, P: PaymentGateway> CheckoutService<'a, P> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, payments: &'a P) -> Self {
        Self { pool, payments }
    }

    /// Place an order for everything in `cart`.
    ///
    /// The caller clears the cart only after this returns `Ok`.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` for an empty cart,
    /// `CheckoutError::UnknownProduct` if a product has been deleted,
    /// `CheckoutError::Payment` if the charge fails, and
    /// `CheckoutError::Repository` for database failures. The transaction is
    /// rolled back in every error case.
    #[instrument(skip(self, cart, details), fields(email = %details.email, lines = cart.lines().len()))]
    pub async fn place_order(
        &self,
        cart: &Cart,
        details: &CheckoutDetails,
    ) -> Result<PlacedOrder, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        // Dropping `tx` on any early return rolls it back.
        let mut tx = self.pool.begin().await?;

        let catalog = products::fetch_many(&mut *tx, &cart.product_ids()).await?;
        let lines = price_lines(cart.lines(), &catalog)?;
        let total = order_total(&lines);

        let customer_id = customers::find_or_create(
            &mut *tx,
            &NewCustomer {
                name: details.name.clone(),
                email: details.email.clone(),
                phone: details.phone.clone(),
                address: details.address.clone(),
            },
        )
        .await?;

        let intent = self
            .payments
            .create_intent(total, DEFAULT_CURRENCY, Some(&details.email))
            .await?;

        let order_id = orders::insert(
            &mut *tx,
            &NewOrder {
                customer_id,
                status: OrderStatus::Paid,
                total_amount: total,
                payment_intent_id: Some(intent.id.clone()),
            },
        )
        .await?;

        for line in &lines {
            let quantity = i32::try_from(line.quantity)
                .map_err(|_| CheckoutError::InvalidQuantity(line.product_id))?;
            order_items::insert(
                &mut *tx,
                &NewOrderItem {
                    order_id,
                    product_id: line.product_id,
                    quantity,
                    price_at_purchase: line.unit_price,
                },
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            order_id = %order_id,
            customer_id = %customer_id,
            total = %total,
            "Order placed"
        );

        Ok(PlacedOrder {
            order_id,
            total,
            payment_intent_id: intent.id,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn product(id: i32, price: Decimal) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: None,
            price,
            category: None,
            image_url: None,
            stock_quantity: 5,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_price_lines_uses_catalog_prices() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(7), 2).unwrap();

        let lines = price_lines(cart.lines(), &[product(7, Decimal::new(2500, 2))]).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].unit_price, Decimal::new(2500, 2));
        assert_eq!(order_total(&lines), Decimal::new(5000, 2));
    }

    #[test]
    fn test_total_is_exact() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(1), 3).unwrap();
        cart.add(ProductId::new(2), 1).unwrap();

        let catalog = [product(1, Decimal::new(10, 2)), product(2, Decimal::new(20, 2))];
        let lines = price_lines(cart.lines(), &catalog).unwrap();
        assert_eq!(order_total(&lines), Decimal::new(50, 2));
    }

    #[test]
    fn test_missing_product_is_rejected() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(7), 1).unwrap();
        cart.add(ProductId::new(8), 1).unwrap();

        let result = price_lines(cart.lines(), &[product(7, Decimal::ONE)]);
        assert!(matches!(result, Err(CheckoutError::UnknownProduct(id)) if id == ProductId::new(8)));
    }

    #[test]
    fn test_empty_total_is_zero() {
        assert_eq!(order_total(&[]), Decimal::ZERO);
    }
}
