//! Order and order item models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crumb_core::{CustomerId, Email, Lenient, OrderId, OrderItemId, OrderStatus, ProductId};

/// An order row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub status: Lenient<OrderStatus>,
    /// Sum of line prices at checkout; never recomputed.
    pub total_amount: Decimal,
    /// Payment processor reference for the charge.
    #[sqlx(rename = "stripe_payment_id")]
    pub payment_intent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order joined with its customer's name and email.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub order: Order,
    pub customer_name: Option<String>,
    pub customer_email: Option<Email>,
}

/// Fields for inserting an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub payment_intent_id: Option<String>,
}

/// Partial update for an order.
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub payment_intent_id: Option<String>,
}

impl OrderPatch {
    /// Returns `true` if no field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none() && self.payment_intent_id.is_none()
    }
}

/// An order line.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    /// Unit price captured when the order was placed.
    pub price_at_purchase: Decimal,
}

impl OrderItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price_at_purchase * Decimal::from(self.quantity)
    }
}

/// An order line joined with the product's current name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItemDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub item: OrderItem,
    pub product_name: Option<String>,
}

/// Fields for inserting an order line.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub price_at_purchase: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let item = OrderItem {
            id: OrderItemId::new(1),
            order_id: OrderId::new(1),
            product_id: ProductId::new(7),
            quantity: 3,
            price_at_purchase: Decimal::new(1250, 2),
        };
        assert_eq!(item.line_total(), Decimal::new(3750, 2));
    }

    #[test]
    fn test_empty_patch() {
        assert!(OrderPatch::default().is_empty());
        let patch = OrderPatch {
            status: Some(OrderStatus::Shipped),
            ..OrderPatch::default()
        };
        assert!(!patch.is_empty());
    }
}
