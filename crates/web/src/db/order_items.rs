//! Order item repository for database operations.

use sqlx::{PgExecutor, PgPool};

use crumb_core::{OrderId, OrderItemId};

use super::RepositoryError;
use crate::models::{NewOrderItem, OrderItemDetail};

/// Repository for order item database operations.
pub struct OrderItemRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderItemRepository<'a> {
    /// Create a new order item repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order line and return its id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` for an unknown order or product, or
    /// a quantity below one.
    pub async fn create(&self, item: &NewOrderItem) -> Result<OrderItemId, RepositoryError> {
        insert(self.pool, item).await
    }

    /// Lines of an order with product names, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn list_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<OrderItemDetail>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItemDetail>(
            r"
            SELECT oi.id, oi.order_id, oi.product_id, oi.quantity, oi.price_at_purchase,
                   p.name AS product_name
            FROM order_items oi
            LEFT JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            ORDER BY oi.id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }
}

/// Insert an order line on any executor.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` for an unknown order or product, or a
/// quantity below one.
pub async fn insert<'e, E>(executor: E, item: &NewOrderItem) -> Result<OrderItemId, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let id = sqlx::query_scalar::<_, OrderItemId>(
        r"
        INSERT INTO order_items (order_id, product_id, quantity, price_at_purchase)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        ",
    )
    .bind(item.order_id)
    .bind(item.product_id)
    .bind(item.quantity)
    .bind(item.price_at_purchase)
    .fetch_one(executor)
    .await?;

    Ok(id)
}
