//! Order repository for database operations.
//!
//! Reads used by the back office join the customer so lists can show who
//! placed each order without a second query.

use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};

use crumb_core::{CustomerId, OrderId, OrderStatus};

use super::{Page, RepositoryError};
use crate::models::{NewOrder, Order, OrderPatch, OrderSummary};

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order and return its id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the customer does not exist.
    pub async fn create(&self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        insert(self.pool, order).await
    }

    /// Get an order with its customer's name and email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<OrderSummary>, RepositoryError> {
        let order = sqlx::query_as::<_, OrderSummary>(
            r"
            SELECT o.id, o.customer_id, o.status, o.total_amount, o.stripe_payment_id,
                   o.created_at, o.updated_at,
                   c.name AS customer_name, c.email AS customer_email
            FROM orders o
            LEFT JOIN customers c ON c.id = o.customer_id
            WHERE o.id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// List orders newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
        page: Page,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let orders = sqlx::query_as::<_, OrderSummary>(
            r"
            SELECT o.id, o.customer_id, o.status, o.total_amount, o.stripe_payment_id,
                   o.created_at, o.updated_at,
                   c.name AS customer_name, c.email AS customer_email
            FROM orders o
            LEFT JOIN customers c ON c.id = o.customer_id
            WHERE ($1::TEXT IS NULL OR o.status = $1)
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(status)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// All orders placed by one customer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn get_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(
            r"
            SELECT id, customer_id, status, total_amount, stripe_payment_id, created_at, updated_at
            FROM orders
            WHERE customer_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Apply a partial update and return the updated row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NothingToUpdate` for an empty patch and
    /// `RepositoryError::NotFound` if the order does not exist.
    pub async fn update(&self, id: OrderId, patch: &OrderPatch) -> Result<Order, RepositoryError> {
        if patch.is_empty() {
            return Err(RepositoryError::NothingToUpdate);
        }

        sqlx::query_as::<_, Order>(
            r"
            UPDATE orders
            SET status = COALESCE($2, status),
                stripe_payment_id = COALESCE($3, stripe_payment_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, customer_id, status, total_amount, stripe_payment_id, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(patch.status)
        .bind(patch.payment_intent_id.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Set an order's status. Any status may replace any other.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        self.update(
            id,
            &OrderPatch {
                status: Some(status),
                ..OrderPatch::default()
            },
        )
        .await
    }

    /// Total number of orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Sum of order totals, excluding cancelled orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn revenue(&self) -> Result<Decimal, RepositoryError> {
        let total = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(total_amount), 0) FROM orders WHERE status <> 'cancelled'",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(total)
    }
}

/// Insert an order on any executor.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the customer does not exist.
pub async fn insert<'e, E>(executor: E, order: &NewOrder) -> Result<OrderId, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let id = sqlx::query_scalar::<_, OrderId>(
        r"
        INSERT INTO orders (customer_id, status, total_amount, stripe_payment_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        ",
    )
    .bind(order.customer_id)
    .bind(order.status)
    .bind(order.total_amount)
    .bind(order.payment_intent_id.as_deref())
    .fetch_one(executor)
    .await?;

    Ok(id)
}
