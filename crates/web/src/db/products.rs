//! Product repository for database operations.

use sqlx::{PgExecutor, PgPool};

use crumb_core::{Category, ProductId};

use super::{Page, RepositoryError};
use crate::models::{NewProduct, Product, ProductPatch};

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a product and return its id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the price is negative.
    pub async fn create(&self, product: &NewProduct) -> Result<ProductId, RepositoryError> {
        let id = sqlx::query_scalar::<_, ProductId>(
            r"
            INSERT INTO products (name, description, price, category, image_url, stock_quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(&product.name)
        .bind(product.description.as_deref())
        .bind(product.price)
        .bind(product.category)
        .bind(product.image_url.as_deref())
        .bind(product.stock_quantity)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r"
            SELECT id, name, description, price, category, image_url, stock_quantity, created_at
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Get several products at once. Missing ids are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        fetch_many(self.pool, ids).await
    }

    /// List products, newest first, optionally restricted to one category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn list(
        &self,
        category: Option<Category>,
        page: Page,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(
            r"
            SELECT id, name, description, price, category, image_url, stock_quantity, created_at
            FROM products
            WHERE ($1::TEXT IS NULL OR category = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(category)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Apply a partial update and return the updated row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NothingToUpdate` for an empty patch,
    /// `RepositoryError::NotFound` if the product does not exist, and
    /// `RepositoryError::Conflict` for a negative price.
    pub async fn update(
        &self,
        id: ProductId,
        patch: &ProductPatch,
    ) -> Result<Product, RepositoryError> {
        if patch.is_empty() {
            return Err(RepositoryError::NothingToUpdate);
        }

        sqlx::query_as::<_, Product>(
            r"
            UPDATE products
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                category = COALESCE($5, category),
                image_url = COALESCE($6, image_url),
                stock_quantity = COALESCE($7, stock_quantity)
            WHERE id = $1
            RETURNING id, name, description, price, category, image_url, stock_quantity, created_at
            ",
        )
        .bind(id)
        .bind(patch.name.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.price)
        .bind(patch.category)
        .bind(patch.image_url.as_deref())
        .bind(patch.stock_quantity)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Total number of products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

/// Load the given products on any executor, in id order.
///
/// # Errors
///
/// Returns `RepositoryError` if the query fails.
pub async fn fetch_many<'e, E>(executor: E, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let products = sqlx::query_as::<_, Product>(
        r"
        SELECT id, name, description, price, category, image_url, stock_quantity, created_at
        FROM products
        WHERE id = ANY($1)
        ORDER BY id
        ",
    )
    .bind(ids)
    .fetch_all(executor)
    .await?;

    Ok(products)
}
