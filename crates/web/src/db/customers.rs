//! Customer repository for database operations.

use sqlx::{PgConnection, PgExecutor, PgPool};

use crumb_core::{CustomerId, Email};

use super::{Page, RepositoryError, escape_like};
use crate::models::{Customer, CustomerPatch, NewCustomer};

/// Default number of rows returned by [`CustomerRepository::search`].
pub const DEFAULT_SEARCH_LIMIT: i64 = 50;

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a customer and return its id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Unavailable` if no connection could be acquired.
    pub async fn create(&self, customer: &NewCustomer) -> Result<CustomerId, RepositoryError> {
        insert(self.pool, customer).await
    }

    /// Get a customer by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn get_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let customer = sqlx::query_as::<_, Customer>(
            r"
            SELECT id, name, email, phone, address, created_at, updated_at
            FROM customers
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(customer)
    }

    /// Get a customer by exact email match.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<Customer>, RepositoryError> {
        let customer = sqlx::query_as::<_, Customer>(
            r"
            SELECT id, name, email, phone, address, created_at, updated_at
            FROM customers
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(customer)
    }

    /// List customers, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn list(&self, page: Page) -> Result<Vec<Customer>, RepositoryError> {
        let customers = sqlx::query_as::<_, Customer>(
            r"
            SELECT id, name, email, phone, address, created_at, updated_at
            FROM customers
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        Ok(customers)
    }

    /// Case-insensitive substring search over name and email.
    ///
    /// `%` and `_` in the query match literally.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn search(&self, query: &str, limit: i64) -> Result<Vec<Customer>, RepositoryError> {
        let pattern = format!("%{}%", escape_like(query.trim()));
        let customers = sqlx::query_as::<_, Customer>(
            r"
            SELECT id, name, email, phone, address, created_at, updated_at
            FROM customers
            WHERE name ILIKE $1 ESCAPE '\' OR email ILIKE $1 ESCAPE '\'
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            ",
        )
        .bind(pattern)
        .bind(limit.max(0))
        .fetch_all(self.pool)
        .await?;

        Ok(customers)
    }

    /// Apply a partial update and return the updated row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NothingToUpdate` for an empty patch,
    /// `RepositoryError::NotFound` if the customer does not exist, and
    /// `RepositoryError::Conflict` if the new email is taken.
    pub async fn update(
        &self,
        id: CustomerId,
        patch: &CustomerPatch,
    ) -> Result<Customer, RepositoryError> {
        if patch.is_empty() {
            return Err(RepositoryError::NothingToUpdate);
        }

        sqlx::query_as::<_, Customer>(
            r"
            UPDATE customers
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, phone, address, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(patch.name.as_deref())
        .bind(patch.email.as_ref())
        .bind(patch.phone.as_deref())
        .bind(patch.address.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Total number of customers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

/// Insert a customer on any executor.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the email already exists.
pub async fn insert<'e, E>(executor: E, customer: &NewCustomer) -> Result<CustomerId, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let id = sqlx::query_scalar::<_, CustomerId>(
        r"
        INSERT INTO customers (name, email, phone, address)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        ",
    )
    .bind(&customer.name)
    .bind(&customer.email)
    .bind(customer.phone.as_deref())
    .bind(customer.address.as_deref())
    .fetch_one(executor)
    .await?;

    Ok(id)
}

/// Return the id of the customer with this email, inserting one if needed.
///
/// Safe against a concurrent insert of the same email: the losing insert is
/// skipped and the winner's row is read back.
///
/// # Errors
///
/// Returns `RepositoryError` if either statement fails.
pub async fn find_or_create(
    conn: &mut PgConnection,
    customer: &NewCustomer,
) -> Result<CustomerId, RepositoryError> {
    let inserted = sqlx::query_scalar::<_, CustomerId>(
        r"
        INSERT INTO customers (name, email, phone, address)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO NOTHING
        RETURNING id
        ",
    )
    .bind(&customer.name)
    .bind(&customer.email)
    .bind(customer.phone.as_deref())
    .bind(customer.address.as_deref())
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = inserted {
        tracing::debug!(customer_id = %id, "Created customer at checkout");
        return Ok(id);
    }

    sqlx::query_scalar::<_, CustomerId>("SELECT id FROM customers WHERE email = $1")
        .bind(&customer.email)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(RepositoryError::NotFound)
}
