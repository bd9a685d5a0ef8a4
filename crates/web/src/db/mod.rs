//! Database operations for the shop's `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `customers` - Buyers, unique by email
//! - `products` - Catalog entries
//! - `orders` - One row per checkout, `stripe_payment_id` holds the payment reference
//! - `order_items` - Lines of an order, price snapshot at purchase time
//! - `inquiries` - Contact form submissions
//! - `tower_sessions.session` - Session storage (owned by `tower-sessions-sqlx-store`)
//!
//! # Schema
//!
//! The shop tables are created idempotently by [`initialize_schema`], either at
//! server startup or via:
//! ```bash
//! cargo run -p crumb-cli -- migrate
//! ```

pub mod customers;
pub mod inquiries;
pub mod order_items;
pub mod orders;
pub mod products;
mod schema;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use thiserror::Error;

use crate::config::DatabaseConfig;

pub use customers::CustomerRepository;
pub use inquiries::InquiryRepository;
pub use order_items::OrderItemRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// The pool could not hand out a connection (exhausted or unreachable).
    #[error("database unavailable: {0}")]
    Unavailable(sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (duplicate email, unknown reference, CHECK failure).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// An update was requested with no fields set.
    #[error("nothing to update")]
    NothingToUpdate,
}

impl RepositoryError {
    /// Whether the failure is a connectivity problem rather than a bad request.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db_err)
                if db_err.is_unique_violation()
                    || db_err.is_foreign_key_violation()
                    || db_err.is_check_violation() =>
            {
                let constraint = db_err.constraint().unwrap_or("unknown").to_owned();
                Self::Conflict(constraint)
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Unavailable(err)
            }
            other => Self::Database(other),
        }
    }
}

/// A window into a newest-first listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Default page size for admin listings.
    pub const DEFAULT_LIMIT: i64 = 100;

    /// Create a page from a limit and offset, clamping negatives to zero.
    #[must_use]
    pub const fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: if limit < 0 { 0 } else { limit },
            offset: if offset < 0 { 0 } else { offset },
        }
    }

    /// The first `limit` rows.
    #[must_use]
    pub const fn first(limit: i64) -> Self {
        Self::new(limit, 0)
    }

    /// One-based page number of `per_page` rows.
    #[must_use]
    pub const fn numbered(page: u32, per_page: i64) -> Self {
        let index = if page == 0 { 0 } else { page as i64 - 1 };
        Self::new(per_page, index.saturating_mul(per_page))
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::first(Self::DEFAULT_LIMIT)
    }
}

/// Build connection options from configuration.
fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions, sqlx::Error> {
    if let Some(url) = &config.url {
        return url.expose_secret().parse::<PgConnectOptions>();
    }

    let options = PgConnectOptions::new()
        .port(config.port)
        .database(&config.name)
        .username(&config.user)
        .password(config.password.expose_secret());

    // A leading slash names the directory holding the unix socket.
    Ok(if config.host.starts_with('/') {
        options.socket(&config.host)
    } else {
        options.host(&config.host)
    })
}

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
}

/// Create a `PostgreSQL` connection pool and open the minimum connections.
///
/// # Errors
///
/// Returns `sqlx::Error` if the options are invalid or the database cannot be
/// reached.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    pool_options(config)
        .connect_with(connect_options(config)?)
        .await
}

/// Create a pool that connects on first use.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection options are invalid.
pub fn create_lazy_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    Ok(pool_options(config).connect_lazy_with(connect_options(config)?))
}

/// Close every pooled connection. Called once at shutdown.
pub async fn close_pool(pool: &PgPool) {
    pool.close().await;
    tracing::info!("Database pool closed");
}

/// Create the shop tables if they do not already exist.
///
/// All statements run in one transaction; a failure rolls everything back.
///
/// # Errors
///
/// Returns `RepositoryError` if any statement fails.
pub async fn initialize_schema(pool: &PgPool) -> Result<(), RepositoryError> {
    let mut tx = pool.begin().await?;
    for statement in schema::STATEMENTS {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    tracing::info!(statements = schema::STATEMENTS.len(), "Schema initialized");
    Ok(())
}

/// Escape `%`, `_` and `\` so user input matches literally inside `LIKE`.
#[must_use]
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_numbering() {
        assert_eq!(Page::numbered(1, 20), Page::new(20, 0));
        assert_eq!(Page::numbered(3, 20), Page::new(20, 40));
        assert_eq!(Page::numbered(0, 20), Page::new(20, 0));
        assert_eq!(Page::default().limit, 100);
        assert_eq!(Page::new(-5, -1), Page::new(0, 0));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_wool\\"), "100\\%\\_wool\\\\");
        assert_eq!(escape_like("bunny"), "bunny");
    }

    #[test]
    fn test_pool_errors_are_unavailable() {
        assert!(RepositoryError::from(sqlx::Error::PoolTimedOut).is_unavailable());
        assert!(RepositoryError::from(sqlx::Error::PoolClosed).is_unavailable());
        assert!(!RepositoryError::from(sqlx::Error::RowNotFound).is_unavailable());
    }

    #[test]
    fn test_connect_options_from_url() {
        let config = DatabaseConfig {
            url: Some(secrecy::SecretString::from(
                "postgres://crumb:pw@db.internal:6543/shop",
            )),
            host: "ignored".to_string(),
            port: 1,
            name: "ignored".to_string(),
            user: "ignored".to_string(),
            password: secrecy::SecretString::from(""),
            min_connections: 1,
            max_connections: 10,
            acquire_timeout: std::time::Duration::from_secs(5),
        };
        let options = connect_options(&config).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_database(), Some("shop"));
    }
}
