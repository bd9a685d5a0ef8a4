//! Schema creation command.
//!
//! # Usage
//!
//! ```bash
//! crumb-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`, or the discrete `DB_*` settings used by the server
//!
//! Every statement is `CREATE ... IF NOT EXISTS`, so running this against an
//! existing database is a no-op. The server runs the same step at startup.

use crumb_web::config::{ConfigError, DatabaseConfig};
use crumb_web::db::{self, RepositoryError};
use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

/// Errors that can occur while creating the schema.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Database settings are invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// A schema statement failed.
    #[error("Schema error: {0}")]
    Schema(#[from] RepositoryError),
}

/// Create the shop tables and the session table.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or a statement fails.
pub async fn run() -> Result<(), MigrationError> {
    let config = DatabaseConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config).await?;

    tracing::info!("Creating shop tables...");
    db::initialize_schema(&pool).await?;

    tracing::info!("Creating session table...");
    PostgresStore::new(pool.clone()).migrate().await?;

    db::close_pool(&pool).await;
    tracing::info!("Schema ready");
    Ok(())
}
