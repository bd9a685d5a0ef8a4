//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::CrumbConfig;
use crate::services::auth::{AdminCredentials, AuthError};
use crate::services::event_log::{EventLog, EventLogError};
use crate::services::payments::StubPaymentGateway;

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("admin credentials: {0}")]
    Admin(#[from] AuthError),
    #[error("event log: {0}")]
    EventLog(#[from] EventLogError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: CrumbConfig,
    pool: PgPool,
    payments: StubPaymentGateway,
    event_log: EventLog,
    admin: AdminCredentials,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Application configuration
    /// * `pool` - `PostgreSQL` connection pool, owned by the caller's lifecycle
    ///
    /// # Errors
    ///
    /// Returns an error if the admin password hash is malformed or the event
    /// log client cannot be built.
    pub fn new(config: CrumbConfig, pool: PgPool) -> Result<Self, StateError> {
        let payments = StubPaymentGateway::new(&config.payments);
        let event_log = EventLog::new(config.event_log.as_ref())?;
        let admin = AdminCredentials::from_config(&config.admin)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                payments,
                event_log,
                admin,
            }),
        })
    }

    /// Get a reference to the application configuration.
    #[must_use]
    pub fn config(&self) -> &CrumbConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the payment gateway.
    #[must_use]
    pub fn payments(&self) -> &StubPaymentGateway {
        &self.inner.payments
    }

    /// Get a reference to the event log.
    #[must_use]
    pub fn event_log(&self) -> &EventLog {
        &self.inner.event_log
    }

    /// Get a reference to the admin credentials.
    #[must_use]
    pub fn admin(&self) -> &AdminCredentials {
        &self.inner.admin
    }
}
