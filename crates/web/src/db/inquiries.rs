//! Inquiry repository for database operations.

use sqlx::PgPool;

use crumb_core::{InquiryId, InquiryStatus};

use super::{Page, RepositoryError};
use crate::models::{Inquiry, NewInquiry};

/// Repository for contact inquiry database operations.
pub struct InquiryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InquiryRepository<'a> {
    /// Create a new inquiry repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an inquiry with status `new` and return its id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the insert fails.
    pub async fn create(&self, inquiry: &NewInquiry) -> Result<InquiryId, RepositoryError> {
        let id = sqlx::query_scalar::<_, InquiryId>(
            r"
            INSERT INTO inquiries (name, email, message, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&inquiry.name)
        .bind(&inquiry.email)
        .bind(&inquiry.message)
        .bind(InquiryStatus::New)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// Get an inquiry by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn get_by_id(&self, id: InquiryId) -> Result<Option<Inquiry>, RepositoryError> {
        let inquiry = sqlx::query_as::<_, Inquiry>(
            r"
            SELECT id, name, email, message, status, created_at, responded_at
            FROM inquiries
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(inquiry)
    }

    /// List inquiries newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn list(
        &self,
        status: Option<InquiryStatus>,
        page: Page,
    ) -> Result<Vec<Inquiry>, RepositoryError> {
        let inquiries = sqlx::query_as::<_, Inquiry>(
            r"
            SELECT id, name, email, message, status, created_at, responded_at
            FROM inquiries
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(status)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        Ok(inquiries)
    }

    /// Set an inquiry's status.
    ///
    /// Moving into `responded` or `closed` stamps `responded_at` with the
    /// current time; any other status leaves it as it was.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the inquiry does not exist.
    pub async fn update_status(
        &self,
        id: InquiryId,
        status: InquiryStatus,
    ) -> Result<Inquiry, RepositoryError> {
        sqlx::query_as::<_, Inquiry>(
            r"
            UPDATE inquiries
            SET status = $2,
                responded_at = CASE WHEN $3 THEN NOW() ELSE responded_at END
            WHERE id = $1
            RETURNING id, name, email, message, status, created_at, responded_at
            ",
        )
        .bind(id)
        .bind(status)
        .bind(status.stamps_response())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Number of inquiries with the given status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn count_by_status(&self, status: InquiryStatus) -> Result<i64, RepositoryError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM inquiries WHERE status = $1")
                .bind(status)
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }
}
