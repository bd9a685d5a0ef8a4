//! Contact inquiry model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crumb_core::{Email, InquiryId, InquiryStatus, Lenient};

/// A contact form submission.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Inquiry {
    pub id: InquiryId,
    pub name: String,
    pub email: Email,
    pub message: String,
    pub status: Lenient<InquiryStatus>,
    pub created_at: DateTime<Utc>,
    /// Set when the inquiry first moves to responded or closed.
    pub responded_at: Option<DateTime<Utc>>,
}

/// Fields for inserting an inquiry.
#[derive(Debug, Clone)]
pub struct NewInquiry {
    pub name: String,
    pub email: Email,
    pub message: String,
}
