//! One-shot notices carried across a redirect.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::session_keys;

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl FlashLevel {
    /// CSS class suffix used by the templates.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    /// Queue a message for the next page.
    ///
    /// Failures are logged; losing a notice never fails the request.
    pub async fn push(session: &Session, level: FlashLevel, message: impl Into<String>) {
        let mut pending = session
            .get::<Vec<Self>>(session_keys::FLASHES)
            .await
            .ok()
            .flatten()
            .unwrap_or_default();
        pending.push(Self {
            level,
            message: message.into(),
        });

        if let Err(e) = session.insert(session_keys::FLASHES, &pending).await {
            tracing::warn!(error = %e, "Failed to store flash message");
        }
    }

    /// Remove and return every queued message.
    pub async fn take(session: &Session) -> Vec<Self> {
        match session.remove::<Vec<Self>>(session_keys::FLASHES).await {
            Ok(pending) => pending.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read flash messages");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_flashes_are_consumed_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        Flash::push(&session, FlashLevel::Success, "Thanks for your message!").await;
        Flash::push(&session, FlashLevel::Error, "Product not found.").await;

        let flashes = Flash::take(&session).await;
        assert_eq!(flashes.len(), 2);
        assert_eq!(flashes[0].level, FlashLevel::Success);
        assert_eq!(flashes[1].message, "Product not found.");

        assert!(Flash::take(&session).await.is_empty());
    }
}
