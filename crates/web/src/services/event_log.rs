//! Secondary event log backed by Firestore.
//!
//! Writes go through the Firestore REST API. The log is best effort: writes are
//! spawned off the request path and failures are only logged.

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use thiserror::Error;

use crumb_core::{Email, InquiryId};

use crate::config::EventLogConfig;

/// Errors that can occur when writing to the event log.
#[derive(Debug, Error)]
pub enum EventLogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The access token is not a valid header value.
    #[error("invalid access token")]
    InvalidToken,
}

/// A contact inquiry as recorded in the log.
#[derive(Debug, Clone)]
pub struct InquiryEvent {
    pub inquiry_id: InquiryId,
    pub name: String,
    pub email: Email,
    pub timestamp: DateTime<Utc>,
}

impl InquiryEvent {
    /// Firestore document body with typed field values.
    fn to_document(&self) -> Value {
        json!({
            "fields": {
                "inquiry_id": { "integerValue": self.inquiry_id.to_string() },
                "name": { "stringValue": self.name },
                "email": { "stringValue": self.email.as_str() },
                "timestamp": {
                    "timestampValue": self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
                },
            }
        })
    }
}

#[derive(Clone)]
struct Client {
    http: reqwest::Client,
    documents_url: String,
    collection_prefix: String,
}

/// Handle to the event log. Cheap to clone.
#[derive(Clone, Default)]
pub struct EventLog {
    client: Option<Client>,
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl EventLog {
    /// A log that drops every event.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Build the log from configuration.
    ///
    /// Without a config or an access token the log is disabled.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not header-safe or the HTTP client fails
    /// to build.
    pub fn new(config: Option<&EventLogConfig>) -> Result<Self, EventLogError> {
        let Some(config) = config else {
            return Ok(Self::disabled());
        };
        let Some(token) = &config.access_token else {
            tracing::warn!(
                project_id = %config.project_id,
                "Event log project set without EVENT_LOG_ACCESS_TOKEN; event log disabled"
            );
            return Ok(Self::disabled());
        };

        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|_| EventLogError::InvalidToken)?;
        auth_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth_value);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client: Some(Client {
                http,
                documents_url: format!(
                    "{}/projects/{}/databases/(default)/documents",
                    config.endpoint.trim_end_matches('/'),
                    config.project_id
                ),
                collection_prefix: config.collection_prefix.clone(),
            }),
        })
    }

    /// Whether events are actually written.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Full collection name for `name`.
    #[must_use]
    pub fn collection(&self, name: &str) -> Option<String> {
        self.client
            .as_ref()
            .map(|c| format!("{}{name}", c.collection_prefix))
    }

    /// Record a new inquiry without waiting for the write.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn record_inquiry(&self, event: InquiryEvent) {
        let Some(client) = self.client.clone() else {
            tracing::debug!(inquiry_id = %event.inquiry_id, "Event log disabled; inquiry not recorded");
            return;
        };

        tokio::spawn(async move {
            if let Err(e) = client.write("inquiries", &event.to_document()).await {
                tracing::warn!(inquiry_id = %event.inquiry_id, error = %e, "Failed to record inquiry event");
            }
        });
    }
}

impl Client {
    async fn write(&self, collection: &str, document: &Value) -> Result<(), EventLogError> {
        let url = format!(
            "{}/{}{collection}",
            self.documents_url, self.collection_prefix
        );

        let response = self.http.post(&url).json(document).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EventLogError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!(collection, "Event recorded");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn config(token: Option<&str>) -> EventLogConfig {
        EventLogConfig {
            project_id: "crumb-test".to_string(),
            collection_prefix: "sarah_site_".to_string(),
            access_token: token.map(SecretString::from),
            endpoint: "https://firestore.googleapis.com/v1/".to_string(),
        }
    }

    #[test]
    fn test_disabled_without_config_or_token() {
        assert!(!EventLog::new(None).unwrap().is_enabled());
        assert!(!EventLog::new(Some(&config(None))).unwrap().is_enabled());
    }

    #[test]
    fn test_enabled_with_token() {
        let log = EventLog::new(Some(&config(Some("ya29.token")))).unwrap();
        assert!(log.is_enabled());
        assert_eq!(log.collection("inquiries").as_deref(), Some("sarah_site_inquiries"));

        let client = log.client.unwrap();
        assert_eq!(
            client.documents_url,
            "https://firestore.googleapis.com/v1/projects/crumb-test/databases/(default)/documents"
        );
    }

    #[test]
    fn test_token_with_newline_rejected() {
        let result = EventLog::new(Some(&config(Some("bad\ntoken"))));
        assert!(matches!(result, Err(EventLogError::InvalidToken)));
    }

    #[test]
    fn test_inquiry_document_shape() {
        let event = InquiryEvent {
            inquiry_id: InquiryId::new(42),
            name: "Ada".to_string(),
            email: Email::parse("ada@crumb.test").unwrap(),
            timestamp: DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };

        let doc = event.to_document();
        assert_eq!(doc["fields"]["inquiry_id"]["integerValue"], "42");
        assert_eq!(doc["fields"]["email"]["stringValue"], "ada@crumb.test");
        assert_eq!(
            doc["fields"]["timestamp"]["timestampValue"],
            "2024-05-01T12:00:00.000000Z"
        );
    }

    #[tokio::test]
    async fn test_disabled_record_is_noop() {
        EventLog::disabled().record_inquiry(InquiryEvent {
            inquiry_id: InquiryId::new(1),
            name: "Ada".to_string(),
            email: Email::parse("ada@crumb.test").unwrap(),
            timestamp: Utc::now(),
        });
    }
}
