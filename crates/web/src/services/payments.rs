//! Payment processing.
//!
//! [`PaymentGateway`] is the seam between checkout and a card processor.
//! [`StubPaymentGateway`] is the only implementation: it never contacts a
//! processor and reports every operation as succeeded, with deterministic
//! identifiers so orders can be traced back to the simulated charge.

use std::future::Future;
use std::hash::{DefaultHasher, Hash, Hasher};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crumb_core::{Email, MoneyError, to_minor_units};

use crate::config::PaymentConfig;

/// Currency used for every charge.
pub const DEFAULT_CURRENCY: &str = "usd";

/// Errors that can occur when talking to the payment processor.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The amount cannot be charged.
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] MoneyError),

    /// The processor declined the charge.
    #[error("payment declined: {0}")]
    Declined(String),

    /// The processor could not be reached or returned an error.
    #[error("payment provider error: {0}")]
    Provider(String),
}

/// Lifecycle state reported by the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    RequiresPaymentMethod,
    Processing,
    Succeeded,
    Canceled,
}

/// A payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Amount in cents.
    pub amount_minor_units: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub client_secret: String,
}

/// Outcome of confirming an intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentResult {
    pub success: bool,
    pub payment_intent_id: String,
    pub status: PaymentStatus,
}

/// A refund against an intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Refund {
    pub id: String,
    pub payment_intent_id: String,
    /// `None` means the full charge.
    pub amount_minor_units: Option<i64>,
    pub status: PaymentStatus,
}

/// Incoming webhook payload. Only the envelope fields are read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookEvent {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
}

/// Acknowledgement returned to the webhook sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    pub event_type: String,
    pub event_id: String,
    pub signature_verified: bool,
}

/// A saved card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentMethod {
    pub id: String,
    pub brand: String,
    pub last4: String,
    pub exp_month: u8,
    pub exp_year: u16,
}

/// A card processor.
pub trait PaymentGateway: Send + Sync {
    /// Create an intent to charge `amount` (major units).
    fn create_intent(
        &self,
        amount: Decimal,
        currency: &str,
        customer_email: Option<&Email>,
    ) -> impl Future<Output = Result<PaymentIntent, PaymentError>> + Send;

    /// Look up an intent.
    fn retrieve_intent(
        &self,
        intent_id: &str,
    ) -> impl Future<Output = Result<Option<PaymentIntent>, PaymentError>> + Send;

    /// Confirm an intent and capture the funds.
    fn process_payment(
        &self,
        intent_id: &str,
    ) -> impl Future<Output = Result<PaymentResult, PaymentError>> + Send;

    /// Refund all (`None`) or part of a charge.
    fn refund(
        &self,
        intent_id: &str,
        amount: Option<Decimal>,
    ) -> impl Future<Output = Result<Refund, PaymentError>> + Send;

    /// Acknowledge a webhook delivery.
    fn handle_webhook(
        &self,
        event: &WebhookEvent,
        signature: Option<&str>,
    ) -> impl Future<Output = Result<WebhookAck, PaymentError>> + Send;

    /// Cards saved for a customer.
    fn saved_payment_methods(
        &self,
        customer_email: &Email,
    ) -> impl Future<Output = Result<Vec<PaymentMethod>, PaymentError>> + Send;
}

/// Processor stand-in that approves everything.
#[derive(Debug, Clone)]
pub struct StubPaymentGateway {
    public_key: String,
}

impl StubPaymentGateway {
    /// Create the stub from payment configuration.
    #[must_use]
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            public_key: config.public_key.clone(),
        }
    }

    /// Publishable key for the checkout page.
    #[must_use]
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// `pi_stub_{cents}_{hash(email) % 100000}`.
    fn intent_id(minor_units: i64, customer_email: Option<&Email>) -> String {
        let mut hasher = DefaultHasher::new();
        customer_email
            .map_or("anonymous", Email::as_str)
            .hash(&mut hasher);
        format!("pi_stub_{minor_units}_{}", hasher.finish() % 100_000)
    }
}

impl PaymentGateway for StubPaymentGateway {
    async fn create_intent(
        &self,
        amount: Decimal,
        currency: &str,
        customer_email: Option<&Email>,
    ) -> Result<PaymentIntent, PaymentError> {
        let minor_units = to_minor_units(amount)?;
        let id = Self::intent_id(minor_units, customer_email);

        tracing::info!(intent_id = %id, amount = %amount, currency, "Stub payment intent created");
        Ok(PaymentIntent {
            client_secret: format!("{id}_secret_stub"),
            id,
            amount_minor_units: minor_units,
            currency: currency.to_owned(),
            status: PaymentStatus::Succeeded,
        })
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<Option<PaymentIntent>, PaymentError> {
        if !intent_id.starts_with("pi_") {
            return Ok(None);
        }

        // Amount is encoded in stub ids; anything else reads as zero.
        let amount_minor_units = intent_id
            .strip_prefix("pi_stub_")
            .and_then(|rest| rest.split('_').next())
            .and_then(|cents| cents.parse().ok())
            .unwrap_or(0);

        tracing::info!(intent_id, "Stub payment intent retrieved");
        Ok(Some(PaymentIntent {
            id: intent_id.to_owned(),
            amount_minor_units,
            currency: DEFAULT_CURRENCY.to_owned(),
            status: PaymentStatus::Succeeded,
            client_secret: format!("{intent_id}_secret_stub"),
        }))
    }

    async fn process_payment(&self, intent_id: &str) -> Result<PaymentResult, PaymentError> {
        tracing::info!(intent_id, "Stub payment processed");
        Ok(PaymentResult {
            success: true,
            payment_intent_id: intent_id.to_owned(),
            status: PaymentStatus::Succeeded,
        })
    }

    async fn refund(&self, intent_id: &str, amount: Option<Decimal>) -> Result<Refund, PaymentError> {
        let amount_minor_units = amount.map(to_minor_units).transpose()?;
        let refund = Refund {
            id: format!("re_stub_{intent_id}"),
            payment_intent_id: intent_id.to_owned(),
            amount_minor_units,
            status: PaymentStatus::Succeeded,
        };

        tracing::info!(refund_id = %refund.id, intent_id, "Stub refund created");
        Ok(refund)
    }

    async fn handle_webhook(
        &self,
        event: &WebhookEvent,
        signature: Option<&str>,
    ) -> Result<WebhookAck, PaymentError> {
        let ack = WebhookAck {
            received: true,
            event_type: event
                .event_type
                .clone()
                .unwrap_or_else(|| "unknown".to_owned()),
            event_id: event
                .id
                .clone()
                .unwrap_or_else(|| "evt_stub_unknown".to_owned()),
            signature_verified: false,
        };

        tracing::info!(
            event_type = %ack.event_type,
            event_id = %ack.event_id,
            signed = signature.is_some(),
            "Stub webhook acknowledged"
        );
        Ok(ack)
    }

    async fn saved_payment_methods(
        &self,
        customer_email: &Email,
    ) -> Result<Vec<PaymentMethod>, PaymentError> {
        tracing::info!(email = %customer_email, "Stub payment methods listed");
        Ok(vec![PaymentMethod {
            id: "pm_stub_card_1".to_owned(),
            brand: "visa".to_owned(),
            last4: "4242".to_owned(),
            exp_month: 12,
            exp_year: 2030,
        }])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn gateway() -> StubPaymentGateway {
        StubPaymentGateway::new(&PaymentConfig {
            public_key: "pk_test_stub_key".to_string(),
            secret_key: SecretString::from("sk_test_stub_key"),
        })
    }

    #[tokio::test]
    async fn test_create_intent_always_succeeds() {
        let email = Email::parse("buyer@crumb.test").unwrap();
        let intent = gateway()
            .create_intent(Decimal::new(5000, 2), DEFAULT_CURRENCY, Some(&email))
            .await
            .unwrap();

        assert_eq!(intent.status, PaymentStatus::Succeeded);
        assert_eq!(intent.amount_minor_units, 5000);
        assert!(intent.id.starts_with("pi_stub_5000_"));
        assert_eq!(intent.client_secret, format!("{}_secret_stub", intent.id));
    }

    #[tokio::test]
    async fn test_intent_ids_are_deterministic() {
        let stub = gateway();
        let a = stub.create_intent(Decimal::new(2550, 2), "usd", None).await.unwrap();
        let b = stub.create_intent(Decimal::new(2550, 2), "usd", None).await.unwrap();
        assert_eq!(a.id, b.id);

        let suffix: u64 = a.id.rsplit('_').next().unwrap().parse().unwrap();
        assert!(suffix < 100_000);
    }

    #[tokio::test]
    async fn test_create_intent_truncates_fractional_cents() {
        let intent = gateway()
            .create_intent(Decimal::new(19_999, 3), "usd", None)
            .await
            .unwrap();
        assert_eq!(intent.amount_minor_units, 1999);
    }

    #[tokio::test]
    async fn test_create_intent_rejects_negative_amount() {
        let result = gateway().create_intent(Decimal::new(-100, 2), "usd", None).await;
        assert!(matches!(result, Err(PaymentError::InvalidAmount(_))));
    }

    #[tokio::test]
    async fn test_retrieve_requires_intent_prefix() {
        let stub = gateway();
        assert!(stub.retrieve_intent("ch_123").await.unwrap().is_none());
        let intent = stub.retrieve_intent("pi_stub_2500_42").await.unwrap().unwrap();
        assert_eq!(intent.amount_minor_units, 2500);
    }

    #[tokio::test]
    async fn test_process_and_refund() {
        let stub = gateway();
        let result = stub.process_payment("pi_stub_2500_42").await.unwrap();
        assert!(result.success);

        let full = stub.refund("pi_stub_2500_42", None).await.unwrap();
        assert_eq!(full.id, "re_stub_pi_stub_2500_42");
        assert_eq!(full.amount_minor_units, None);

        let partial = stub
            .refund("pi_stub_2500_42", Some(Decimal::new(1000, 2)))
            .await
            .unwrap();
        assert_eq!(partial.amount_minor_units, Some(1000));
    }

    #[tokio::test]
    async fn test_webhook_defaults() {
        let ack = gateway()
            .handle_webhook(&WebhookEvent::default(), None)
            .await
            .unwrap();
        assert!(ack.received);
        assert_eq!(ack.event_type, "unknown");
        assert_eq!(ack.event_id, "evt_stub_unknown");
        assert!(!ack.signature_verified);
    }

    #[tokio::test]
    async fn test_saved_payment_methods() {
        let email = Email::parse("buyer@crumb.test").unwrap();
        let methods = gateway().saved_payment_methods(&email).await.unwrap();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].last4, "4242");
    }
}
