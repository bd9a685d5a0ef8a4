//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Admin account verification (Argon2)
//! - `checkout` - Cart to paid order, in one transaction
//! - `event_log` - Best-effort Firestore event log
//! - `payments` - Payment gateway trait and the stub processor

pub mod auth;
pub mod checkout;
pub mod event_log;
pub mod payments;

pub use auth::{AdminCredentials, AuthError};
pub use checkout::{CheckoutDetails, CheckoutError, CheckoutService, PlacedOrder};
pub use event_log::{EventLog, InquiryEvent};
pub use payments::{PaymentGateway, StubPaymentGateway};
