//! Payment processor webhook.

use axum::{
    Json,
    extract::State,
    http::HeaderMap,
};
use tracing::instrument;

use crate::error::AppError;
use crate::services::payments::{PaymentGateway, WebhookAck, WebhookEvent};
use crate::state::AppState;

/// Header carrying the processor's payload signature.
pub const SIGNATURE_HEADER: &str = "payment-signature";

/// Acknowledge a processor event.
#[instrument(skip(state, headers, event))]
pub async fn payments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(event): Json<WebhookEvent>,
) -> Result<Json<WebhookAck>, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let ack = state.payments().handle_webhook(&event, signature).await?;
    Ok(Json(ack))
}
