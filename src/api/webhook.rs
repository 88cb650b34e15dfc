//! LINE webhook endpoint.

use axum::{body::Bytes, extract::State, http::HeaderMap};
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::{ApiError, AppState};
use crate::clients::line::{SIGNATURE_HEADER, WebhookPayload};

/// POST /callback
///
/// The signature covers the raw body, so it is checked before any parsing.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, ApiError> {
    let Some(signature) = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
    else {
        warn!("Webhook request without signature");
        metrics::counter!("webhook_messages_total", "outcome" => "bad_signature").increment(1);
        return Err(ApiError::validation("Missing signature"));
    };

    if !state.shared.signature_verifier.verify(&body, signature) {
        warn!("Webhook signature mismatch");
        metrics::counter!("webhook_messages_total", "outcome" => "bad_signature").increment(1);
        return Err(ApiError::validation("Invalid signature"));
    }

    let payload: WebhookPayload = serde_json::from_slice(&body)
        .map_err(|e| ApiError::validation(format!("Invalid webhook payload: {e}")))?;

    debug!(events = payload.events.len(), "Webhook received");

    for (reply_token, text) in payload
        .events
        .iter()
        .filter_map(|event| event.text_message())
    {
        if let Err(e) = state.shared.dispatcher.dispatch(reply_token, text).await {
            error!(error = %e, "Failed to dispatch message");
        }
    }

    Ok("OK")
}
