//! Webhook endpoint handler.
//!
//! Accepts GitHub webhook deliveries, validates signatures, parses the event
//! and returns 202 Accepted. Handling happens in a spawned task per delivery.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{Instrument, debug, info, info_span, warn};

use super::{AppState, Dispatch};
use crate::types::DeliveryId;
use crate::webhooks::{ParseError, parse_webhook, verify_delivery};

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub delivery ID.
const HEADER_DELIVERY: &str = "x-github-delivery";
/// HMAC-SHA256 signature header.
const HEADER_SIGNATURE_256: &str = "x-hub-signature-256";
/// Legacy HMAC-SHA1 signature header.
const HEADER_SIGNATURE_1: &str = "x-hub-signature";

/// Errors that can occur when accepting a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] ParseError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::MissingHeader(_) => StatusCode::BAD_REQUEST,
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
        };

        (status, self.to_string()).into_response()
    }
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Required headers:
///   - `X-GitHub-Event`: Event type (e.g., "pull_request", "issue_comment")
///   - `X-Hub-Signature-256` or `X-Hub-Signature`: HMAC of the payload
/// - Optional: `X-GitHub-Delivery`, used for log correlation only
/// - Body: JSON webhook payload
///
/// # Response
///
/// - 202 Accepted: event dispatched, or an event type the bot ignores
/// - 400 Bad Request: missing header or malformed payload
/// - 401 Unauthorized: missing or invalid signature
pub async fn webhook_handler<D: Dispatch>(
    State(app_state): State<AppState<D>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError> {
    let event_type = get_header(&headers, HEADER_EVENT)?;
    let delivery_id = DeliveryId::new(
        get_header(&headers, HEADER_DELIVERY).unwrap_or_else(|_| "unknown".to_string()),
    );

    debug!(
        delivery_id = %delivery_id,
        event_type = %event_type,
        "Received webhook"
    );

    // Signatures are checked before the body is parsed.
    let verified = verify_delivery(
        &body,
        header_str(&headers, HEADER_SIGNATURE_256),
        header_str(&headers, HEADER_SIGNATURE_1),
        app_state.webhook_secret(),
    );
    if !verified {
        warn!(delivery_id = %delivery_id, "Invalid webhook signature");
        return Err(WebhookError::InvalidSignature);
    }

    let event = match parse_webhook(&event_type, &body) {
        Ok(Some(event)) => event,
        Ok(None) => {
            debug!(delivery_id = %delivery_id, event_type = %event_type, "Ignoring event");
            return Ok((StatusCode::ACCEPTED, "Ignored"));
        }
        Err(e) => {
            warn!(delivery_id = %delivery_id, error = %e, "Malformed webhook payload");
            return Err(e.into());
        }
    };

    info!(
        delivery_id = %delivery_id,
        repo = %event.repo_id(),
        event_type = %event_type,
        "Dispatching webhook"
    );
    let dispatcher = app_state.dispatcher().clone();
    let span = info_span!("delivery", delivery_id = %delivery_id);
    tokio::spawn(async move { dispatcher.dispatch(event).await }.instrument(span));

    Ok((StatusCode::ACCEPTED, "Accepted"))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Extracts a required header value as a string.
fn get_header(headers: &HeaderMap, name: &'static str) -> Result<String, WebhookError> {
    header_str(headers, name)
        .map(|s| s.to_string())
        .ok_or(WebhookError::MissingHeader(name))
}
