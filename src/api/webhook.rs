//! Webhook handler for GitHub events

use axum::{Json, body::Bytes, extract::State as AxumState, http::HeaderMap};
use serde_json::{Value, json};
use tracing::{self, debug, error, info, instrument, warn};

use crate::SharedState;
use crate::api::ApiError;
use crate::error::RelayError;
use crate::render::try_render;
use crate::utils::verify_github_signature;
use crate::webhook::WebhookRequest;

/// Handles the GitHub webhook POST request.
///
/// Rendering happens inline; delivery to Discord is handed to a background
/// task, so the response never waits on the chat API and never reflects the
/// delivery outcome.
#[instrument(
    name = "github.webhook",
    skip_all,
    fields(
        event = tracing::field::Empty,
        delivery = tracing::field::Empty,
    )
)]
pub async fn handle_webhook(
    AxumState(state): AxumState<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let request = WebhookRequest::from_parts(&headers, body);

    let span = tracing::Span::current();
    span.record("event", request.event_type.as_str());
    span.record("delivery", request.delivery_id.as_str());

    if !verify_github_signature(
        &state.config.github_webhook_secret,
        &request.body,
        &request.signature,
    ) {
        warn!("Invalid GitHub webhook signature");
        let err = RelayError::WebhookValidationFailed("signature mismatch".to_string());
        return Err(err.into());
    }

    let payload: Value = serde_json::from_slice(&request.body).map_err(|e| {
        error!("Invalid JSON payload: {}", e);
        RelayError::MalformedPayload(e)
    })?;

    info!("Received {} event from GitHub", request.event_type);
    debug!("{:#?}", &payload);

    let event_type = request.event_type;
    match try_render(&event_type, payload) {
        Ok(Some(notification)) => {
            state
                .dispatcher
                .spawn_dispatch(notification, event_type.clone());

            Ok(Json(json!({
                "message": "Event received and queued for processing",
                "event_type": event_type,
            })))
        }
        Ok(None) => Ok(Json(json!({
            "message": "Event received but not processed",
            "event_type": event_type,
            "reason": "Unsupported event type",
        }))),
        Err(e) => {
            error!(
                "Error creating notification for {} event: {}",
                event_type, e
            );
            state
                .dispatcher
                .spawn_error_report(e.to_string(), event_type.clone());

            Ok(Json(json!({
                "message": "Event received but not processed",
                "event_type": event_type,
                "reason": "Payload could not be rendered",
            })))
        }
    }
}
