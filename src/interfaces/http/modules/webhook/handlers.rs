//! `POST /webhook` dispatcher

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::Value;
use tracing::{debug, warn};

use super::dto::{WebhookAck, WebhookEvent, WebhookPayload};
use crate::application::LifecycleEngine;
use crate::interfaces::http::common::{bad_request, domain_error, ApiError, ApiResponse};

#[derive(Clone)]
pub struct WebhookState {
    pub engine: Arc<LifecycleEngine>,
}

/// Precondition skips (duplicate entry, unknown spot, full sector, ...) are
/// acknowledged like applied events.
#[utoipa::path(
    post,
    path = "/webhook",
    tag = "Webhook",
    request_body = WebhookPayload,
    responses(
        (status = 200, description = "Event accepted", body = ApiResponse<WebhookAck>),
        (status = 400, description = "Malformed event"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn receive_event(
    State(state): State<WebhookState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<WebhookAck>>, ApiError> {
    let Json(payload) = payload.map_err(|r| bad_request(format!("Invalid JSON: {}", r.body_text())))?;

    let event = WebhookEvent::decode(&payload, state.engine.now()).map_err(|e| {
        warn!(error = %e, "Rejected webhook payload");
        bad_request(format!("Invalid event payload: {}", e))
    })?;

    let engine = &state.engine;
    let outcome = match &event {
        WebhookEvent::Entry {
            license_plate,
            entry_time,
        } => engine
            .register_entry(license_plate, *entry_time)
            .await
            .map(|o| o.label()),
        WebhookEvent::Parked {
            license_plate,
            lat,
            lng,
        } => engine
            .assign_spot(license_plate, *lat, *lng)
            .await
            .map(|o| o.label()),
        WebhookEvent::Exit {
            license_plate,
            exit_time,
        } => engine
            .handle_exit(license_plate, *exit_time)
            .await
            .map(|o| o.label()),
    }
    .map_err(domain_error)?;

    debug!(
        event_type = event.event_type(),
        plate = event.license_plate(),
        outcome,
        "Webhook processed"
    );
    Ok(Json(ApiResponse::success(WebhookAck::from(&event))))
}
