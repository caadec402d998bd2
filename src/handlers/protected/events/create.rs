// handlers/protected/events/create.rs - POST /api/events handler

use axum::extract::{Extension, State};
use chrono::Utc;

use super::EventPayload;
use crate::api::ApiJson;
use crate::app::AppState;
use crate::database::models::Event;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// POST /api/events - create an event owned by the caller
///
/// Every field is required. `availableSeats` starts equal to `totalSeats`
/// and `organizerId` is always the caller.
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(payload): ApiJson<EventPayload>,
) -> ApiResult<Event> {
    let new_event = payload.into_new_event()?;
    let event = Event::new(auth.id, new_event, Utc::now());

    let event = state.store.insert_event(event).await?;
    tracing::info!(event_id = %event.id, organizer_id = %auth.id, "Event created");

    Ok(ApiResponse::created(event).with_message("Event created successfully"))
}
