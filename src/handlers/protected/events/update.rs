// handlers/protected/events/update.rs - PUT /api/events/:id handler

use axum::extract::{Extension, Path, State};

use super::EventPayload;
use crate::api::ApiJson;
use crate::app::AppState;
use crate::database::models::Event;
use crate::handlers::public::events::parse_event_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// PUT /api/events/:id - partially update an event
///
/// Only fields present in the body change. Changing `totalSeats` shifts
/// `availableSeats` by the same amount; the update is refused with 400 if
/// that would leave fewer seats than are already taken.
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<EventPayload>,
) -> ApiResult<Event> {
    let patch = payload.into_patch()?;
    let id = parse_event_id(&id)?;

    let event = state.store.update_event(id, auth.id, patch).await?;
    tracing::info!(event_id = %event.id, actor = %auth.id, "Event updated");

    Ok(ApiResponse::success(event).with_message("Event updated successfully"))
}
