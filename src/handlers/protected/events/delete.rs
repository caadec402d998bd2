// handlers/protected/events/delete.rs - DELETE /api/events/:id handler

use axum::extract::{Extension, Path, State};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::handlers::public::events::parse_event_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// DELETE /api/events/:id - remove an event; organizer only
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_event_id(&id)?;

    state.store.delete_event(id, auth.id).await?;
    tracing::info!(event_id = %id, actor = %auth.id, "Event deleted");

    Ok(ApiResponse::success(json!({ "id": id })).with_message("Event deleted successfully"))
}
