use axum::extract::{Path, Query, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{Event, EventFilter};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::Category;

#[derive(Debug, Deserialize)]
pub struct EventQuery {
    pub category: Option<String>,
    /// `true` selects past events; any other value selects upcoming ones
    pub expired: Option<String>,
}

impl EventQuery {
    fn into_filter(self) -> Result<EventFilter, ApiError> {
        let category = match self.category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<Category>().map_err(|_| {
                ApiError::bad_request(format!("Unknown category '{}'", raw))
            })?),
        };

        Ok(EventFilter {
            category,
            expired: self.expired.map(|v| v == "true"),
        })
    }
}

/// Events are addressed by UUID; anything else cannot exist
pub(crate) fn parse_event_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found("Event not found"))
}

/// GET /api/events - list events sorted by date, optionally filtered
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
) -> ApiResult<Vec<Event>> {
    let filter = query.into_filter()?;
    let events = state.store.list_events(&filter).await?;
    Ok(ApiResponse::success(events))
}

/// GET /api/events/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Event> {
    let id = parse_event_id(&id)?;
    let event = state
        .store
        .find_event(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Event not found"))?;
    Ok(ApiResponse::success(event))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_maps_to_filter() {
        let filter = EventQuery {
            category: Some("Sports".to_string()),
            expired: Some("true".to_string()),
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.category, Some(Category::Sports));
        assert_eq!(filter.expired, Some(true));

        let filter = EventQuery {
            category: None,
            expired: Some("no".to_string()),
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.category, None);
        assert_eq!(filter.expired, Some(false));
    }

    #[test]
    fn unknown_category_is_a_bad_request() {
        let err = EventQuery {
            category: Some("Gaming".to_string()),
            expired: None,
        }
        .into_filter()
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
