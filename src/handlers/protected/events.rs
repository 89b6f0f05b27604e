use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};

use crate::error::ApiError;
use crate::handlers::parse_path_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::types::{Event, EventPatch, NewEvent};

/// GET /api/events - the caller's events, oldest first
pub async fn list(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Vec<Event>> {
    let events = state.store.list_events(user.session.id).await?;
    Ok(ApiResponse::success(events))
}

/// POST /api/events
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<NewEvent>, JsonRejection>,
) -> ApiResult<Event> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let event = state.store.create_event(user.session.id, payload.validate()?).await?;
    tracing::info!(event_id = %event.id, "Event created");
    Ok(ApiResponse::created(event))
}

/// GET /api/events/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Event> {
    let id = parse_path_id(&id, "event")?;
    let event = state.store.get_event(user.session.id, id).await?;
    Ok(ApiResponse::success(event))
}

/// PATCH /api/events/:id - partial update; absent fields are left alone
pub async fn patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<EventPatch>, JsonRejection>,
) -> ApiResult<Event> {
    let id = parse_path_id(&id, "event")?;
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let patch = payload.validate()?;
    if patch.is_empty() {
        return Err(ApiError::bad_request("no fields to update"));
    }

    let event = state.store.update_event(user.session.id, id, patch).await?;
    Ok(ApiResponse::success(event))
}

/// DELETE /api/events/:id - removes the event and its guest list
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_path_id(&id, "event")?;
    state.store.delete_event(user.session.id, id).await?;
    tracing::info!(event_id = %id, "Event deleted");
    Ok(ApiResponse::no_content())
}
