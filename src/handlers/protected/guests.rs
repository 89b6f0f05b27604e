use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::handlers::parse_path_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::types::{CheckInCode, Guest, NewGuest};

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    #[serde(default)]
    pub code: Option<String>,
}

/// GET /api/events/:id/guests
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<String>,
) -> ApiResult<Vec<Guest>> {
    let event_id = parse_path_id(&event_id, "event")?;
    let guests = state.store.list_guests(user.session.id, event_id).await?;
    Ok(ApiResponse::success(guests))
}

/// POST /api/events/:id/guests
pub async fn add(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<String>,
    payload: Result<Json<NewGuest>, JsonRejection>,
) -> ApiResult<Guest> {
    let event_id = parse_path_id(&event_id, "event")?;
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let guest = state
        .store
        .add_guest(user.session.id, event_id, payload.validate()?)
        .await?;
    Ok(ApiResponse::created(guest))
}

/// DELETE /api/guests/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(guest_id): Path<String>,
) -> ApiResult<()> {
    let guest_id = parse_path_id(&guest_id, "guest")?;
    state.store.remove_guest(user.session.id, guest_id).await?;
    Ok(ApiResponse::no_content())
}

/// POST /api/guests/:id/check-in
pub async fn check_in(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(guest_id): Path<String>,
) -> ApiResult<Guest> {
    let guest_id = parse_path_id(&guest_id, "guest")?;
    admit(&state, &user, CheckInCode::for_guest(guest_id)).await
}

/// POST /api/check-in - validate a scanned QR payload and admit the guest
pub async fn scan(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> ApiResult<Guest> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let code = CheckInCode::parse(payload.code.as_deref().unwrap_or_default())?;
    admit(&state, &user, code).await
}

async fn admit(state: &AppState, user: &AuthUser, code: CheckInCode) -> ApiResult<Guest> {
    let guest = state.store.check_in_guest(user.session.id, code.guest_id()).await?;
    tracing::info!(guest_id = %guest.id, event_id = %guest.event_id, "Guest checked in");
    Ok(ApiResponse::success(guest))
}
