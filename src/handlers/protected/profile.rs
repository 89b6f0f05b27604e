use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::types::DisplayName;

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileBody {
    pub display_name: Option<String>,
}

/// GET /api/profile
pub async fn get(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<ProfileBody> {
    let display_name = state.store.display_name(user.session.id).await?;
    Ok(ApiResponse::success(ProfileBody { display_name }))
}

/// PUT /api/profile - record the organizer's display name
pub async fn put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<ProfileBody>, JsonRejection>,
) -> ApiResult<ProfileBody> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let name = DisplayName::parse(payload.display_name.as_deref().unwrap_or_default())?;

    state.store.set_display_name(user.session.id, &name).await?;
    tracing::info!(user_id = %user.session.id, "Display name recorded");

    Ok(ApiResponse::success(ProfileBody {
        display_name: Some(name.into_inner()),
    }))
}
