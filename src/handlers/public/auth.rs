use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthGrant;
use crate::error::ApiError;
use crate::middleware::{optional_session, ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// POST /auth/login - exchange email + password for an access token
///
/// ```json
/// { "success": true, "data": { "token": "eyJ...", "expires_in": 3600, "user": { "id": "...", "email": "a@b.com" } } }
/// ```
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<AuthGrant> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let email = payload.email.as_deref().map(str::trim).unwrap_or_default();
    let password = payload.password.as_deref().unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::bad_request("email and password are required"));
    }

    let grant = state.auth.sign_in(email, password).await?;
    tracing::info!(user_id = %grant.user.id, "Organizer signed in");
    Ok(ApiResponse::success(grant))
}

/// GET /api/auth/user - the session behind the bearer token, or `null`
pub async fn current_user(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Value> {
    let session = optional_session(&state, &headers).await;
    Ok(ApiResponse::success(json!({ "user": session })))
}
