use axum::{extract::State, Extension};
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// POST /api/auth/signout - revoke the caller's session at the auth service.
/// A 502 means revocation could not be confirmed; clients clear local state regardless.
pub async fn sign_out(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    if let Err(e) = state.auth.sign_out(&user.token).await {
        tracing::warn!(user_id = %user.session.id, "Remote sign-out failed: {}", e);
        return Err(e.into());
    }
    tracing::info!(user_id = %user.session.id, "Organizer signed out");
    Ok(ApiResponse::success(json!({ "signed_out": true })))
}
