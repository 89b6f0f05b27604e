use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::state::AppState;
use crate::types::Session;

/// Authenticated organizer injected into protected requests
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub session: Session,
    /// The raw bearer token, kept for sign-out
    pub token: String,
}

/// Bearer authentication: resolves the token through the auth provider and
/// injects `AuthUser`, or answers 401
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers).map_err(ApiError::unauthorized)?;
    let session = state.auth.authenticate(&token).await?;

    request.extensions_mut().insert(AuthUser { session, token });
    Ok(next.run(request).await)
}

/// Like the middleware but never fails: `None` for absent or invalid tokens
pub async fn optional_session(state: &AppState, headers: &HeaderMap) -> Option<Session> {
    let token = extract_bearer_token(headers).ok()?;
    match state.auth.authenticate(&token).await {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::debug!("Ignoring unusable bearer token: {}", e);
            None
        }
    }
}

/// Extract the token from the Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty bearer token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
