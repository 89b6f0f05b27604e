use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::qr;
use crate::state::AppState;
use crate::types::CheckInCode;

#[derive(Debug, Deserialize)]
pub struct QrQuery {
    #[serde(default, alias = "id")]
    pub guest_id: Option<String>,
}

/// GET /api/qr?guest_id=<uuid> - PNG QR code carrying the guest's check-in code
pub async fn get(State(state): State<AppState>, Query(query): Query<QrQuery>) -> Result<Response, ApiError> {
    let raw = query
        .guest_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("guest_id is required"))?;
    let guest_id = Uuid::parse_str(raw).map_err(|_| ApiError::bad_request("guest_id must be a UUID"))?;

    let guest = state.store.find_guest(guest_id).await?;
    let png = qr::render_png(&CheckInCode::for_guest(guest.id), state.config.qr.module_pixels)?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        png,
    )
        .into_response())
}
