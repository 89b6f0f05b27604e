// handlers/mod.rs - two security tiers
//
// Public (no auth): login, current-user probe, QR images
// Protected (bearer auth): sign-out, profile, events, guests, check-in

pub mod protected;
pub mod public;

use uuid::Uuid;

use crate::error::ApiError;

/// Parse a path id. A malformed id names nothing, so it is reported as absent.
pub(crate) fn parse_path_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(format!("{} {} not found", what, raw)))
}
