use thiserror::Error;

use crate::session::ports::ServiceError;
use crate::types::ValidationError;

#[derive(Debug, Error)]
pub enum ProfileUpdateError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("no signed-in profile is waiting for a display name")]
    NotAwaitingName,

    #[error("a display name update is already in progress")]
    InFlight,

    #[error("could not save display name: {0}")]
    Persistence(#[source] ServiceError),

    #[error("the session changed before the display name was saved")]
    Superseded,
}

impl ProfileUpdateError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProfileUpdateError::Persistence(e) if e.is_retryable())
    }
}

/// Local state is already cleared when this is returned; it only reports
/// that the server may not have revoked the session.
#[derive(Debug, Error)]
#[error("signed out locally, but the server did not confirm: {0}")]
pub struct SignOutError(#[source] pub ServiceError);
