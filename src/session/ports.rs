use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::types::{DisplayName, Session};

/// Failure talking to a backing service from the client side
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("{message} (HTTP {status})")]
    Rejected { status: u16, message: String },

    #[error("service unreachable: {0}")]
    Unavailable(String),
}

impl ServiceError {
    /// Transient failures worth offering a retry for
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Unavailable(_) => true,
            ServiceError::Rejected { status, .. } => *status >= 500,
        }
    }
}

/// Where the controller learns who is signed in
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn current_user(&self) -> Result<Option<Session>, ServiceError>;
    async fn sign_out(&self) -> Result<(), ServiceError>;
}

/// Where the display name lives, keyed by user id
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn display_name(&self, user: Uuid) -> Result<Option<String>, ServiceError>;
    async fn set_display_name(&self, user: Uuid, name: &DisplayName) -> Result<(), ServiceError>;
}
