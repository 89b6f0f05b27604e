use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Session;

/// Result of a successful password sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthGrant {
    pub token: String,
    pub expires_in: u64,
    pub user: Session,
}

#[derive(Debug, Error)]
pub enum AuthProviderError {
    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Invalid or expired access token: {0}")]
    InvalidToken(String),

    #[error("Auth service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Auth service unavailable: {0}")]
    Unavailable(String),

    #[error("Auth provider misconfigured: {0}")]
    Misconfigured(String),
}

/// The session store as seen by the server. Issues sessions, resolves access
/// tokens and revokes them.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthGrant, AuthProviderError>;

    /// Resolve an access token to the session it belongs to
    async fn authenticate(&self, access_token: &str) -> Result<Session, AuthProviderError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthProviderError>;
}
