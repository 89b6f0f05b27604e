use async_trait::async_trait;
use sha2::{Digest, Sha256};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::auth::provider::{AuthGrant, AuthProvider, AuthProviderError};
use crate::auth::{generate_jwt, validate_jwt, Claims};
use crate::types::Session;

/// Local stand-in for the hosted auth service.
///
/// Accounts come from configuration; user ids are derived from the email so
/// they stay stable across restarts. Signed-out tokens are remembered by digest
/// until they would have expired anyway.
pub struct MemoryAuthProvider {
    users: HashMap<String, String>,
    jwt_secret: String,
    token_expiry_secs: u64,
    /// Token digest to the token's `exp`
    revoked: Mutex<HashMap<[u8; 32], i64>>,
}

impl MemoryAuthProvider {
    pub fn new(users: &[(String, String)], jwt_secret: impl Into<String>, token_expiry_secs: u64) -> Self {
        Self {
            users: users
                .iter()
                .map(|(email, password)| (email.to_lowercase(), password.clone()))
                .collect(),
            jwt_secret: jwt_secret.into(),
            token_expiry_secs,
            revoked: Mutex::new(HashMap::new()),
        }
    }

    pub fn user_id_for(email: &str) -> Uuid {
        let digest = Sha256::digest(email.to_lowercase().as_bytes());
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        Uuid::from_bytes(bytes)
    }

    fn digest(token: &str) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&Sha256::digest(token.as_bytes()));
        out
    }

    fn is_revoked(&self, token: &str) -> bool {
        self.revoked
            .lock()
            .map(|revoked| revoked.contains_key(&Self::digest(token)))
            .unwrap_or(true)
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthGrant, AuthProviderError> {
        let email = email.trim().to_lowercase();
        match self.users.get(&email) {
            Some(expected) if expected == password => {}
            _ => return Err(AuthProviderError::InvalidCredentials),
        }

        let session = Session {
            id: Self::user_id_for(&email),
            email: Some(email),
        };
        let token = generate_jwt(&self.jwt_secret, &Claims::new(&session, self.token_expiry_secs))
            .map_err(|e| AuthProviderError::Misconfigured(e.to_string()))?;

        Ok(AuthGrant {
            token,
            expires_in: self.token_expiry_secs,
            user: session,
        })
    }

    async fn authenticate(&self, access_token: &str) -> Result<Session, AuthProviderError> {
        if self.is_revoked(access_token) {
            return Err(AuthProviderError::InvalidToken("token has been revoked".to_string()));
        }
        validate_jwt(&self.jwt_secret, access_token)
            .map(|claims| claims.session())
            .map_err(|e| AuthProviderError::InvalidToken(e.to_string()))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthProviderError> {
        // Revoking an already-invalid token is rejected, matching the hosted service
        if self.is_revoked(access_token) {
            return Err(AuthProviderError::InvalidToken("token has been revoked".to_string()));
        }
        let claims = validate_jwt(&self.jwt_secret, access_token)
            .map_err(|e| AuthProviderError::InvalidToken(e.to_string()))?;

        let mut revoked = self
            .revoked
            .lock()
            .map_err(|_| AuthProviderError::Unavailable("revocation list poisoned".to_string()))?;
        // Expired tokens fail validation on their own
        let now = Utc::now().timestamp();
        revoked.retain(|_, exp| *exp > now);
        revoked.insert(Self::digest(access_token), claims.exp);
        Ok(())
    }
}
