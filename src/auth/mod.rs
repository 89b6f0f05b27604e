pub mod hosted;
pub mod memory;
pub mod provider;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::Session;

pub use hosted::HostedAuthProvider;
pub use memory::MemoryAuthProvider;
pub use provider::{AuthGrant, AuthProvider, AuthProviderError};

/// Audience the hosted auth service stamps on user access tokens
pub const TOKEN_AUDIENCE: &str = "authenticated";

/// Longest token lifetime we issue; keeps `exp` arithmetic in range
pub const MAX_TOKEN_EXPIRY_SECS: u64 = 60 * 60 * 24 * 365 * 10;

/// Access-token claims, compatible with GoTrue-issued JWTs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub aud: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Distinguishes sessions of the same user; GoTrue sets it on every grant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(session: &Session, expiry_secs: u64) -> Self {
        let now = Utc::now();
        let lifetime = Duration::seconds(expiry_secs.min(MAX_TOKEN_EXPIRY_SECS) as i64);
        let exp = (now + lifetime).timestamp();

        Self {
            sub: session.id,
            email: session.email.clone(),
            aud: TOKEN_AUDIENCE.to_string(),
            role: Some(TOKEN_AUDIENCE.to_string()),
            session_id: Some(Uuid::new_v4()),
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn session(&self) -> Session {
        Session {
            id: self.sub,
            email: self.email.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    Invalid(String),

    #[error("JWT secret not configured")]
    InvalidSecret,
}

pub fn generate_jwt(secret: &str, claims: &Claims) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(secret: &str, token: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[TOKEN_AUDIENCE]);

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| JwtError::Invalid(e.to_string()))
}
