use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use uuid::Uuid;

use crate::auth::provider::{AuthGrant, AuthProvider, AuthProviderError};
use crate::auth::validate_jwt;
use crate::types::Session;

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

impl From<RemoteUser> for Session {
    fn from(user: RemoteUser) -> Self {
        Session {
            id: user.id,
            email: user.email.filter(|e| !e.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
    user: RemoteUser,
}

/// Client for a hosted GoTrue-compatible auth service (e.g. Supabase Auth).
///
/// Access tokens are verified locally with the project JWT secret when one is
/// configured; otherwise every lookup goes to `/auth/v1/user`.
pub struct HostedAuthProvider {
    http: Client,
    base_url: String,
    anon_key: String,
    jwt_secret: String,
}

impl HostedAuthProvider {
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        jwt_secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AuthProviderError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthProviderError::Misconfigured(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            jwt_secret: jwt_secret.into(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn with_key(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("apikey", &self.anon_key)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, AuthProviderError> {
        request.send().await.map_err(|e| {
            tracing::warn!("Auth service request failed: {}", e);
            AuthProviderError::Unavailable(e.to_string())
        })
    }

    async fn fetch_user(&self, access_token: &str) -> Result<Session, AuthProviderError> {
        let request = self
            .with_key(self.http.get(self.endpoint("user")))
            .bearer_auth(access_token);
        let response = self.send(request).await?;

        match response.status() {
            StatusCode::OK => response
                .json::<RemoteUser>()
                .await
                .map(Session::from)
                .map_err(|e| AuthProviderError::Unavailable(format!("malformed user response: {}", e))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(AuthProviderError::InvalidToken(error_message(response).await))
            }
            status => Err(AuthProviderError::Rejected {
                status: status.as_u16(),
                message: error_message(response).await,
            }),
        }
    }
}

#[async_trait]
impl AuthProvider for HostedAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthGrant, AuthProviderError> {
        let request = self
            .with_key(self.http.post(self.endpoint("token")))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        let response = self.send(request).await?;

        match response.status() {
            status if status.is_success() => {
                let body = response
                    .json::<TokenResponse>()
                    .await
                    .map_err(|e| AuthProviderError::Unavailable(format!("malformed token response: {}", e)))?;
                Ok(AuthGrant {
                    token: body.access_token,
                    expires_in: body.expires_in,
                    user: body.user.into(),
                })
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                tracing::debug!("Sign-in rejected: {}", error_message(response).await);
                Err(AuthProviderError::InvalidCredentials)
            }
            status => Err(AuthProviderError::Rejected {
                status: status.as_u16(),
                message: error_message(response).await,
            }),
        }
    }

    async fn authenticate(&self, access_token: &str) -> Result<Session, AuthProviderError> {
        if self.jwt_secret.is_empty() {
            return self.fetch_user(access_token).await;
        }
        validate_jwt(&self.jwt_secret, access_token)
            .map(|claims| claims.session())
            .map_err(|e| AuthProviderError::InvalidToken(e.to_string()))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthProviderError> {
        let request = self
            .with_key(self.http.post(self.endpoint("logout")))
            .bearer_auth(access_token);
        let response = self.send(request).await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            status => Err(AuthProviderError::Rejected {
                status: status.as_u16(),
                message: error_message(response).await,
            }),
        }
    }
}

/// GoTrue has used `error_description`, `msg` and `message` over time
async fn error_message(response: Response) -> String {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| status.to_string())
}
