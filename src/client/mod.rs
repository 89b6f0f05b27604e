//! Typed HTTP client for the check-in API, used by the CLI and as the
//! session/profile store behind `AuthController`.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::AuthGrant;
use crate::session::{ProfileStore, ServiceError, SessionStore};
use crate::types::{DisplayName, Event, EventPatch, Guest, NewEvent, NewGuest, Session};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{message} (HTTP {status})")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    #[error("not signed in; run `checkin auth login` first")]
    NotSignedIn,
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ClientError> for ServiceError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Api { status, message, .. } => ServiceError::Rejected { status, message },
            ClientError::NotSignedIn => ServiceError::Rejected {
                status: 401,
                message: "not signed in".to_string(),
            },
            other => ServiceError::Unavailable(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    user: Option<Session>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProfileBody {
    display_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        if self.token.is_none() {
            return Err(ClientError::NotSignedIn);
        }
        Ok(self.request(method, path))
    }

    async fn send(request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.json::<ErrorBody>().await.unwrap_or_default();
        Err(ClientError::Api {
            status: status.as_u16(),
            code: body.code,
            message: body
                .error
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string()),
        })
    }

    async fn data<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
        let response = Self::send(request).await?;
        response
            .json::<Envelope<T>>()
            .await
            .map(|envelope| envelope.data)
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    async fn empty(request: RequestBuilder) -> Result<(), ClientError> {
        Self::send(request).await.map(|_| ())
    }

    pub async fn health(&self) -> Result<Value, ClientError> {
        Self::data(self.request(Method::GET, "/health")).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthGrant, ClientError> {
        let request = self
            .http
            .post(format!("{}/auth/login", self.base_url))
            .json(&json!({ "email": email, "password": password }));
        Self::data(request).await
    }

    /// The signed-in user, `None` without a token or when the server no
    /// longer accepts it
    pub async fn current_user(&self) -> Result<Option<Session>, ClientError> {
        if self.token.is_none() {
            return Ok(None);
        }
        let body: UserBody = Self::data(self.request(Method::GET, "/api/auth/user")).await?;
        Ok(body.user)
    }

    pub async fn sign_out(&self) -> Result<(), ClientError> {
        Self::empty(self.authed(Method::POST, "/api/auth/signout")?).await
    }

    pub async fn display_name(&self) -> Result<Option<String>, ClientError> {
        let body: ProfileBody = Self::data(self.authed(Method::GET, "/api/profile")?).await?;
        Ok(body.display_name)
    }

    pub async fn set_display_name(&self, name: &str) -> Result<Option<String>, ClientError> {
        let request = self.authed(Method::PUT, "/api/profile")?.json(&json!({ "display_name": name }));
        let body: ProfileBody = Self::data(request).await?;
        Ok(body.display_name)
    }

    pub async fn list_events(&self) -> Result<Vec<Event>, ClientError> {
        Self::data(self.authed(Method::GET, "/api/events")?).await
    }

    pub async fn get_event(&self, id: Uuid) -> Result<Event, ClientError> {
        Self::data(self.authed(Method::GET, &format!("/api/events/{}", id))?).await
    }

    pub async fn create_event(&self, event: &NewEvent) -> Result<Event, ClientError> {
        Self::data(self.authed(Method::POST, "/api/events")?.json(event)).await
    }

    pub async fn update_event(&self, id: Uuid, patch: &EventPatch) -> Result<Event, ClientError> {
        Self::data(self.authed(Method::PATCH, &format!("/api/events/{}", id))?.json(patch)).await
    }

    pub async fn delete_event(&self, id: Uuid) -> Result<(), ClientError> {
        Self::empty(self.authed(Method::DELETE, &format!("/api/events/{}", id))?).await
    }

    pub async fn list_guests(&self, event_id: Uuid) -> Result<Vec<Guest>, ClientError> {
        Self::data(self.authed(Method::GET, &format!("/api/events/{}/guests", event_id))?).await
    }

    pub async fn add_guest(&self, event_id: Uuid, guest: &NewGuest) -> Result<Guest, ClientError> {
        Self::data(self.authed(Method::POST, &format!("/api/events/{}/guests", event_id))?.json(guest)).await
    }

    pub async fn remove_guest(&self, guest_id: Uuid) -> Result<(), ClientError> {
        Self::empty(self.authed(Method::DELETE, &format!("/api/guests/{}", guest_id))?).await
    }

    pub async fn check_in(&self, guest_id: Uuid) -> Result<Guest, ClientError> {
        Self::data(self.authed(Method::POST, &format!("/api/guests/{}/check-in", guest_id))?).await
    }

    /// Check a guest in from a scanned QR payload
    pub async fn scan(&self, code: &str) -> Result<Guest, ClientError> {
        Self::data(self.authed(Method::POST, "/api/check-in")?.json(&json!({ "code": code }))).await
    }

    pub async fn qr_png(&self, guest_id: Uuid) -> Result<Vec<u8>, ClientError> {
        let request = self
            .http
            .get(format!("{}/api/qr", self.base_url))
            .query(&[("guest_id", guest_id.to_string())]);
        let response = Self::send(request).await?;

        if response.status() != StatusCode::OK {
            return Err(ClientError::InvalidResponse(format!("status {}", response.status())));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl SessionStore for ApiClient {
    async fn current_user(&self) -> Result<Option<Session>, ServiceError> {
        ApiClient::current_user(self).await.map_err(ServiceError::from)
    }

    async fn sign_out(&self) -> Result<(), ServiceError> {
        ApiClient::sign_out(self).await.map_err(ServiceError::from)
    }
}

/// The server keys profiles by the bearer token's user, so `user` is only
/// used for logging
#[async_trait]
impl ProfileStore for ApiClient {
    async fn display_name(&self, user: Uuid) -> Result<Option<String>, ServiceError> {
        tracing::debug!(user_id = %user, "Fetching display name");
        ApiClient::display_name(self).await.map_err(ServiceError::from)
    }

    async fn set_display_name(&self, user: Uuid, name: &DisplayName) -> Result<(), ServiceError> {
        tracing::debug!(user_id = %user, "Saving display name");
        ApiClient::set_display_name(self, name.as_str())
            .await
            .map(|_| ())
            .map_err(ServiceError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{AuthController, AuthState};
    use std::sync::Arc;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, token: Option<&str>) -> ApiClient {
        ApiClient::new(server.uri(), token.map(str::to_string)).unwrap()
    }

    #[tokio::test]
    async fn no_token_means_no_session_and_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        assert_eq!(client(&server, None).current_user().await.unwrap(), None);
        assert!(matches!(
            client(&server, None).list_events().await,
            Err(ClientError::NotSignedIn)
        ));
    }

    #[tokio::test]
    async fn unwraps_the_success_envelope() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path("/api/auth/user"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "user": { "id": id, "email": "a@b.com" } }
            })))
            .mount(&server)
            .await;

        let user = client(&server, Some("tok")).current_user().await.unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.email.as_deref(), Some("a@b.com"));
    }

    #[tokio::test]
    async fn error_bodies_become_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/api/events/{}", Uuid::nil())))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "success": false,
                "error": "event not found",
                "code": "NOT_FOUND"
            })))
            .mount(&server)
            .await;

        let err = client(&server, Some("tok")).get_event(Uuid::nil()).await.unwrap_err();
        match err {
            ClientError::Api { status, code, message } => {
                assert_eq!(status, 404);
                assert_eq!(code.as_deref(), Some("NOT_FOUND"));
                assert_eq!(message, "event not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_sign_out_maps_to_a_retryable_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/signout"))
            .respond_with(ResponseTemplate::new(502).set_body_json(json!({
                "success": false,
                "error": "auth service unavailable",
                "code": "BAD_GATEWAY"
            })))
            .mount(&server)
            .await;

        let err = SessionStore::sign_out(&client(&server, Some("tok"))).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn drives_the_controller_to_incomplete() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path("/api/auth/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "user": { "id": id, "email": "a@b.com" } }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "display_name": null }
            })))
            .mount(&server)
            .await;

        let api = Arc::new(client(&server, Some("tok")));
        let controller = AuthController::new(api.clone(), api);
        let state = controller.resolve().await;
        assert!(matches!(state, AuthState::Incomplete(session) if session.id == id));
    }
}
