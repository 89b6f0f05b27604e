use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AuthProvider, AuthProviderError, HostedAuthProvider, MemoryAuthProvider};
use crate::config::AppConfig;
use crate::database::{DatabaseManager, Store, StoreError};

/// Shared handles injected into every handler through axum `State`
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub auth: Arc<dyn AuthProvider>,
    pub config: Arc<AppConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthProviderError),
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, auth: Arc<dyn AuthProvider>, config: AppConfig) -> Self {
        Self {
            store,
            auth,
            config: Arc::new(config),
        }
    }

    /// Build the store and auth provider the configuration asks for
    pub async fn from_config(config: AppConfig) -> Result<Self, StartupError> {
        let store = DatabaseManager::open(&config).await?;
        let auth = Self::auth_provider(&config)?;
        Ok(Self::new(store, auth, config))
    }

    fn auth_provider(config: &AppConfig) -> Result<Arc<dyn AuthProvider>, AuthProviderError> {
        let auth = &config.auth;
        match &auth.url {
            Some(url) => {
                tracing::info!("Using hosted auth service at {}", url);
                let provider = HostedAuthProvider::new(
                    url.clone(),
                    auth.anon_key.clone(),
                    auth.jwt_secret.clone(),
                    Duration::from_secs(auth.request_timeout_secs),
                )?;
                Ok(Arc::new(provider))
            }
            None => {
                if auth.jwt_secret.is_empty() {
                    return Err(AuthProviderError::Misconfigured(
                        "AUTH_JWT_SECRET is required without AUTH_URL".to_string(),
                    ));
                }
                tracing::info!("Using in-memory auth with {} account(s)", auth.dev_users.len());
                Ok(Arc::new(MemoryAuthProvider::new(
                    &auth.dev_users,
                    auth.jwt_secret.clone(),
                    auth.token_expiry_secs,
                )))
            }
        }
    }

    /// Development state with the memory store and memory auth
    pub fn in_memory(config: AppConfig) -> Self {
        let auth = Arc::new(MemoryAuthProvider::new(
            &config.auth.dev_users,
            config.auth.jwt_secret.clone(),
            config.auth.token_expiry_secs,
        ));
        Self::new(Arc::new(crate::database::MemoryStore::new()), auth, config)
    }
}
