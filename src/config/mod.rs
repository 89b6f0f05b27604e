use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub qr: QrConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Which store implementation backs events, guests and profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub backend: Backend,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Base URL of the hosted auth service (GoTrue). None selects the in-memory provider.
    pub url: Option<String>,
    pub anon_key: String,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    /// Accounts accepted by the in-memory provider, as `email:password` pairs
    #[serde(skip_serializing)]
    pub dev_users: Vec<(String, String)>,
    pub token_expiry_secs: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrConfig {
    pub module_pixels: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(port) = env::var("CHECKIN_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("CHECKIN_BACKEND") {
            match v.as_str() {
                "memory" => self.server.backend = Backend::Memory,
                "postgres" | "pg" => self.server.backend = Backend::Postgres,
                other => tracing::warn!("Ignoring unknown CHECKIN_BACKEND value: {}", other),
            }
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.server.max_request_size_bytes = v.parse().unwrap_or(self.server.max_request_size_bytes);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Auth overrides
        // An empty AUTH_URL selects the in-memory provider
        if let Ok(v) = env::var("AUTH_URL") {
            let url = v.trim().trim_end_matches('/');
            self.auth.url = (!url.is_empty()).then(|| url.to_string());
        }
        if let Ok(v) = env::var("AUTH_ANON_KEY") {
            self.auth.anon_key = v;
        }
        if let Ok(v) = env::var("AUTH_JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
        if let Ok(v) = env::var("CHECKIN_DEV_USERS") {
            self.auth.dev_users = parse_dev_users(&v);
        }
        if let Ok(v) = env::var("AUTH_TOKEN_EXPIRY_SECS") {
            self.auth.token_expiry_secs = clamp_token_expiry(v.parse().unwrap_or(self.auth.token_expiry_secs));
        }
        if let Ok(v) = env::var("AUTH_REQUEST_TIMEOUT_SECS") {
            self.auth.request_timeout_secs = v.parse().unwrap_or(self.auth.request_timeout_secs);
        }

        // QR overrides
        if let Ok(v) = env::var("QR_MODULE_PIXELS") {
            self.qr.module_pixels = v.parse().unwrap_or(self.qr.module_pixels);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                backend: Backend::Memory,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout: 30,
            },
            auth: AuthConfig {
                url: None,
                anon_key: String::new(),
                jwt_secret: "development-secret-change-me".to_string(),
                dev_users: vec![("organizer@example.com".to_string(), "password".to_string())],
                token_expiry_secs: 60 * 60 * 24,
                request_timeout_secs: 10,
            },
            qr: QrConfig { module_pixels: 8 },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                backend: Backend::Postgres,
                max_request_size_bytes: 512 * 1024,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 10,
            },
            auth: AuthConfig {
                url: None,
                anon_key: String::new(),
                jwt_secret: String::new(),
                dev_users: Vec::new(),
                token_expiry_secs: 60 * 60,
                request_timeout_secs: 10,
            },
            qr: QrConfig { module_pixels: 8 },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3000,
                backend: Backend::Postgres,
                max_request_size_bytes: 256 * 1024,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 5,
            },
            auth: AuthConfig {
                url: None,
                anon_key: String::new(),
                jwt_secret: String::new(),
                dev_users: Vec::new(),
                token_expiry_secs: 60 * 60,
                request_timeout_secs: 5,
            },
            qr: QrConfig { module_pixels: 10 },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

fn clamp_token_expiry(secs: u64) -> u64 {
    if secs > crate::auth::MAX_TOKEN_EXPIRY_SECS {
        tracing::warn!(
            "AUTH_TOKEN_EXPIRY_SECS={} is too large; using {}",
            secs,
            crate::auth::MAX_TOKEN_EXPIRY_SECS
        );
        return crate::auth::MAX_TOKEN_EXPIRY_SECS;
    }
    secs
}

/// Parse `a@b.com:secret,c@d.com:other` into credential pairs, skipping malformed entries
fn parse_dev_users(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|pair| {
            let (email, password) = pair.trim().split_once(':')?;
            if email.is_empty() || password.is_empty() {
                return None;
            }
            Some((email.to_string(), password.to_string()))
        })
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.server.backend, Backend::Memory);
        assert!(config.auth.url.is_none());
        assert!(!config.auth.jwt_secret.is_empty());
        assert_eq!(config.auth.dev_users.len(), 1);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.server.backend, Backend::Postgres);
        assert!(config.auth.dev_users.is_empty());
        assert!(config.auth.jwt_secret.is_empty());
    }

    #[test]
    fn test_token_expiry_is_clamped() {
        assert_eq!(clamp_token_expiry(3600), 3600);
        assert_eq!(clamp_token_expiry(u64::MAX), crate::auth::MAX_TOKEN_EXPIRY_SECS);
    }

    #[test]
    fn test_parse_dev_users_skips_malformed_pairs() {
        let users = parse_dev_users("a@b.com:one, nocolon ,c@d.com:, e@f.com:two:three");
        assert_eq!(
            users,
            vec![
                ("a@b.com".to_string(), "one".to_string()),
                ("e@f.com".to_string(), "two:three".to_string()),
            ]
        );
    }
}
