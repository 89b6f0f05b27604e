use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";
const CREDENTIALS_FILE: &str = "session.json";

/// What `checkin auth login` leaves behind for later commands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub server_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            server_url: std::env::var("CHECKIN_SERVER").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string()),
            token: None,
            email: None,
            expires_at: None,
        }
    }
}

impl Credentials {
    pub fn signed_in(server_url: String, token: String, email: Option<String>, expires_in: u64) -> Self {
        let expires_at = (expires_in > 0).then(|| Utc::now() + chrono::Duration::seconds(expires_in as i64));
        Self {
            server_url,
            token: Some(token),
            email,
            expires_at,
        }
    }

    /// Forget the token but remember which server we talk to
    pub fn signed_out(&self) -> Self {
        Self {
            server_url: self.server_url.clone(),
            ..Self::default()
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|at| at <= Utc::now()).unwrap_or(false)
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("CHECKIN_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("checkin").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn load_credentials() -> anyhow::Result<Credentials> {
    load_credentials_from(&get_config_dir()?)
}

pub fn save_credentials(credentials: &Credentials) -> anyhow::Result<()> {
    save_credentials_to(&get_config_dir()?, credentials)
}

pub fn load_credentials_from(dir: &Path) -> anyhow::Result<Credentials> {
    let file = dir.join(CREDENTIALS_FILE);
    if !file.exists() {
        return Ok(Credentials::default());
    }

    let content = fs::read_to_string(&file)?;
    let credentials: Credentials = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("{} is corrupt: {}", file.display(), e))?;
    Ok(credentials)
}

pub fn save_credentials_to(dir: &Path, credentials: &Credentials) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(credentials)?;
    fs::write(dir.join(CREDENTIALS_FILE), content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_signed_out_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let credentials = load_credentials_from(dir.path()).unwrap();
        assert_eq!(credentials.token, None);
        assert!(!credentials.server_url.is_empty());
    }

    #[test]
    fn saved_credentials_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let credentials = Credentials::signed_in(
            "http://localhost:4000".to_string(),
            "tok".to_string(),
            Some("a@b.com".to_string()),
            3600,
        );
        save_credentials_to(dir.path(), &credentials).unwrap();

        let loaded = load_credentials_from(dir.path()).unwrap();
        assert_eq!(loaded, credentials);
        assert!(!loaded.is_expired());

        let signed_out = loaded.signed_out();
        assert_eq!(signed_out.server_url, "http://localhost:4000");
        assert_eq!(signed_out.token, None);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CREDENTIALS_FILE), "{not json").unwrap();
        let err = load_credentials_from(dir.path()).unwrap_err();
        assert!(err.to_string().contains("corrupt"));
    }
}
