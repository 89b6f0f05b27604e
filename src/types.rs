/// Shared types used across the server, the client and the CLI

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const DISPLAY_NAME_MAX_CHARS: usize = 80;
pub const EVENT_NAME_MAX_CHARS: usize = 200;
pub const GUEST_NAME_MAX_CHARS: usize = 200;

/// Prefix of the payload encoded into guest QR codes
pub const CHECK_IN_CODE_PREFIX: &str = "checkin:";

/// Input rejected before it reaches a backing service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} is malformed: {reason}")]
    Malformed { field: &'static str, reason: String },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Empty { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::Malformed { field, .. } => field,
        }
    }
}

fn required_text(field: &'static str, raw: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_string())
}

/// An authenticated principal as seen by this application.
/// The access token stays with whoever holds the session (header, credentials file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub email: Option<String>,
}

/// A trimmed, non-empty display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        required_text("display_name", raw, DISPLAY_NAME_MAX_CHARS).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DisplayName> for String {
    fn from(name: DisplayName) -> Self {
        name.0
    }
}

impl std::fmt::Display for DisplayName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/events`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewEvent {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
}

impl NewEvent {
    /// Trim and check fields; returns the normalized event
    pub fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: required_text("name", &self.name, EVENT_NAME_MAX_CHARS)?,
            location: normalize_optional(self.location),
            starts_at: self.starts_at,
        })
    }
}

/// Body of `PATCH /api/events/:id`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
}

impl EventPatch {
    pub fn validate(self) -> Result<Self, ValidationError> {
        let name = match self.name {
            Some(name) => Some(required_text("name", &name, EVENT_NAME_MAX_CHARS)?),
            None => None,
        };
        Ok(Self {
            name,
            location: self.location.map(|l| l.trim().to_string()),
            starts_at: self.starts_at,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.location.is_none() && self.starts_at.is_none()
    }

    /// Apply onto an existing event. An empty location clears it.
    pub fn apply(&self, event: &mut Event) {
        if let Some(name) = &self.name {
            event.name = name.clone();
        }
        if let Some(location) = &self.location {
            event.location = if location.is_empty() { None } else { Some(location.clone()) };
        }
        if let Some(starts_at) = self.starts_at {
            event.starts_at = Some(starts_at);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Guest {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Guest {
    pub fn is_checked_in(&self) -> bool {
        self.checked_in_at.is_some()
    }
}

/// Body of `POST /api/events/:id/guests`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewGuest {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl NewGuest {
    pub fn validate(self) -> Result<Self, ValidationError> {
        let email = normalize_optional(self.email);
        if let Some(email) = &email {
            if !email.contains('@') {
                return Err(ValidationError::Malformed {
                    field: "email",
                    reason: "expected an address like name@example.com".to_string(),
                });
            }
        }
        Ok(Self {
            name: required_text("name", &self.name, GUEST_NAME_MAX_CHARS)?,
            email,
        })
    }
}

/// The payload carried by a guest's QR code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckInCode(pub Uuid);

impl CheckInCode {
    pub fn for_guest(guest_id: Uuid) -> Self {
        Self(guest_id)
    }

    pub fn guest_id(&self) -> Uuid {
        self.0
    }

    /// Accepts `checkin:<uuid>` as encoded, or a bare uuid typed in by hand
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ValidationError::Empty { field: "code" });
        }
        let id = raw.strip_prefix(CHECK_IN_CODE_PREFIX).unwrap_or(raw);
        Uuid::parse_str(id).map(Self).map_err(|e| ValidationError::Malformed {
            field: "code",
            reason: e.to_string(),
        })
    }
}

impl std::fmt::Display for CheckInCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", CHECK_IN_CODE_PREFIX, self.0)
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_is_trimmed_and_non_empty() {
        assert_eq!(DisplayName::parse("  Alice ").unwrap().as_str(), "Alice");
        assert_eq!(
            DisplayName::parse("   "),
            Err(ValidationError::Empty { field: "display_name" })
        );
        let long = "x".repeat(DISPLAY_NAME_MAX_CHARS + 1);
        assert!(matches!(DisplayName::parse(&long), Err(ValidationError::TooLong { .. })));
    }

    #[test]
    fn display_name_deserialization_validates() {
        let ok: DisplayName = serde_json::from_str("\"Bob\"").unwrap();
        assert_eq!(ok.as_str(), "Bob");
        assert!(serde_json::from_str::<DisplayName>("\"\"").is_err());
    }

    #[test]
    fn event_patch_clears_location_with_empty_string() {
        let now = Utc::now();
        let mut event = Event {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "Launch".to_string(),
            location: Some("Hall A".to_string()),
            starts_at: None,
            created_at: now,
            updated_at: now,
        };
        let patch = EventPatch {
            name: Some(" Launch party ".to_string()),
            location: Some("  ".to_string()),
            starts_at: None,
        }
        .validate()
        .unwrap();
        patch.apply(&mut event);
        assert_eq!(event.name, "Launch party");
        assert_eq!(event.location, None);
    }

    #[test]
    fn event_patch_rejects_blank_name() {
        let patch = EventPatch { name: Some(" ".to_string()), ..Default::default() };
        assert_eq!(patch.validate().unwrap_err().field(), "name");
    }

    #[test]
    fn new_guest_rejects_malformed_email() {
        let guest = NewGuest { name: "Carol".to_string(), email: Some("carol".to_string()) };
        assert!(matches!(guest.validate(), Err(ValidationError::Malformed { field: "email", .. })));
    }

    #[test]
    fn check_in_code_accepts_prefixed_and_bare_ids() {
        let id = Uuid::new_v4();
        let encoded = CheckInCode::for_guest(id).to_string();
        assert_eq!(encoded, format!("checkin:{}", id));
        assert_eq!(CheckInCode::parse(&encoded).unwrap().guest_id(), id);
        assert_eq!(CheckInCode::parse(&id.to_string()).unwrap().guest_id(), id);
        assert!(CheckInCode::parse("checkin:nope").is_err());
        assert!(CheckInCode::parse("").is_err());
    }
}
