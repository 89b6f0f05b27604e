use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::types::{DisplayName, Event, EventPatch, Guest, NewEvent, NewGuest};

/// Errors from any `Store` implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl StoreError {
    pub fn event_not_found(id: Uuid) -> Self {
        StoreError::NotFound(format!("event {} not found", id))
    }

    pub fn guest_not_found(id: Uuid) -> Self {
        StoreError::NotFound(format!("guest {} not found", id))
    }
}

/// Backing store for events, guest lists and organizer profiles.
///
/// Every organizer-facing method takes the caller's user id and treats rows
/// owned by someone else as absent.
#[async_trait]
pub trait Store: Send + Sync {
    async fn list_events(&self, owner: Uuid) -> Result<Vec<Event>, StoreError>;
    async fn create_event(&self, owner: Uuid, event: NewEvent) -> Result<Event, StoreError>;
    async fn get_event(&self, owner: Uuid, id: Uuid) -> Result<Event, StoreError>;
    async fn update_event(&self, owner: Uuid, id: Uuid, patch: EventPatch) -> Result<Event, StoreError>;
    async fn delete_event(&self, owner: Uuid, id: Uuid) -> Result<(), StoreError>;

    async fn list_guests(&self, owner: Uuid, event_id: Uuid) -> Result<Vec<Guest>, StoreError>;
    async fn add_guest(&self, owner: Uuid, event_id: Uuid, guest: NewGuest) -> Result<Guest, StoreError>;
    async fn remove_guest(&self, owner: Uuid, guest_id: Uuid) -> Result<(), StoreError>;
    /// Marks the guest as arrived. Fails with `Conflict` when already checked in.
    async fn check_in_guest(&self, owner: Uuid, guest_id: Uuid) -> Result<Guest, StoreError>;

    /// Unscoped lookup for the public QR endpoint
    async fn find_guest(&self, guest_id: Uuid) -> Result<Guest, StoreError>;

    async fn display_name(&self, user: Uuid) -> Result<Option<String>, StoreError>;
    async fn set_display_name(&self, user: Uuid, name: &DisplayName) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
