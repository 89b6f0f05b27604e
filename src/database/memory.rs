use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::store::{Store, StoreError};
use crate::types::{DisplayName, Event, EventPatch, Guest, NewEvent, NewGuest};

#[derive(Default)]
struct Tables {
    events: HashMap<Uuid, Event>,
    guests: HashMap<Uuid, Guest>,
    profiles: HashMap<Uuid, String>,
}

impl Tables {
    fn owned_event(&self, owner: Uuid, id: Uuid) -> Result<&Event, StoreError> {
        self.events
            .get(&id)
            .filter(|e| e.owner_id == owner)
            .ok_or_else(|| StoreError::event_not_found(id))
    }

    fn owns_guest(&self, owner: Uuid, guest_id: Uuid) -> bool {
        self.guests
            .get(&guest_id)
            .and_then(|g| self.events.get(&g.event_id))
            .is_some_and(|e| e.owner_id == owner)
    }
}

/// Process-local store for development and tests
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_events(&self, owner: Uuid) -> Result<Vec<Event>, StoreError> {
        let tables = self.tables.read().await;
        let mut events: Vec<Event> = tables
            .events
            .values()
            .filter(|e| e.owner_id == owner)
            .cloned()
            .collect();
        events.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn create_event(&self, owner: Uuid, event: NewEvent) -> Result<Event, StoreError> {
        let now = Utc::now();
        let created = Event {
            id: Uuid::new_v4(),
            owner_id: owner,
            name: event.name,
            location: event.location,
            starts_at: event.starts_at,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.events.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_event(&self, owner: Uuid, id: Uuid) -> Result<Event, StoreError> {
        self.tables.read().await.owned_event(owner, id).cloned()
    }

    async fn update_event(&self, owner: Uuid, id: Uuid, patch: EventPatch) -> Result<Event, StoreError> {
        let mut tables = self.tables.write().await;
        let event = tables
            .events
            .get_mut(&id)
            .filter(|e| e.owner_id == owner)
            .ok_or_else(|| StoreError::event_not_found(id))?;
        patch.apply(event);
        event.updated_at = Utc::now();
        Ok(event.clone())
    }

    async fn delete_event(&self, owner: Uuid, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.owned_event(owner, id)?;
        tables.events.remove(&id);
        tables.guests.retain(|_, g| g.event_id != id);
        Ok(())
    }

    async fn list_guests(&self, owner: Uuid, event_id: Uuid) -> Result<Vec<Guest>, StoreError> {
        let tables = self.tables.read().await;
        tables.owned_event(owner, event_id)?;
        let mut guests: Vec<Guest> = tables
            .guests
            .values()
            .filter(|g| g.event_id == event_id)
            .cloned()
            .collect();
        guests.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(guests)
    }

    async fn add_guest(&self, owner: Uuid, event_id: Uuid, guest: NewGuest) -> Result<Guest, StoreError> {
        let mut tables = self.tables.write().await;
        tables.owned_event(owner, event_id)?;
        let created = Guest {
            id: Uuid::new_v4(),
            event_id,
            name: guest.name,
            email: guest.email,
            checked_in_at: None,
            created_at: Utc::now(),
        };
        tables.guests.insert(created.id, created.clone());
        Ok(created)
    }

    async fn remove_guest(&self, owner: Uuid, guest_id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.owns_guest(owner, guest_id) {
            return Err(StoreError::guest_not_found(guest_id));
        }
        tables.guests.remove(&guest_id);
        Ok(())
    }

    async fn check_in_guest(&self, owner: Uuid, guest_id: Uuid) -> Result<Guest, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.owns_guest(owner, guest_id) {
            return Err(StoreError::guest_not_found(guest_id));
        }
        let guest = tables
            .guests
            .get_mut(&guest_id)
            .ok_or_else(|| StoreError::guest_not_found(guest_id))?;
        if guest.is_checked_in() {
            return Err(StoreError::Conflict(format!("guest {} is already checked in", guest_id)));
        }
        guest.checked_in_at = Some(Utc::now());
        Ok(guest.clone())
    }

    async fn find_guest(&self, guest_id: Uuid) -> Result<Guest, StoreError> {
        self.tables
            .read()
            .await
            .guests
            .get(&guest_id)
            .cloned()
            .ok_or_else(|| StoreError::guest_not_found(guest_id))
    }

    async fn display_name(&self, user: Uuid) -> Result<Option<String>, StoreError> {
        Ok(self.tables.read().await.profiles.get(&user).cloned())
    }

    async fn set_display_name(&self, user: Uuid, name: &DisplayName) -> Result<(), StoreError> {
        self.tables
            .write()
            .await
            .profiles
            .insert(user, name.as_str().to_string());
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
