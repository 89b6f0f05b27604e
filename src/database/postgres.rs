use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::store::{Store, StoreError};
use crate::types::{DisplayName, Event, EventPatch, Guest, NewEvent, NewGuest};

/// Postgres-backed store (the hosted project database)
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Scoped guest lookup; `None` when missing or owned by another organizer
    async fn owned_guest(&self, owner: Uuid, guest_id: Uuid) -> Result<Option<Guest>, StoreError> {
        let guest = sqlx::query_as::<_, Guest>(
            "SELECT g.* FROM guests g JOIN events e ON e.id = g.event_id WHERE g.id = $1 AND e.owner_id = $2",
        )
        .bind(guest_id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(guest)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn list_events(&self, owner: Uuid) -> Result<Vec<Event>, StoreError> {
        let events = sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE owner_id = $1 ORDER BY created_at, id",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn create_event(&self, owner: Uuid, event: NewEvent) -> Result<Event, StoreError> {
        let created = sqlx::query_as::<_, Event>(
            "INSERT INTO events (id, owner_id, name, location, starts_at) VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&event.name)
        .bind(&event.location)
        .bind(event.starts_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn get_event(&self, owner: Uuid, id: Uuid) -> Result<Event, StoreError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::event_not_found(id))
    }

    async fn update_event(&self, owner: Uuid, id: Uuid, patch: EventPatch) -> Result<Event, StoreError> {
        sqlx::query_as::<_, Event>(
            r#"UPDATE events SET
                name = COALESCE($3, name),
                location = CASE WHEN $4::text IS NULL THEN location WHEN $4 = '' THEN NULL ELSE $4 END,
                starts_at = COALESCE($5, starts_at),
                updated_at = now()
            WHERE id = $1 AND owner_id = $2
            RETURNING *"#,
        )
        .bind(id)
        .bind(owner)
        .bind(&patch.name)
        .bind(&patch.location)
        .bind(patch.starts_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::event_not_found(id))
    }

    async fn delete_event(&self, owner: Uuid, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::event_not_found(id));
        }
        Ok(())
    }

    async fn list_guests(&self, owner: Uuid, event_id: Uuid) -> Result<Vec<Guest>, StoreError> {
        self.get_event(owner, event_id).await?;
        let guests = sqlx::query_as::<_, Guest>(
            "SELECT * FROM guests WHERE event_id = $1 ORDER BY created_at, id",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(guests)
    }

    async fn add_guest(&self, owner: Uuid, event_id: Uuid, guest: NewGuest) -> Result<Guest, StoreError> {
        self.get_event(owner, event_id).await?;
        let created = sqlx::query_as::<_, Guest>(
            "INSERT INTO guests (id, event_id, name, email) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(event_id)
        .bind(&guest.name)
        .bind(&guest.email)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn remove_guest(&self, owner: Uuid, guest_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query(
            "DELETE FROM guests g USING events e WHERE g.id = $1 AND e.id = g.event_id AND e.owner_id = $2",
        )
        .bind(guest_id)
        .bind(owner)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::guest_not_found(guest_id));
        }
        Ok(())
    }

    async fn check_in_guest(&self, owner: Uuid, guest_id: Uuid) -> Result<Guest, StoreError> {
        // Conditional update so two scanners cannot both admit the same guest
        let updated = sqlx::query_as::<_, Guest>(
            r#"UPDATE guests g SET checked_in_at = now()
            FROM events e
            WHERE g.id = $1 AND e.id = g.event_id AND e.owner_id = $2 AND g.checked_in_at IS NULL
            RETURNING g.*"#,
        )
        .bind(guest_id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(guest) => Ok(guest),
            None => match self.owned_guest(owner, guest_id).await? {
                Some(_) => Err(StoreError::Conflict(format!("guest {} is already checked in", guest_id))),
                None => Err(StoreError::guest_not_found(guest_id)),
            },
        }
    }

    async fn find_guest(&self, guest_id: Uuid) -> Result<Guest, StoreError> {
        sqlx::query_as::<_, Guest>("SELECT * FROM guests WHERE id = $1")
            .bind(guest_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::guest_not_found(guest_id))
    }

    async fn display_name(&self, user: Uuid) -> Result<Option<String>, StoreError> {
        let name = sqlx::query_scalar::<_, String>("SELECT display_name FROM profiles WHERE user_id = $1")
            .bind(user)
            .fetch_optional(&self.pool)
            .await?;
        Ok(name)
    }

    async fn set_display_name(&self, user: Uuid, name: &DisplayName) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO profiles (user_id, display_name) VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET display_name = EXCLUDED.display_name, updated_at = now()"#,
        )
        .bind(user)
        .bind(name.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
