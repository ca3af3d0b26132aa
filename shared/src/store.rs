//! Persistence for calendars and their events.
//!
//! Every method is one unit of work: the PostgreSQL store runs it inside a
//! single transaction, so a request either commits all its writes or none.
//! Event lookups are always scoped by `(id, calendar_id)` together.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::{Calendar, Event, EventPatch, NewEvent};
use crate::{Error, Result};

/// Storage backend for calendars and events.
#[async_trait]
pub trait CalendarStore: Send + Sync + 'static {
    /// Insert a calendar with the given token. A duplicate token is a `Conflict`.
    async fn insert_calendar(&self, token: &str) -> Result<Calendar>;

    async fn calendar_by_token(&self, token: &str) -> Result<Option<Calendar>>;

    /// Events of a calendar ordered by start, then id.
    async fn list_events(&self, calendar_id: i32) -> Result<Vec<Event>>;

    async fn insert_event(&self, calendar_id: i32, event: &NewEvent) -> Result<Event>;

    /// Apply `patch` to the event and persist it. `Ok(None)` when the event
    /// does not exist in this calendar.
    async fn update_event(
        &self,
        calendar_id: i32,
        event_id: i32,
        patch: &EventPatch,
    ) -> Result<Option<Event>>;

    /// Returns false when the event does not exist in this calendar.
    async fn delete_event(&self, calendar_id: i32, event_id: i32) -> Result<bool>;

    /// Remove a calendar and, by cascade, all of its events. Not exposed over HTTP.
    async fn delete_calendar(&self, calendar_id: i32) -> Result<bool>;
}

const EVENT_COLUMNS: &str =
    r#"id, calendar_id, title, description, start, "end", created_at"#;

/// PostgreSQL-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CalendarStore for PgStore {
    async fn insert_calendar(&self, token: &str) -> Result<Calendar> {
        let mut tx = self.pool.begin().await?;

        let calendar = sqlx::query_as::<_, Calendar>(
            r#"
            INSERT INTO calendars (uuid)
            VALUES ($1)
            RETURNING id, uuid, created_at
            "#,
        )
        .bind(token)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(calendar)
    }

    async fn calendar_by_token(&self, token: &str) -> Result<Option<Calendar>> {
        let mut tx = self.pool.begin().await?;

        let calendar = sqlx::query_as::<_, Calendar>(
            "SELECT id, uuid, created_at FROM calendars WHERE uuid = $1",
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(calendar)
    }

    async fn list_events(&self, calendar_id: i32) -> Result<Vec<Event>> {
        let mut tx = self.pool.begin().await?;

        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE calendar_id = $1 ORDER BY start, id",
            EVENT_COLUMNS
        ))
        .bind(calendar_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(events)
    }

    async fn insert_event(&self, calendar_id: i32, event: &NewEvent) -> Result<Event> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (calendar_id, title, description, start, "end")
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(calendar_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.start)
        .bind(event.end)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                Error::calendar_not_found()
            }
            other => other.into(),
        })?;

        tx.commit().await?;
        Ok(created)
    }

    async fn update_event(
        &self,
        calendar_id: i32,
        event_id: i32,
        patch: &EventPatch,
    ) -> Result<Option<Event>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE id = $1 AND calendar_id = $2 FOR UPDATE",
            EVENT_COLUMNS
        ))
        .bind(event_id)
        .bind(calendar_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut event) = current else {
            return Ok(None);
        };

        // Dropping `tx` on this early return rolls back and releases the row lock.
        patch.apply(&mut event)?;

        let updated = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events
            SET title = $3, description = $4, start = $5, "end" = $6
            WHERE id = $1 AND calendar_id = $2
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(event_id)
        .bind(calendar_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.start)
        .bind(event.end)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn delete_event(&self, calendar_id: i32, event_id: i32) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM events WHERE id = $1 AND calendar_id = $2")
            .bind(event_id)
            .bind(calendar_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_calendar(&self, calendar_id: i32) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM calendars WHERE id = $1")
            .bind(calendar_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
