//! In-memory implementation of [`CalendarStore`].

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::models::{Calendar, Event, EventPatch, NewEvent};
use crate::store::CalendarStore;
use crate::{Error, Result};

#[derive(Debug, Default)]
struct Tables {
    calendars: BTreeMap<i32, Calendar>,
    events: BTreeMap<i32, Event>,
    next_calendar_id: i32,
    next_event_id: i32,
}

/// Store that keeps everything in process memory. Each method holds the lock
/// for its whole body, which gives the same all-or-nothing behaviour as a
/// database transaction.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

#[async_trait]
impl CalendarStore for MemoryStore {
    async fn insert_calendar(&self, token: &str) -> Result<Calendar> {
        let mut tables = self.tables.write().await;

        if tables.calendars.values().any(|c| c.uuid == token) {
            return Err(Error::Conflict(format!("calendar token {} already exists", token)));
        }

        tables.next_calendar_id += 1;
        let calendar = Calendar {
            id: tables.next_calendar_id,
            uuid: token.to_string(),
            created_at: now(),
        };
        tables.calendars.insert(calendar.id, calendar.clone());
        Ok(calendar)
    }

    async fn calendar_by_token(&self, token: &str) -> Result<Option<Calendar>> {
        let tables = self.tables.read().await;
        Ok(tables.calendars.values().find(|c| c.uuid == token).cloned())
    }

    async fn list_events(&self, calendar_id: i32) -> Result<Vec<Event>> {
        let tables = self.tables.read().await;
        let mut events: Vec<Event> = tables
            .events
            .values()
            .filter(|e| e.calendar_id == calendar_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| a.start.cmp(&b.start).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn insert_event(&self, calendar_id: i32, event: &NewEvent) -> Result<Event> {
        let mut tables = self.tables.write().await;

        if !tables.calendars.contains_key(&calendar_id) {
            return Err(Error::calendar_not_found());
        }

        tables.next_event_id += 1;
        let created = Event {
            id: tables.next_event_id,
            calendar_id,
            title: event.title.clone(),
            description: event.description.clone(),
            start: event.start,
            end: event.end,
            created_at: now(),
        };
        tables.events.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_event(
        &self,
        calendar_id: i32,
        event_id: i32,
        patch: &EventPatch,
    ) -> Result<Option<Event>> {
        let mut tables = self.tables.write().await;

        match tables
            .events
            .get_mut(&event_id)
            .filter(|e| e.calendar_id == calendar_id)
        {
            Some(event) => {
                patch.apply(event)?;
                Ok(Some(event.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_event(&self, calendar_id: i32, event_id: i32) -> Result<bool> {
        let mut tables = self.tables.write().await;

        let owned = tables
            .events
            .get(&event_id)
            .is_some_and(|e| e.calendar_id == calendar_id);
        if owned {
            tables.events.remove(&event_id);
        }
        Ok(owned)
    }

    async fn delete_calendar(&self, calendar_id: i32) -> Result<bool> {
        let mut tables = self.tables.write().await;

        if tables.calendars.remove(&calendar_id).is_none() {
            return Ok(false);
        }
        tables.events.retain(|_, e| e.calendar_id != calendar_id);
        Ok(true)
    }
}
