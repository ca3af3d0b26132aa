//! Event service. Every operation resolves the calendar token first and
//! scopes event ids to that calendar.

use tracing::info;

use crate::calendars::resolve;
use crate::models::{ensure_chronological, Event, EventPatch, NewEvent};
use crate::store::CalendarStore;
use crate::{Error, Result};

pub async fn list_events(store: &dyn CalendarStore, token: &str) -> Result<Vec<Event>> {
    let calendar = resolve(store, token).await?;
    store.list_events(calendar.id).await
}

pub async fn create_event(store: &dyn CalendarStore, token: &str, event: NewEvent) -> Result<Event> {
    let calendar = resolve(store, token).await?;
    ensure_chronological(event.start, event.end)?;

    let created = store.insert_event(calendar.id, &event).await?;
    info!(calendar = %calendar.uuid, event_id = created.id, "Created event");
    Ok(created)
}

/// Apply a partial update; the merged event must still satisfy `end >= start`.
pub async fn update_event(
    store: &dyn CalendarStore,
    token: &str,
    event_id: i32,
    patch: EventPatch,
) -> Result<Event> {
    let calendar = resolve(store, token).await?;

    let updated = store
        .update_event(calendar.id, event_id, &patch)
        .await?
        .ok_or_else(Error::event_not_found)?;

    info!(calendar = %calendar.uuid, event_id, "Updated event");
    Ok(updated)
}

pub async fn delete_event(store: &dyn CalendarStore, token: &str, event_id: i32) -> Result<()> {
    let calendar = resolve(store, token).await?;

    if !store.delete_event(calendar.id, event_id).await? {
        return Err(Error::event_not_found());
    }

    info!(calendar = %calendar.uuid, event_id, "Deleted event");
    Ok(())
}
