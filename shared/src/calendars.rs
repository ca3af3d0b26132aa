//! Calendar service: create a shareable calendar, fetch it with its events.

use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{Calendar, CalendarCreated, CalendarWithEvents};
use crate::store::CalendarStore;
use crate::{Config, Error, Result};

const TOKEN_ATTEMPTS: u32 = 3;

/// Generate a fresh token, persist the calendar, and build its share link.
pub async fn create_calendar(store: &dyn CalendarStore, config: &Config) -> Result<CalendarCreated> {
    let mut attempt = 1;
    let calendar = loop {
        let token = Uuid::new_v4().to_string();
        match store.insert_calendar(&token).await {
            Ok(calendar) => break calendar,
            Err(Error::Conflict(msg)) if attempt < TOKEN_ATTEMPTS => {
                warn!(attempt, "Calendar token collision: {}", msg);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    };

    info!(calendar = %calendar.uuid, "Created calendar");

    Ok(CalendarCreated {
        share_url: config.share_url(&calendar.uuid),
        uuid: calendar.uuid,
    })
}

/// Resolve a token or fail with NotFound.
pub async fn resolve(store: &dyn CalendarStore, token: &str) -> Result<Calendar> {
    store
        .calendar_by_token(token)
        .await?
        .ok_or_else(Error::calendar_not_found)
}

pub async fn get_calendar(store: &dyn CalendarStore, token: &str) -> Result<CalendarWithEvents> {
    let calendar = resolve(store, token).await?;
    let events = store.list_events(calendar.id).await?;

    Ok(CalendarWithEvents {
        uuid: calendar.uuid,
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let store = MemoryStore::new();
        let config = Config::default();

        let mut seen = HashSet::new();
        for _ in 0..50 {
            let created = create_calendar(&store, &config).await.unwrap();
            assert!(seen.insert(created.uuid));
        }
    }

    #[tokio::test]
    async fn test_share_url_uses_public_origin() {
        let store = MemoryStore::new();
        let config = Config {
            public_origin: "https://cal.example.com".to_string(),
            ..Config::default()
        };

        let created = create_calendar(&store, &config).await.unwrap();
        assert_eq!(
            created.share_url,
            format!("https://cal.example.com/c/{}", created.uuid)
        );
    }

    #[tokio::test]
    async fn test_new_calendar_has_no_events() {
        let store = MemoryStore::new();
        let created = create_calendar(&store, &Config::default()).await.unwrap();

        let calendar = get_calendar(&store, &created.uuid).await.unwrap();
        assert_eq!(calendar.uuid, created.uuid);
        assert!(calendar.events.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_token_is_not_found() {
        let store = MemoryStore::new();
        let err = get_calendar(&store, "missing").await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
