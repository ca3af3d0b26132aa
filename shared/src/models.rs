//! Calendar and event models, request payloads, and the end/start rule.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{datetime, Error, Result};

/// A row from the `calendars` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Calendar {
    pub id: i32,
    /// Opaque share token; never the row id.
    pub uuid: String,
    pub created_at: NaiveDateTime,
}

/// A row from the `events` table, also the API representation of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Event {
    pub id: i32,
    #[serde(skip_serializing)]
    pub calendar_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

/// Validated fields of an event about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Fields to change on an existing event. `None` leaves a field untouched;
/// `description: Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl EventPatch {
    /// Merge into `event`, then check the merged interval.
    ///
    /// On error `event` is left unmodified.
    pub fn apply(&self, event: &mut Event) -> Result<()> {
        let start = self.start.unwrap_or(event.start);
        let end = self.end.unwrap_or(event.end);
        ensure_chronological(start, end)?;

        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(description) = &self.description {
            event.description = description.clone();
        }
        event.start = start;
        event.end = end;
        Ok(())
    }
}

/// Events must not end before they start.
pub fn ensure_chronological(start: NaiveDateTime, end: NaiveDateTime) -> Result<()> {
    if end < start {
        return Err(Error::InvalidArgument("end must be >= start".to_string()));
    }
    Ok(())
}

/// POST /api/calendars/{uuid}/events payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(deserialize_with = "datetime::deserialize")]
    pub start: NaiveDateTime,
    #[serde(deserialize_with = "datetime::deserialize")]
    pub end: NaiveDateTime,
}

impl From<CreateEventRequest> for NewEvent {
    fn from(req: CreateEventRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            start: req.start,
            end: req.end,
        }
    }
}

/// PUT /api/calendars/{uuid}/events/{id} payload; every field optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 255))]
    #[serde(default)]
    pub title: Option<String>,
    /// Absent, `null` (clear), or a new value.
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "datetime::deserialize_option")]
    pub start: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "datetime::deserialize_option")]
    pub end: Option<NaiveDateTime>,
}

impl From<UpdateEventRequest> for EventPatch {
    fn from(req: UpdateEventRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            start: req.start,
            end: req.end,
        }
    }
}

/// Marks a field as present, even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// POST /api/calendars response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarCreated {
    pub uuid: String,
    pub share_url: String,
}

/// GET /api/calendars/{uuid} response.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarWithEvents {
    pub uuid: String,
    pub events: Vec<Event>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn sample_event() -> Event {
        Event {
            id: 1,
            calendar_id: 7,
            title: "Meeting".to_string(),
            description: Some("Weekly sync".to_string()),
            start: at(1, 10),
            end: at(1, 11),
            created_at: at(1, 9),
        }
    }

    #[test]
    fn test_patch_title_only_keeps_other_fields() {
        let mut event = sample_event();
        let patch = EventPatch {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        patch.apply(&mut event).unwrap();

        assert_eq!(event.title, "Renamed");
        assert_eq!(event.description.as_deref(), Some("Weekly sync"));
        assert_eq!(event.start, at(1, 10));
        assert_eq!(event.end, at(1, 11));
    }

    #[test]
    fn test_patch_checks_merged_interval() {
        let mut event = sample_event();
        let patch = EventPatch {
            start: Some(at(2, 10)),
            ..Default::default()
        };
        let err = patch.apply(&mut event).unwrap_err();

        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(event, sample_event());
    }

    #[test]
    fn test_zero_length_event_allowed() {
        assert!(ensure_chronological(at(1, 10), at(1, 10)).is_ok());
        assert!(ensure_chronological(at(2, 10), at(1, 10)).is_err());
    }

    #[test]
    fn test_update_request_description_tristate() {
        let absent: UpdateEventRequest = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(absent.description, None);

        let cleared: UpdateEventRequest = serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));

        let set: UpdateEventRequest = serde_json::from_str(r#"{"description":"notes"}"#).unwrap();
        assert_eq!(set.description, Some(Some("notes".to_string())));
    }

    #[test]
    fn test_update_request_null_title_is_absent() {
        let req: UpdateEventRequest =
            serde_json::from_str(r#"{"title":null,"start":null}"#).unwrap();
        assert_eq!(EventPatch::from(req), EventPatch::default());
    }

    #[test]
    fn test_title_length_validation() {
        let too_long = CreateEventRequest {
            title: "x".repeat(256),
            description: None,
            start: at(1, 10),
            end: at(1, 11),
        };
        assert!(too_long.validate().is_err());

        let empty = UpdateEventRequest {
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(empty.validate().is_err());

        let multibyte = CreateEventRequest {
            title: "é".repeat(255),
            ..too_long
        };
        assert!(multibyte.validate().is_ok());
    }

    #[test]
    fn test_event_serialises_without_calendar_id() {
        let json = serde_json::to_value(sample_event()).unwrap();
        assert_eq!(json["start"], "2024-01-01T10:00:00");
        assert_eq!(json["created_at"], "2024-01-01T09:00:00");
        assert!(json.get("calendar_id").is_none());
    }
}
