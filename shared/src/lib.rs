//! Shared library for the link calendar backend.
//!
//! This crate provides configuration, the data model, persistence, and the
//! calendar/event services used by the HTTP server.

pub mod calendars;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod events;
pub mod memory;
pub mod models;
pub mod store;

pub use config::Config;
pub use db::RetryPolicy;
pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use models::{
    Calendar, CalendarCreated, CalendarWithEvents, CreateEventRequest, Event, EventPatch, NewEvent,
    UpdateEventRequest,
};
pub use store::{CalendarStore, PgStore};
