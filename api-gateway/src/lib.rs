//! HTTP surface of the link calendar backend.
//!
//! Endpoints:
//! - POST /api/calendars - Create a calendar and its share link
//! - GET /api/calendars/{uuid} - Calendar with its events
//! - GET /api/calendars/{uuid}/events - List events
//! - POST /api/calendars/{uuid}/events - Create an event
//! - PUT /api/calendars/{uuid}/events/{id} - Partially update an event
//! - DELETE /api/calendars/{uuid}/events/{id} - Delete an event
//! - GET /health - Liveness check

pub mod error;
pub mod extract;
pub mod routes;

pub use error::{ApiError, ErrorResponse};
pub use routes::{cors_layer, router, AppState};
