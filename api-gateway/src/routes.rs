//! Router, shared state, and request handlers.

use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{extract::State, Json, Router};
use serde_json::json;
use shared::{
    calendars, events, CalendarCreated, CalendarStore, CalendarWithEvents, Config,
    CreateEventRequest, Event, UpdateEventRequest,
};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::extract::{ApiPath, ValidJson};

/// Application state shared across requests.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CalendarStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn CalendarStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

/// Build the full application router.
pub fn router(state: AppState) -> shared::Result<Router> {
    let cors = cors_layer(&state.config)?;

    let api = Router::new()
        .route("/calendars", post(create_calendar))
        .route("/calendars/{uuid}", get(get_calendar))
        .route("/calendars/{uuid}/events", get(list_events).post(create_event))
        .route(
            "/calendars/{uuid}/events/{event_id}",
            put(update_event).delete(delete_event),
        );

    Ok(Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .fallback(not_found)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

/// CORS policy from `CORS_ORIGIN`. Credentials are allowed, so `*` is served
/// by echoing the caller's origin.
pub fn cors_layer(config: &Config) -> shared::Result<CorsLayer> {
    let origin = if config.allows_any_origin() {
        AllowOrigin::mirror_request()
    } else {
        let value = HeaderValue::from_str(config.cors_origin.trim()).map_err(|e| {
            shared::Error::Config(format!("CORS_ORIGIN is not a valid origin: {}", e))
        })?;
        AllowOrigin::list([value])
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Not Found")
}

/// POST /api/calendars
async fn create_calendar(State(state): State<AppState>) -> Result<Json<CalendarCreated>, ApiError> {
    let created = calendars::create_calendar(state.store.as_ref(), &state.config).await?;
    Ok(Json(created))
}

/// GET /api/calendars/{uuid}
async fn get_calendar(
    State(state): State<AppState>,
    ApiPath(uuid): ApiPath<String>,
) -> Result<Json<CalendarWithEvents>, ApiError> {
    let calendar = calendars::get_calendar(state.store.as_ref(), &uuid).await?;
    Ok(Json(calendar))
}

/// GET /api/calendars/{uuid}/events
async fn list_events(
    State(state): State<AppState>,
    ApiPath(uuid): ApiPath<String>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let events = events::list_events(state.store.as_ref(), &uuid).await?;
    Ok(Json(events))
}

/// POST /api/calendars/{uuid}/events
async fn create_event(
    State(state): State<AppState>,
    ApiPath(uuid): ApiPath<String>,
    ValidJson(request): ValidJson<CreateEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let event = events::create_event(state.store.as_ref(), &uuid, request.into()).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// PUT /api/calendars/{uuid}/events/{event_id}
async fn update_event(
    State(state): State<AppState>,
    ApiPath((uuid, event_id)): ApiPath<(String, i32)>,
    ValidJson(request): ValidJson<UpdateEventRequest>,
) -> Result<Json<Event>, ApiError> {
    let event = events::update_event(state.store.as_ref(), &uuid, event_id, request.into()).await?;
    Ok(Json(event))
}

/// DELETE /api/calendars/{uuid}/events/{event_id}
async fn delete_event(
    State(state): State<AppState>,
    ApiPath((uuid, event_id)): ApiPath<(String, i32)>,
) -> Result<StatusCode, ApiError> {
    events::delete_event(state.store.as_ref(), &uuid, event_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
