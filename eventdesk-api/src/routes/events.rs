/// Event endpoints
///
/// - `GET /api/events/`: List (Viewer)
/// - `POST /api/events/`: Create (Editor)
/// - `GET /api/event/:id/`: Detail (Viewer)
/// - `PUT /api/event/:id/`: Partial update (Editor)
/// - `DELETE /api/event/:id/`: Delete with its tasks (Admin)
///
/// Every write recomputes `is_past` on the event's tasks in the same
/// transaction.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use eventdesk_shared::{
    auth::{
        authorization::{require, Action},
        middleware::AuthContext,
    },
    models::event::{CreateEvent, Event, EventDetail, UpdateEvent},
};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub organizers: Vec<i64>,
    #[serde(default)]
    pub participants: Vec<i64>,
    #[serde(default)]
    pub projects: Vec<i64>,
    #[serde(default)]
    pub is_past: bool,
    #[serde(default)]
    pub is_cancelled: bool,
}

impl From<CreateEventRequest> for CreateEvent {
    fn from(req: CreateEventRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            date: req.date,
            organizers: req.organizers,
            participants: req.participants,
            projects: req.projects,
            is_past: req.is_past,
            is_cancelled: req.is_cancelled,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub organizers: Option<Vec<i64>>,
    pub participants: Option<Vec<i64>>,
    pub projects: Option<Vec<i64>>,
    pub is_past: Option<bool>,
    pub is_cancelled: Option<bool>,
}

impl From<UpdateEventRequest> for UpdateEvent {
    fn from(req: UpdateEventRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            date: req.date,
            organizers: req.organizers,
            participants: req.participants,
            projects: req.projects,
            is_past: req.is_past,
            is_cancelled: req.is_cancelled,
        }
    }
}

fn event_not_found() -> ApiError {
    ApiError::NotFound("Event not found".to_string())
}

pub async fn list_events(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<EventDetail>>> {
    require(&state.db, auth.user_id, Action::Read).await?;
    Ok(Json(Event::list(&state.db).await?))
}

pub async fn create_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateEventRequest>,
) -> ApiResult<(StatusCode, Json<EventDetail>)> {
    require(&state.db, auth.user_id, Action::CreateEvent).await?;
    req.validate()?;

    let event = Event::create(&state.db, req.into()).await?;
    tracing::info!(event_id = event.event.id, user_id = auth.user_id, "Event created");

    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn get_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<EventDetail>> {
    require(&state.db, auth.user_id, Action::Read).await?;

    let event = Event::detail(&state.db, id).await?.ok_or_else(event_not_found)?;
    Ok(Json(event))
}

pub async fn update_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<UpdateEventRequest>,
) -> ApiResult<Json<EventDetail>> {
    require(&state.db, auth.user_id, Action::UpdateEvent).await?;
    req.validate()?;

    let event = Event::update(&state.db, id, req.into())
        .await?
        .ok_or_else(event_not_found)?;

    tracing::info!(
        event_id = id,
        user_id = auth.user_id,
        is_past = event.event.is_past,
        is_cancelled = event.event.is_cancelled,
        "Event updated"
    );
    Ok(Json(event))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    require(&state.db, auth.user_id, Action::DeleteEvent).await?;

    if !Event::delete(&state.db, id).await? {
        return Err(event_not_found());
    }

    tracing::info!(event_id = id, user_id = auth.user_id, "Event deleted");
    Ok(StatusCode::NO_CONTENT)
}
