/// Task endpoints
///
/// - `GET /api/tasks/?event_id=&user_id=`: List, optionally by event or executor (Viewer)
/// - `POST /api/tasks/`: Create; the caller becomes the creator (Editor)
/// - `GET /api/task/:id/`: Detail (Viewer)
/// - `PUT /api/task/:id/`: Partial update (Editor)
/// - `DELETE /api/task/:id/`: Delete (Editor)
///
/// `is_past` follows the task's event and is ignored when sent.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiQuery},
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
    models::{
        double_option,
        task::{CreateTask, Task, TaskDetail, TaskFilter, TaskStatus, UpdateTask},
    },
};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 20000, message = "Task must be 1-20000 characters"))]
    pub task: String,
    #[serde(default)]
    pub description: String,
    pub event: i64,
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub executors: Vec<i64>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 20000, message = "Task must be 1-20000 characters"))]
    pub task: Option<String>,
    pub description: Option<String>,
    pub event: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub deadline: Option<Option<NaiveDate>>,
    pub status: Option<TaskStatus>,
    pub executors: Option<Vec<i64>>,
}

impl From<UpdateTaskRequest> for UpdateTask {
    fn from(req: UpdateTaskRequest) -> Self {
        Self {
            task: req.task,
            description: req.description,
            event_id: req.event,
            deadline: req.deadline,
            status: req.status,
            executors: req.executors,
        }
    }
}

fn task_not_found() -> ApiError {
    ApiError::NotFound("Task not found".to_string())
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(filter): ApiQuery<TaskFilter>,
) -> ApiResult<Json<Vec<TaskDetail>>> {
    require(&state.db, auth.user_id, Action::Read).await?;
    Ok(Json(Task::list(&state.db, filter).await?))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskDetail>)> {
    require(&state.db, auth.user_id, Action::ManageTask).await?;
    req.validate()?;

    let task = Task::create(
        &state.db,
        CreateTask {
            task: req.task,
            description: req.description,
            event_id: req.event,
            creator_id: auth.user_id,
            deadline: req.deadline,
            status: req.status,
            executors: req.executors,
        },
    )
    .await?;

    tracing::info!(
        task_id = task.task.id,
        event_id = task.task.event_id,
        user_id = auth.user_id,
        "Task created"
    );
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TaskDetail>> {
    require(&state.db, auth.user_id, Action::Read).await?;

    let task = Task::detail(&state.db, id).await?.ok_or_else(task_not_found)?;
    Ok(Json(task))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<UpdateTaskRequest>,
) -> ApiResult<Json<TaskDetail>> {
    require(&state.db, auth.user_id, Action::ManageTask).await?;
    req.validate()?;

    let task = Task::update(&state.db, id, req.into()).await?;
    tracing::debug!(task_id = id, user_id = auth.user_id, "Task updated");

    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    require(&state.db, auth.user_id, Action::ManageTask).await?;

    if !Task::delete(&state.db, id).await? {
        return Err(task_not_found());
    }

    tracing::info!(task_id = id, user_id = auth.user_id, "Task deleted");
    Ok(StatusCode::NO_CONTENT)
}
