/// Project tree endpoints
///
/// - `GET /projects/`: Root projects (Viewer)
/// - `POST /projects/create/`: Create, optionally under a parent and linked to an event (Editor)
/// - `GET /projects/:id/`: Detail with files and direct sub-projects (Viewer)
/// - `PUT /projects/:id/`: Rename or move; `"parent_id": null` makes a root (Editor)
/// - `DELETE /projects/:id/`: Delete the whole subtree and its files (Admin)

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
use eventdesk_shared::{
    auth::{
        authorization::{require, Action},
        middleware::AuthContext,
    },
    models::{
        double_option,
        project::{CreateProject, Project, ProjectDetail, UpdateProject},
    },
};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub parent_id: Option<i64>,
    pub event_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<i64>>,
}

pub async fn list_root_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Project>>> {
    require(&state.db, auth.user_id, Action::Read).await?;
    Ok(Json(Project::list_roots(&state.db).await?))
}

pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    require(&state.db, auth.user_id, Action::CreateProject).await?;
    req.validate()?;

    let project = Project::create(
        &state.db,
        CreateProject {
            name: req.name,
            description: req.description,
            parent_id: req.parent_id,
            event_id: req.event_id,
        },
    )
    .await?;

    tracing::info!(
        project_id = project.id,
        parent_id = ?project.parent_project_id,
        user_id = auth.user_id,
        "Project created"
    );
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ProjectDetail>> {
    require(&state.db, auth.user_id, Action::Read).await?;

    let project = Project::detail(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;
    Ok(Json(project))
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    require(&state.db, auth.user_id, Action::UpdateProject).await?;
    req.validate()?;

    let project = Project::update(
        &state.db,
        id,
        UpdateProject {
            name: req.name,
            description: req.description,
            parent_id: req.parent_id,
        },
    )
    .await?;

    tracing::info!(project_id = id, user_id = auth.user_id, "Project updated");
    Ok(Json(project))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    require(&state.db, auth.user_id, Action::DeleteProject).await?;

    let removed = Project::delete(&state.db, id).await?;

    tracing::info!(
        project_id = id,
        projects_removed = removed,
        user_id = auth.user_id,
        "Project subtree deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}
