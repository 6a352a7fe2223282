/// User directory and access levels
///
/// - `GET /api/users/`: Every profile
/// - `GET /api/users/:user_id/`: Login identity `{id, username, email}`
/// - `PUT /api/users/:user_id/access_level/`: Change a user's level (Admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use eventdesk_shared::{
    auth::{
        authorization::{require, Action},
        middleware::AuthContext,
    },
    models::{
        profile::{AccessLevel, UserProfile},
        user::{User, UserIdentity},
    },
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AccessLevelRequest {
    pub access_level: AccessLevel,
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserProfile>>> {
    Ok(Json(UserProfile::list(&state.db).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<UserIdentity>> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

pub async fn update_access_level(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<i64>,
    ApiJson(req): ApiJson<AccessLevelRequest>,
) -> ApiResult<Json<UserProfile>> {
    require(&state.db, auth.user_id, Action::ChangeAccessLevel).await?;

    let profile = UserProfile::set_access_level(&state.db, user_id, req.access_level)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    tracing::info!(
        admin_id = auth.user_id,
        user_id,
        access_level = req.access_level.as_str(),
        "Access level changed"
    );

    Ok(Json(profile))
}
