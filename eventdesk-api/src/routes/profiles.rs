/// Profile endpoints
///
/// - `GET/PUT /api/profile/:user_id/`: The caller's own profile. `user_id`
///   must be the caller; the profile is created on first access.
/// - `GET/PUT /api/profile_view/:user_id/`: Someone else's profile (Admin).
///   PUT accepts exactly `commission` and `status`.
///
/// Both GETs embed the events the user organizes or participates in.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    extract::ApiJson,
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::NaiveDate;
use eventdesk_shared::{
    auth::{
        authorization::{require, require_self, Action, AuthzError},
        middleware::AuthContext,
    },
    models::{
        event::{Event, EventDetail},
        profile::{UpdateProfile, UserProfile},
        user::User,
    },
};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path as FsPath};
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: UserProfile,
    pub events: Vec<EventDetail>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOwnProfileRequest {
    #[validate(length(max = 100, message = "Ensure this field has no more than 100 characters."))]
    pub full_name: Option<String>,

    pub date_of_birth: Option<NaiveDate>,

    #[validate(length(max = 100, message = "Ensure this field has no more than 100 characters."))]
    pub commission: Option<String>,

    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub status: Option<String>,

    #[validate(length(max = 20, message = "Ensure this field has no more than 20 characters."))]
    pub number_phone: Option<String>,

    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,

    #[validate(length(max = 200, message = "Ensure this field has no more than 200 characters."))]
    pub address: Option<String>,

    /// Path relative to the media root; the file must already exist
    pub profile_photo: Option<String>,

    /// Present only to be refused
    #[serde(default)]
    pub access_level: Option<serde_json::Value>,
}

/// The only shape an admin may send to `profile_view`
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AdminProfileUpdate {
    #[validate(length(max = 100, message = "Ensure this field has no more than 100 characters."))]
    pub commission: String,

    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub status: String,
}

const ADMIN_EDITABLE: [&str; 2] = ["commission", "status"];

const ADMIN_ONLY_MESSAGE: &str = "Only commission and status can be updated";

/// Accepts exactly `commission` and `status`; any other key is reported by name
fn parse_admin_update(body: serde_json::Value) -> ApiResult<AdminProfileUpdate> {
    let object = body
        .as_object()
        .ok_or_else(|| ApiError::BadRequest(ADMIN_ONLY_MESSAGE.to_string()))?;

    let mut details: Vec<ValidationErrorDetail> = object
        .keys()
        .filter(|key| !ADMIN_EDITABLE.contains(&key.as_str()))
        .map(|key| ValidationErrorDetail::new(key.as_str(), ADMIN_ONLY_MESSAGE))
        .collect();
    details.extend(
        ADMIN_EDITABLE
            .iter()
            .filter(|field| !object.contains_key(**field))
            .map(|field| ValidationErrorDetail::new(*field, "This field is required.")),
    );
    if !details.is_empty() {
        details.sort_by(|a, b| a.field.cmp(&b.field));
        return Err(ApiError::ValidationError(details));
    }

    serde_json::from_value(body)
        .map_err(|_| ApiError::BadRequest("commission and status must be strings".to_string()))
}

/// Checks that `relative` names an existing file inside `media_root`
pub async fn check_media_file(media_root: &FsPath, relative: &str) -> ApiResult<()> {
    let not_found = || ApiError::invalid_field("profile_photo", "File not found");

    let path = FsPath::new(relative);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if relative.is_empty() || escapes {
        return Err(not_found());
    }

    match tokio::fs::metadata(media_root.join(path)).await {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => Err(not_found()),
    }
}

/// Initial `full_name` for a lazily created profile
fn initial_full_name(username: &str) -> String {
    username.chars().take(100).collect()
}

pub async fn get_own_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<ProfileResponse>> {
    require_self(auth.user_id, user_id)?;

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let profile =
        UserProfile::get_or_create(&state.db, user.id, &initial_full_name(&user.username)).await?;
    let events = Event::list_for_user(&state.db, user.id).await?;

    Ok(Json(ProfileResponse { profile, events }))
}

pub async fn update_own_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<i64>,
    ApiJson(req): ApiJson<UpdateOwnProfileRequest>,
) -> ApiResult<Json<UserProfile>> {
    require_self(auth.user_id, user_id)?;

    if req.access_level.is_some() {
        return Err(AuthzError::RestrictedField("access_level".to_string()).into());
    }
    req.validate()?;

    if let Some(photo) = req.profile_photo.as_deref() {
        check_media_file(&state.config.media.root, photo).await?;
    }

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    UserProfile::get_or_create(&state.db, user.id, &initial_full_name(&user.username)).await?;

    let changes = UpdateProfile {
        full_name: req.full_name,
        date_of_birth: req.date_of_birth,
        commission: req.commission,
        status: req.status,
        number_phone: req.number_phone,
        email: req.email,
        address: req.address,
        profile_photo: req.profile_photo,
    };

    let profile = UserProfile::update(&state.db, user_id, changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    tracing::debug!(user_id, "Profile updated by owner");
    Ok(Json(profile))
}

pub async fn view_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<ProfileResponse>> {
    require(&state.db, auth.user_id, Action::ViewOtherProfile).await?;

    let profile = UserProfile::find_by_user_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;
    let events = Event::list_for_user(&state.db, user_id).await?;

    Ok(Json(ProfileResponse { profile, events }))
}

pub async fn admin_update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<i64>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> ApiResult<Json<UserProfile>> {
    require(&state.db, auth.user_id, Action::EditOtherProfile).await?;

    let update = parse_admin_update(body)?;
    update.validate()?;

    let profile =
        UserProfile::update_commission_status(&state.db, user_id, &update.commission, &update.status)
            .await?
            .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    tracing::info!(admin_id = auth.user_id, user_id, "Profile updated by admin");
    Ok(Json(profile))
}
