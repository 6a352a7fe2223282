/// Authentication endpoints
///
/// - `POST /token/`: Exchange username and password for an access/refresh pair
/// - `POST /token/refresh/`: Exchange a refresh token for a new access token
/// - `POST /register/`: Create a login
///
/// Registration creates only the identity. The profile appears on the user's
/// first visit to their own profile, at Viewer level.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{extract::State, http::StatusCode, Json};
use eventdesk_shared::{
    auth::{jwt, password},
    models::{
        profile::{AccessLevel, UserProfile},
        user::{CreateUser, User, UserIdentity},
    },
};
use serde::{Deserialize, Serialize};
use validator::Validate;

const BAD_CREDENTIALS: &str = "No active account found with the given credentials";

#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub username: String,

    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access: String,
    pub refresh: String,
    pub user_id: i64,

    /// `None` until the profile exists
    pub profile_id: Option<i64>,
    pub access_level: Option<AccessLevel>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 150, message = "Username must be 1-150 characters"))]
    pub username: String,

    pub password: String,

    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
}

/// Issues a token pair
///
/// # Errors
///
/// - `400 Bad Request`: Blank username or password
/// - `401 Unauthorized`: Unknown user, wrong password or inactive account
pub async fn obtain_token(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TokenRequest>,
) -> ApiResult<Json<TokenResponse>> {
    req.validate()?;

    let user = User::find_by_username(&state.db, &req.username)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(BAD_CREDENTIALS.to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? || !user.is_active {
        tracing::info!(username = %req.username, "Rejected login");
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.to_string()));
    }

    User::update_last_login(&state.db, user.id).await?;
    let profile = UserProfile::find_by_user_id(&state.db, user.id).await?;

    let access_claims = jwt::Claims::with_expiration(
        user.id,
        jwt::TokenType::Access,
        state.config.access_token_lifetime(),
    );
    let refresh_claims = jwt::Claims::with_expiration(
        user.id,
        jwt::TokenType::Refresh,
        state.config.refresh_token_lifetime(),
    );

    let access = jwt::create_token(&access_claims, state.jwt_secret())?;
    let refresh = jwt::create_token(&refresh_claims, state.jwt_secret())?;

    tracing::info!(user_id = user.id, "Issued token pair");

    Ok(Json(TokenResponse {
        access,
        refresh,
        user_id: user.id,
        profile_id: profile.as_ref().map(|p| p.id),
        access_level: profile.map(|p| p.access_level),
    }))
}

/// # Errors
///
/// - `401 Unauthorized`: Invalid, expired or non-refresh token
pub async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access = jwt::refresh_access_token(
        &req.refresh,
        state.jwt_secret(),
        state.config.access_token_lifetime(),
    )?;

    Ok(Json(RefreshResponse { access }))
}

/// Creates a login
///
/// # Errors
///
/// - `400 Bad Request`: Invalid username or email, weak password
/// - `409 Conflict`: Username already taken
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserIdentity>)> {
    req.validate()?;

    password::validate_password_strength(&req.password, &req.username)
        .map_err(|message| ApiError::invalid_field("password", message))?;

    if User::find_by_username(&state.db, &req.username).await?.is_some() {
        return Err(ApiError::Conflict(
            "A user with that username already exists.".to_string(),
        ));
    }

    let password_hash = password::hash_password(&req.password)?;

    // A concurrent registration still loses on users_username_key (409)
    let user = User::create(
        &state.db,
        CreateUser {
            username: req.username,
            email: req.email,
            password_hash,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, username = %user.username, "Registered user");

    Ok((StatusCode::CREATED, Json(UserIdentity::from(user))))
}
