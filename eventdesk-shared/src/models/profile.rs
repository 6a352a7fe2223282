/// User profiles and access levels
///
/// Each user has at most one profile holding display attributes and the
/// [`AccessLevel`] consulted by the authorization gate.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE user_profiles (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     full_name VARCHAR(100) NOT NULL DEFAULT '',
///     date_of_birth DATE,
///     commission VARCHAR(100) NOT NULL DEFAULT '',
///     status VARCHAR(150) NOT NULL DEFAULT '',
///     number_phone VARCHAR(20) NOT NULL DEFAULT '',
///     email VARCHAR(254) NOT NULL DEFAULT '',
///     address VARCHAR(200) NOT NULL DEFAULT '',
///     profile_photo VARCHAR(255) NOT NULL DEFAULT '',
///     access_level SMALLINT NOT NULL DEFAULT 1,
///     CONSTRAINT user_profiles_user_id_key UNIQUE (user_id)
/// );
/// ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Access level, stored and serialized as its integer value
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
)]
#[repr(i16)]
#[serde(try_from = "i16", into = "i16")]
pub enum AccessLevel {
    #[default]
    Viewer = 1,
    Editor = 2,
    Admin = 3,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Viewer => "viewer",
            AccessLevel::Editor => "editor",
            AccessLevel::Admin => "admin",
        }
    }
}

impl TryFrom<i16> for AccessLevel {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(AccessLevel::Viewer),
            2 => Ok(AccessLevel::Editor),
            3 => Ok(AccessLevel::Admin),
            other => Err(format!("Invalid access level: {}", other)),
        }
    }
}

impl From<AccessLevel> for i16 {
    fn from(level: AccessLevel) -> Self {
        level as i16
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProfile {
    pub id: i64,

    #[serde(rename = "user")]
    pub user_id: i64,

    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,

    /// Department the user belongs to
    pub commission: String,

    /// Position, free text
    pub status: String,

    pub number_phone: String,
    pub email: String,
    pub address: String,

    /// Path relative to the media root
    pub profile_photo: String,

    pub access_level: AccessLevel,
}

/// Self-service profile changes; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfile {
    pub full_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub commission: Option<String>,
    pub status: Option<String>,
    pub number_phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub profile_photo: Option<String>,
}

const PROFILE_COLUMNS: &str = "id, user_id, full_name, date_of_birth, commission, status, \
     number_phone, email, address, profile_photo, access_level";

impl UserProfile {
    pub async fn find_by_user_id(pool: &PgPool, user_id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {} FROM user_profiles WHERE user_id = $1",
            PROFILE_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Creates a profile at `access_level`; fails with a unique violation if one exists
    pub async fn create(
        pool: &PgPool,
        user_id: i64,
        full_name: &str,
        access_level: AccessLevel,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(&format!(
            "INSERT INTO user_profiles (user_id, full_name, access_level) \
             VALUES ($1, $2, $3) RETURNING {}",
            PROFILE_COLUMNS
        ))
        .bind(user_id)
        .bind(full_name)
        .bind(access_level)
        .fetch_one(pool)
        .await
    }

    /// Returns the user's profile, creating a Viewer profile if there is none
    ///
    /// Concurrent first visits are safe: the loser of the insert race reads
    /// the winner's row.
    pub async fn get_or_create(
        pool: &PgPool,
        user_id: i64,
        full_name: &str,
    ) -> Result<Self, sqlx::Error> {
        let inserted = sqlx::query_as::<_, UserProfile>(&format!(
            "INSERT INTO user_profiles (user_id, full_name) VALUES ($1, $2) \
             ON CONFLICT (user_id) DO NOTHING RETURNING {}",
            PROFILE_COLUMNS
        ))
        .bind(user_id)
        .bind(full_name)
        .fetch_optional(pool)
        .await?;

        match inserted {
            Some(profile) => {
                tracing::info!(user_id, "Created default profile");
                Ok(profile)
            }
            None => Self::find_by_user_id(pool, user_id)
                .await?
                .ok_or(sqlx::Error::RowNotFound),
        }
    }

    /// Applies self-service changes; the access level is never touched here
    pub async fn update(
        pool: &PgPool,
        user_id: i64,
        data: UpdateProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(&format!(
            r#"
            UPDATE user_profiles SET
                full_name = COALESCE($2, full_name),
                date_of_birth = COALESCE($3, date_of_birth),
                commission = COALESCE($4, commission),
                status = COALESCE($5, status),
                number_phone = COALESCE($6, number_phone),
                email = COALESCE($7, email),
                address = COALESCE($8, address),
                profile_photo = COALESCE($9, profile_photo)
            WHERE user_id = $1
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        ))
        .bind(user_id)
        .bind(data.full_name)
        .bind(data.date_of_birth)
        .bind(data.commission)
        .bind(data.status)
        .bind(data.number_phone)
        .bind(data.email)
        .bind(data.address)
        .bind(data.profile_photo)
        .fetch_optional(pool)
        .await
    }

    /// The only change an admin may make to someone else's profile
    pub async fn update_commission_status(
        pool: &PgPool,
        user_id: i64,
        commission: &str,
        status: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(&format!(
            "UPDATE user_profiles SET commission = $2, status = $3 WHERE user_id = $1 RETURNING {}",
            PROFILE_COLUMNS
        ))
        .bind(user_id)
        .bind(commission)
        .bind(status)
        .fetch_optional(pool)
        .await
    }

    pub async fn set_access_level(
        pool: &PgPool,
        user_id: i64,
        level: AccessLevel,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(&format!(
            "UPDATE user_profiles SET access_level = $2 WHERE user_id = $1 RETURNING {}",
            PROFILE_COLUMNS
        ))
        .bind(user_id)
        .bind(level)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {} FROM user_profiles ORDER BY id",
            PROFILE_COLUMNS
        ))
        .fetch_all(pool)
        .await
    }
}
