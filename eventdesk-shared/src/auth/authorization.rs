/// Access-level gate
///
/// Every profile carries an [`AccessLevel`] (Viewer < Editor < Admin). Handlers
/// name the [`Action`] they perform and call [`require`], which loads the
/// caller's profile and compares levels with [`authorize`].
///
/// A caller without a profile is reported as `ProfileNotFound`, never treated
/// as a Viewer.
///
/// ```no_run
/// use eventdesk_shared::auth::authorization::{require, Action};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, caller: i64) -> Result<(), Box<dyn std::error::Error>> {
/// let profile = require(&pool, caller, Action::DeleteEvent).await?;
/// println!("{} may delete events", profile.full_name);
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;

use crate::models::profile::{AccessLevel, UserProfile};

#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// The caller has no profile row
    #[error("Profile not found")]
    ProfileNotFound(i64),

    #[error("Access denied")]
    InsufficientLevel {
        required: AccessLevel,
        actual: AccessLevel,
    },

    /// Field the caller may not change on this endpoint
    #[error("You cannot change {0}")]
    RestrictedField(String),

    /// Path user id does not match the authenticated user
    #[error("Access denied")]
    NotOwner,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Operations guarded by an access level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// List or read events, tasks and projects
    Read,
    CreateEvent,
    UpdateEvent,
    DeleteEvent,
    /// Create, update or delete tasks
    ManageTask,
    CreateProject,
    UpdateProject,
    DeleteProject,
    /// Attach or detach project documents
    ManageDocument,
    ViewOtherProfile,
    EditOtherProfile,
    ChangeAccessLevel,
}

impl Action {
    pub fn min_level(&self) -> AccessLevel {
        match self {
            Action::Read => AccessLevel::Viewer,
            Action::CreateEvent
            | Action::UpdateEvent
            | Action::ManageTask
            | Action::CreateProject
            | Action::UpdateProject
            | Action::ManageDocument => AccessLevel::Editor,
            Action::DeleteEvent
            | Action::DeleteProject
            | Action::ViewOtherProfile
            | Action::EditOtherProfile
            | Action::ChangeAccessLevel => AccessLevel::Admin,
        }
    }
}

/// Pure level comparison used by every gated endpoint
pub fn authorize(caller: AccessLevel, required: AccessLevel) -> Result<(), AuthzError> {
    if caller >= required {
        Ok(())
    } else {
        Err(AuthzError::InsufficientLevel {
            required,
            actual: caller,
        })
    }
}

/// Loads the caller's profile and checks it against `required`
pub async fn require_level(
    pool: &PgPool,
    user_id: i64,
    required: AccessLevel,
) -> Result<UserProfile, AuthzError> {
    let profile = UserProfile::find_by_user_id(pool, user_id)
        .await?
        .ok_or(AuthzError::ProfileNotFound(user_id))?;

    if let Err(e) = authorize(profile.access_level, required) {
        tracing::debug!(
            user_id,
            required = ?required,
            actual = ?profile.access_level,
            "Access level too low"
        );
        return Err(e);
    }

    Ok(profile)
}

/// [`require_level`] for the level an [`Action`] needs
pub async fn require(
    pool: &PgPool,
    user_id: i64,
    action: Action,
) -> Result<UserProfile, AuthzError> {
    require_level(pool, user_id, action.min_level()).await
}

/// Endpoints scoped to "my profile" must be called with the caller's own id
pub fn require_self(caller: i64, path_user_id: i64) -> Result<(), AuthzError> {
    if caller == path_user_id {
        Ok(())
    } else {
        Err(AuthzError::NotOwner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_matrix() {
        use AccessLevel::*;

        let levels = [Viewer, Editor, Admin];
        for caller in levels {
            for required in levels {
                let allowed = authorize(caller, required).is_ok();
                assert_eq!(allowed, (caller as i16) >= (required as i16));
            }
        }
    }

    #[test]
    fn test_authorize_reports_levels() {
        match authorize(AccessLevel::Viewer, AccessLevel::Admin) {
            Err(AuthzError::InsufficientLevel { required, actual }) => {
                assert_eq!(required, AccessLevel::Admin);
                assert_eq!(actual, AccessLevel::Viewer);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_action_levels() {
        assert_eq!(Action::Read.min_level(), AccessLevel::Viewer);
        assert_eq!(Action::CreateEvent.min_level(), AccessLevel::Editor);
        assert_eq!(Action::UpdateEvent.min_level(), AccessLevel::Editor);
        assert_eq!(Action::ManageTask.min_level(), AccessLevel::Editor);
        assert_eq!(Action::ManageDocument.min_level(), AccessLevel::Editor);
        assert_eq!(Action::DeleteEvent.min_level(), AccessLevel::Admin);
        assert_eq!(Action::DeleteProject.min_level(), AccessLevel::Admin);
        assert_eq!(Action::ViewOtherProfile.min_level(), AccessLevel::Admin);
        assert_eq!(Action::ChangeAccessLevel.min_level(), AccessLevel::Admin);
    }

    #[test]
    fn test_require_self() {
        assert!(require_self(5, 5).is_ok());
        assert!(matches!(require_self(5, 6), Err(AuthzError::NotOwner)));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(AuthzError::ProfileNotFound(1).to_string(), "Profile not found");
        assert_eq!(AuthzError::NotOwner.to_string(), "Access denied");
        assert_eq!(
            AuthzError::RestrictedField("access_level".into()).to_string(),
            "You cannot change access_level"
        );
    }
}
