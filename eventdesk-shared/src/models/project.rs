/// Projects and the project tree
///
/// Projects nest under an optional parent. Deleting a project removes its
/// whole subtree together with every attached file through `ON DELETE CASCADE`,
/// executed inside one transaction. Re-parenting refuses to create cycles.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     parent_project_id BIGINT REFERENCES projects(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use super::project_file::ProjectFile;

/// Advisory lock key held while re-parenting, so two moves cannot race into a cycle
const REPARENT_LOCK_KEY: i64 = 0x6576_6465_736b_7072;

#[derive(Debug, thiserror::Error)]
pub enum ProjectTreeError {
    #[error("Project not found")]
    NotFound(i64),

    #[error("Parent project not found")]
    ParentNotFound(i64),

    #[error("Event not found")]
    EventNotFound(i64),

    #[error("Project {project_id} cannot be moved under {parent_id}: that would create a cycle")]
    Cycle { project_id: i64, parent_id: i64 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,

    #[serde(rename = "parent_project")]
    pub parent_project_id: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Project with its files and direct children
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub files: Vec<ProjectFile>,
    pub sub_projects: Vec<Project>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateProject {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub parent_id: Option<i64>,
    /// Event to link the new project to
    pub event_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    /// `Some(None)` turns the project into a root
    #[serde(default, deserialize_with = "super::double_option")]
    pub parent_id: Option<Option<i64>>,
}

async fn project_exists(conn: &mut PgConnection, id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM projects WHERE id = $1)")
        .bind(id)
        .fetch_one(conn)
        .await
}

impl Project {
    /// Creates a project, optionally under a parent and linked to an event
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, ProjectTreeError> {
        let mut tx = pool.begin().await?;

        if let Some(parent_id) = data.parent_id {
            if !project_exists(&mut tx, parent_id).await? {
                return Err(ProjectTreeError::ParentNotFound(parent_id));
            }
        }

        if let Some(event_id) = data.event_id {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM events WHERE id = $1)")
                    .bind(event_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if !exists {
                return Err(ProjectTreeError::EventNotFound(event_id));
            }
        }

        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, description, parent_project_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, parent_project_id, created_at, updated_at
            "#,
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.parent_id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(event_id) = data.event_id {
            sqlx::query("INSERT INTO event_projects (event_id, project_id) VALUES ($1, $2)")
                .bind(event_id)
                .bind(project.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            project_id = project.id,
            parent_id = ?data.parent_id,
            event_id = ?data.event_id,
            "Project created"
        );
        Ok(project)
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, parent_project_id, created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Projects without a parent
    pub async fn list_roots(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, parent_project_id, created_at, updated_at
            FROM projects
            WHERE parent_project_id IS NULL
            ORDER BY id
            "#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn list_children(pool: &PgPool, parent_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, parent_project_id, created_at, updated_at
            FROM projects
            WHERE parent_project_id = $1
            ORDER BY id
            "#,
        )
        .bind(parent_id)
        .fetch_all(pool)
        .await
    }

    pub async fn detail(pool: &PgPool, id: i64) -> Result<Option<ProjectDetail>, sqlx::Error> {
        let Some(project) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let files = ProjectFile::list_by_project(pool, id).await?;
        let sub_projects = Self::list_children(pool, id).await?;

        Ok(Some(ProjectDetail {
            project,
            files,
            sub_projects,
        }))
    }

    /// Ids of every project below `id`, excluding `id` itself
    pub async fn descendant_ids(conn: &mut PgConnection, id: i64) -> Result<Vec<i64>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            WITH RECURSIVE subtree AS (
                SELECT id FROM projects WHERE parent_project_id = $1
                UNION
                SELECT p.id FROM projects p JOIN subtree s ON p.parent_project_id = s.id
            )
            SELECT id FROM subtree ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(conn)
        .await
    }

    /// Updates name/description and optionally moves the project
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateProject,
    ) -> Result<Self, ProjectTreeError> {
        let mut tx = pool.begin().await?;

        if let Some(Some(parent_id)) = data.parent_id {
            sqlx::query("SELECT pg_advisory_xact_lock($1)")
                .bind(REPARENT_LOCK_KEY)
                .execute(&mut *tx)
                .await?;

            if parent_id == id {
                return Err(ProjectTreeError::Cycle {
                    project_id: id,
                    parent_id,
                });
            }
            if !project_exists(&mut tx, id).await? {
                return Err(ProjectTreeError::NotFound(id));
            }
            if !project_exists(&mut tx, parent_id).await? {
                return Err(ProjectTreeError::ParentNotFound(parent_id));
            }
            if Self::descendant_ids(&mut tx, id).await?.contains(&parent_id) {
                return Err(ProjectTreeError::Cycle {
                    project_id: id,
                    parent_id,
                });
            }
        }

        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                parent_project_id = CASE WHEN $4 THEN $5 ELSE parent_project_id END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, parent_project_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.parent_id.is_some())
        .bind(data.parent_id.flatten())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ProjectTreeError::NotFound(id))?;

        tx.commit().await?;
        Ok(project)
    }

    /// Deletes the project and its subtree; returns how many projects were removed
    pub async fn delete(pool: &PgPool, id: i64) -> Result<usize, ProjectTreeError> {
        let mut tx = pool.begin().await?;

        if !project_exists(&mut tx, id).await? {
            return Err(ProjectTreeError::NotFound(id));
        }

        let descendants = Self::descendant_ids(&mut tx, id).await?;

        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let removed = descendants.len() + 1;
        tracing::debug!(project_id = id, removed, "Project subtree deleted");
        Ok(removed)
    }
}
