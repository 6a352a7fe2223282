/// Files attached to projects
///
/// A file is either a plain link supplied by the user or a Google Workspace
/// document created on the user's behalf. The stored `file_type` is the
/// human-readable label shown in the UI.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE project_files (
///     id BIGSERIAL PRIMARY KEY,
///     project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     file_type VARCHAR(32) NOT NULL,
///     file_url TEXT NOT NULL,
///     file_name VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Kind of attachment, serialized as its stored label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    #[serde(rename = "Ссылка")]
    Link,
    #[serde(rename = "Документ")]
    Document,
    #[serde(rename = "Таблица")]
    Spreadsheet,
    #[serde(rename = "Презентация")]
    Presentation,
    #[serde(rename = "Форма")]
    Form,
}

impl FileType {
    pub const ALL: [FileType; 5] = [
        FileType::Link,
        FileType::Document,
        FileType::Spreadsheet,
        FileType::Presentation,
        FileType::Form,
    ];

    /// Label stored in `project_files.file_type`
    pub fn label(&self) -> &'static str {
        match self {
            FileType::Link => "Ссылка",
            FileType::Document => "Документ",
            FileType::Spreadsheet => "Таблица",
            FileType::Presentation => "Презентация",
            FileType::Form => "Форма",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }

    /// Request-side name (`link`, `doc`, `sheet`, `slide`, `form`)
    pub fn doc_type(&self) -> &'static str {
        match self {
            FileType::Link => "link",
            FileType::Document => "doc",
            FileType::Spreadsheet => "sheet",
            FileType::Presentation => "slide",
            FileType::Form => "form",
        }
    }

    pub fn from_doc_type(doc_type: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.doc_type() == doc_type)
    }

    /// Links are recorded as-is and never touch the document service
    pub fn is_link(&self) -> bool {
        matches!(self, FileType::Link)
    }
}

impl TryFrom<String> for FileType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_label(&value).ok_or_else(|| format!("Unknown file type: {}", value))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectFile {
    pub id: i64,

    #[serde(rename = "project")]
    pub project_id: i64,

    #[sqlx(try_from = "String")]
    pub file_type: FileType,

    pub file_url: String,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateProjectFile {
    pub project_id: i64,
    pub file_type: FileType,
    pub file_url: String,
    pub file_name: String,
}

impl ProjectFile {
    pub async fn create(pool: &PgPool, data: CreateProjectFile) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ProjectFile>(
            r#"
            INSERT INTO project_files (project_id, file_type, file_url, file_name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, project_id, file_type, file_url, file_name, created_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.file_type.label())
        .bind(&data.file_url)
        .bind(&data.file_name)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectFile>(
            r#"
            SELECT id, project_id, file_type, file_url, file_name, created_at
            FROM project_files
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_by_project(pool: &PgPool, project_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectFile>(
            r#"
            SELECT id, project_id, file_type, file_url, file_name, created_at
            FROM project_files
            WHERE project_id = $1
            ORDER BY id
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_files WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
