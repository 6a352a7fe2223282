/// Tasks
///
/// Every task belongs to one event and is deleted with it. `is_past` mirrors
/// the owning event (`is_past OR is_cancelled`); it is computed on insert,
/// recomputed when a task moves to another event, and cascaded by event
/// updates. Clients never write it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     task VARCHAR(20000) NOT NULL,
///     description VARCHAR(20000) NOT NULL DEFAULT '',
///     event_id BIGINT NOT NULL REFERENCES events(id) ON DELETE CASCADE,
///     creator_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     deadline DATE,
///     status SMALLINT NOT NULL DEFAULT 2,
///     is_past BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE task_executors (task_id, user_id);
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use super::group_pairs;

/// Task progress, stored and serialized as its integer value
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[repr(i16)]
#[serde(try_from = "i16", into = "i16")]
pub enum TaskStatus {
    InProgress = 1,
    #[default]
    NotStarted = 2,
    Done = 3,
}

impl TryFrom<i16> for TaskStatus {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(TaskStatus::InProgress),
            2 => Ok(TaskStatus::NotStarted),
            3 => Ok(TaskStatus::Done),
            other => Err(format!("Invalid task status: {}", other)),
        }
    }
}

impl From<TaskStatus> for i16 {
    fn from(status: TaskStatus) -> Self {
        status as i16
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Task not found")]
    NotFound(i64),

    #[error("Event not found")]
    EventNotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,

    /// Task title
    pub task: String,

    pub description: String,

    #[serde(rename = "event")]
    pub event_id: i64,

    #[serde(rename = "creator")]
    pub creator_id: i64,

    pub deadline: Option<NaiveDate>,
    pub status: TaskStatus,
    pub is_past: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub executors: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct CreateTask {
    pub task: String,
    pub description: String,
    pub event_id: i64,
    /// The acting user
    pub creator_id: i64,
    pub deadline: Option<NaiveDate>,
    pub status: TaskStatus,
    pub executors: Vec<i64>,
}

/// Partial update; the creator and `is_past` cannot be changed
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub task: Option<String>,
    pub description: Option<String>,
    pub event_id: Option<i64>,
    /// `Some(None)` clears the deadline
    pub deadline: Option<Option<NaiveDate>>,
    pub status: Option<TaskStatus>,
    pub executors: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TaskFilter {
    pub event_id: Option<i64>,
    /// Only tasks this user executes
    pub user_id: Option<i64>,
}

async fn replace_executors(
    conn: &mut PgConnection,
    task_id: i64,
    user_ids: &[i64],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM task_executors WHERE task_id = $1")
        .bind(task_id)
        .execute(&mut *conn)
        .await?;

    if !user_ids.is_empty() {
        sqlx::query(
            "INSERT INTO task_executors (task_id, user_id) \
             SELECT $1, UNNEST($2::BIGINT[]) ON CONFLICT DO NOTHING",
        )
        .bind(task_id)
        .bind(user_ids)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

impl Task {
    /// Inserts a task with `is_past` taken from its event
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<TaskDetail, TaskError> {
        let mut tx = pool.begin().await?;

        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (task, description, event_id, creator_id, deadline, status, is_past)
            SELECT $1, $2, e.id, $4, $5, $6, (e.is_past OR e.is_cancelled)
            FROM events e
            WHERE e.id = $3
            FOR SHARE OF e
            RETURNING id, task, description, event_id, creator_id, deadline, status, is_past,
                      created_at, updated_at
            "#,
        )
        .bind(&data.task)
        .bind(&data.description)
        .bind(data.event_id)
        .bind(data.creator_id)
        .bind(data.deadline)
        .bind(data.status)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(TaskError::EventNotFound(data.event_id))?;

        replace_executors(&mut tx, task.id, &data.executors).await?;
        tx.commit().await?;

        tracing::info!(task_id = task.id, event_id = task.event_id, "Task created");

        let mut executors = data.executors;
        executors.sort_unstable();
        executors.dedup();
        Ok(TaskDetail { task, executors })
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, task, description, event_id, creator_id, deadline, status, is_past,
                   created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn detail(pool: &PgPool, id: i64) -> Result<Option<TaskDetail>, sqlx::Error> {
        match Self::find_by_id(pool, id).await? {
            Some(task) => Ok(Self::with_executors(pool, vec![task]).await?.pop()),
            None => Ok(None),
        }
    }

    pub async fn list(pool: &PgPool, filter: TaskFilter) -> Result<Vec<TaskDetail>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, task, description, event_id, creator_id, deadline, status, is_past,
                   created_at, updated_at
            FROM tasks t
            WHERE ($1::BIGINT IS NULL OR t.event_id = $1)
              AND ($2::BIGINT IS NULL OR EXISTS (
                    SELECT 1 FROM task_executors x WHERE x.task_id = t.id AND x.user_id = $2))
            ORDER BY t.id
            "#,
        )
        .bind(filter.event_id)
        .bind(filter.user_id)
        .fetch_all(pool)
        .await?;

        Self::with_executors(pool, tasks).await
    }

    /// Applies a partial update; moving the task recomputes `is_past`
    pub async fn update(pool: &PgPool, id: i64, data: UpdateTask) -> Result<TaskDetail, TaskError> {
        let mut tx = pool.begin().await?;

        // Lock order is events then tasks, the same as an event write and its cascade
        let (event_id, is_past) = loop {
            let current_event: i64 = sqlx::query_scalar("SELECT event_id FROM tasks WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(TaskError::NotFound(id))?;
            let target = data.event_id.unwrap_or(current_event);

            let flags: Vec<(i64, bool)> = sqlx::query_as(
                "SELECT id, (is_past OR is_cancelled) FROM events \
                 WHERE id = ANY($1) ORDER BY id FOR SHARE",
            )
            .bind(vec![current_event, target])
            .fetch_all(&mut *tx)
            .await?;

            let locked: Option<i64> =
                sqlx::query_scalar("SELECT event_id FROM tasks WHERE id = $1 FOR UPDATE")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?;
            match locked {
                None => return Err(TaskError::NotFound(id)),
                // Moved by a concurrent writer between the two reads
                Some(now) if now != current_event => continue,
                Some(_) => {}
            }

            let is_past = flags
                .iter()
                .find(|(event, _)| *event == target)
                .map(|(_, past)| *past)
                .ok_or(TaskError::EventNotFound(target))?;
            break (target, is_past);
        };

        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks t SET
                task = COALESCE($2, t.task),
                description = COALESCE($3, t.description),
                event_id = $4,
                deadline = CASE WHEN $5 THEN $6 ELSE t.deadline END,
                status = COALESCE($7, t.status),
                is_past = $8,
                updated_at = NOW()
            WHERE t.id = $1
            RETURNING id, task, description, event_id, creator_id, deadline, status, is_past,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&data.task)
        .bind(&data.description)
        .bind(event_id)
        .bind(data.deadline.is_some())
        .bind(data.deadline.flatten())
        .bind(data.status)
        .bind(is_past)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(TaskError::NotFound(id))?;

        if let Some(executors) = &data.executors {
            replace_executors(&mut tx, id, executors).await?;
        }

        tx.commit().await?;

        Self::with_executors(pool, vec![task])
            .await?
            .pop()
            .ok_or(TaskError::NotFound(id))
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn with_executors(pool: &PgPool, tasks: Vec<Task>) -> Result<Vec<TaskDetail>, sqlx::Error> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        let mut executors = group_pairs(
            sqlx::query_as(
                "SELECT task_id, user_id FROM task_executors WHERE task_id = ANY($1) ORDER BY user_id",
            )
            .bind(&ids)
            .fetch_all(pool)
            .await?,
        );

        Ok(tasks
            .into_iter()
            .map(|task| TaskDetail {
                executors: executors.remove(&task.id).unwrap_or_default(),
                task,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_default_is_not_started() {
        assert_eq!(TaskStatus::default(), TaskStatus::NotStarted);
        assert_eq!(i16::from(TaskStatus::default()), 2);
    }

    #[test]
    fn test_status_integer_serialization() {
        assert_eq!(serde_json::to_value(TaskStatus::InProgress).unwrap(), 1);
        assert_eq!(serde_json::to_value(TaskStatus::Done).unwrap(), 3);

        let status: TaskStatus = serde_json::from_value(serde_json::json!(3)).unwrap();
        assert_eq!(status, TaskStatus::Done);
        assert!(serde_json::from_value::<TaskStatus>(serde_json::json!(9)).is_err());
    }

    #[test]
    fn test_task_field_names() {
        let now = Utc::now();
        let detail = TaskDetail {
            task: Task {
                id: 1,
                task: "Book the hall".to_string(),
                description: String::new(),
                event_id: 2,
                creator_id: 3,
                deadline: None,
                status: TaskStatus::NotStarted,
                is_past: false,
                created_at: now,
                updated_at: now,
            },
            executors: vec![4, 5],
        };

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["event"], 2);
        assert_eq!(json["creator"], 3);
        assert_eq!(json["status"], 2);
        assert_eq!(json["executors"], serde_json::json!([4, 5]));
        assert!(json.get("event_id").is_none());
    }

    #[test]
    fn test_filter_from_query() {
        let filter: TaskFilter = serde_json::from_str(r#"{"event_id": 3}"#).unwrap();
        assert_eq!(filter.event_id, Some(3));
        assert_eq!(filter.user_id, None);
    }
}
