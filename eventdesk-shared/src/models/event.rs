/// Events
///
/// An event owns its tasks. Organizers, participants and linked projects are
/// many-to-many relations kept in join tables.
///
/// Saving an event propagates `is_past OR is_cancelled` to every one of its
/// tasks in the same transaction as the event write.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE events (
///     id BIGSERIAL PRIMARY KEY,
///     title VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     date DATE NOT NULL,
///     is_past BOOLEAN NOT NULL DEFAULT FALSE,
///     is_cancelled BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE event_organizers (event_id, user_id);
/// CREATE TABLE event_participants (event_id, user_id);
/// CREATE TABLE event_projects (event_id, project_id);
/// ```
///
/// # Example
///
/// ```no_run
/// use chrono::NaiveDate;
/// use eventdesk_shared::models::event::{CreateEvent, Event, UpdateEvent};
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let event = Event::create(&pool, CreateEvent {
///     title: "Spring fair".to_string(),
///     date: NaiveDate::from_ymd_opt(2025, 4, 12).unwrap(),
///     organizers: vec![1],
///     ..Default::default()
/// })
/// .await?;
///
/// // Every task of the event now reports is_past = true
/// Event::update(&pool, event.event.id, UpdateEvent {
///     is_cancelled: Some(true),
///     ..Default::default()
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use super::group_pairs;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub is_past: bool,
    pub is_cancelled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Event with its relation ids, the shape returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub organizers: Vec<i64>,
    pub participants: Vec<i64>,
    pub projects: Vec<i64>,
    pub tasks: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEvent {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub organizers: Vec<i64>,
    #[serde(default)]
    pub participants: Vec<i64>,
    #[serde(default)]
    pub projects: Vec<i64>,
    #[serde(default)]
    pub is_past: bool,
    #[serde(default)]
    pub is_cancelled: bool,
}

impl Default for CreateEvent {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            date: Utc::now().date_naive(),
            organizers: Vec::new(),
            participants: Vec::new(),
            projects: Vec::new(),
            is_past: false,
            is_cancelled: false,
        }
    }
}

/// Partial update; relation lists, when present, replace the stored set
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub organizers: Option<Vec<i64>>,
    pub participants: Option<Vec<i64>>,
    pub projects: Option<Vec<i64>>,
    pub is_past: Option<bool>,
    pub is_cancelled: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    Organizers,
    Participants,
    Projects,
}

impl Relation {
    fn clear_sql(&self) -> &'static str {
        match self {
            Relation::Organizers => "DELETE FROM event_organizers WHERE event_id = $1",
            Relation::Participants => "DELETE FROM event_participants WHERE event_id = $1",
            Relation::Projects => "DELETE FROM event_projects WHERE event_id = $1",
        }
    }

    fn insert_sql(&self) -> &'static str {
        match self {
            Relation::Organizers => {
                "INSERT INTO event_organizers (event_id, user_id) \
                 SELECT $1, UNNEST($2::BIGINT[]) ON CONFLICT DO NOTHING"
            }
            Relation::Participants => {
                "INSERT INTO event_participants (event_id, user_id) \
                 SELECT $1, UNNEST($2::BIGINT[]) ON CONFLICT DO NOTHING"
            }
            Relation::Projects => {
                "INSERT INTO event_projects (event_id, project_id) \
                 SELECT $1, UNNEST($2::BIGINT[]) ON CONFLICT DO NOTHING"
            }
        }
    }

    fn load_sql(&self) -> &'static str {
        match self {
            Relation::Organizers => {
                "SELECT event_id, user_id FROM event_organizers \
                 WHERE event_id = ANY($1) ORDER BY user_id"
            }
            Relation::Participants => {
                "SELECT event_id, user_id FROM event_participants \
                 WHERE event_id = ANY($1) ORDER BY user_id"
            }
            Relation::Projects => {
                "SELECT event_id, project_id FROM event_projects \
                 WHERE event_id = ANY($1) ORDER BY project_id"
            }
        }
    }
}

/// Replaces the stored set of `relation` ids for one event
async fn replace_relation(
    conn: &mut PgConnection,
    relation: Relation,
    event_id: i64,
    ids: &[i64],
) -> Result<(), sqlx::Error> {
    sqlx::query(relation.clear_sql())
        .bind(event_id)
        .execute(&mut *conn)
        .await?;

    if !ids.is_empty() {
        sqlx::query(relation.insert_sql())
            .bind(event_id)
            .bind(ids)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

/// Sets `is_past = event.is_past OR event.is_cancelled` on every task of the event
pub async fn cascade_past(conn: &mut PgConnection, event_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE tasks t
        SET is_past = (e.is_past OR e.is_cancelled), updated_at = NOW()
        FROM events e
        WHERE e.id = t.event_id
          AND t.event_id = $1
          AND t.is_past IS DISTINCT FROM (e.is_past OR e.is_cancelled)
        "#,
    )
    .bind(event_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

impl Event {
    pub async fn create(pool: &PgPool, data: CreateEvent) -> Result<EventDetail, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (title, description, date, is_past, is_cancelled)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, date, is_past, is_cancelled, created_at, updated_at
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.date)
        .bind(data.is_past)
        .bind(data.is_cancelled)
        .fetch_one(&mut *tx)
        .await?;

        replace_relation(&mut tx, Relation::Organizers, event.id, &data.organizers).await?;
        replace_relation(&mut tx, Relation::Participants, event.id, &data.participants).await?;
        replace_relation(&mut tx, Relation::Projects, event.id, &data.projects).await?;

        tx.commit().await?;

        tracing::info!(event_id = event.id, "Event created");

        Ok(EventDetail {
            event,
            organizers: dedup_sorted(data.organizers),
            participants: dedup_sorted(data.participants),
            projects: dedup_sorted(data.projects),
            tasks: Vec::new(),
        })
    }

    /// Applies a partial update and cascades the past flag to the event's tasks
    ///
    /// Returns `None` when the event does not exist.
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateEvent,
    ) -> Result<Option<EventDetail>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        // Holds the row lock until commit; task writes read the event FOR SHARE
        let updated = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE events SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                date = COALESCE($4, date),
                is_past = COALESCE($5, is_past),
                is_cancelled = COALESCE($6, is_cancelled),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.date)
        .bind(data.is_past)
        .bind(data.is_cancelled)
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            return Ok(None);
        }

        let relations = [
            (Relation::Organizers, &data.organizers),
            (Relation::Participants, &data.participants),
            (Relation::Projects, &data.projects),
        ];
        for (relation, ids) in relations {
            if let Some(ids) = ids {
                replace_relation(&mut tx, relation, id, ids).await?;
            }
        }

        let cascaded = cascade_past(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!(event_id = id, tasks_updated = cascaded, "Event updated");
        Self::detail(pool, id).await
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT id, title, description, date, is_past, is_cancelled, created_at, updated_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn detail(pool: &PgPool, id: i64) -> Result<Option<EventDetail>, sqlx::Error> {
        match Self::find_by_id(pool, id).await? {
            Some(event) => Ok(Self::with_relations(pool, vec![event]).await?.pop()),
            None => Ok(None),
        }
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<EventDetail>, sqlx::Error> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, title, description, date, is_past, is_cancelled, created_at, updated_at
            FROM events
            ORDER BY date, id
            "#,
        )
        .fetch_all(pool)
        .await?;

        Self::with_relations(pool, events).await
    }

    /// Events the user organizes or participates in
    pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<EventDetail>, sqlx::Error> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, title, description, date, is_past, is_cancelled, created_at, updated_at
            FROM events e
            WHERE EXISTS (SELECT 1 FROM event_organizers o WHERE o.event_id = e.id AND o.user_id = $1)
               OR EXISTS (SELECT 1 FROM event_participants p WHERE p.event_id = e.id AND p.user_id = $1)
            ORDER BY date, id
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Self::with_relations(pool, events).await
    }

    /// Deletes the event; its tasks and join rows go with it
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn with_relations(
        pool: &PgPool,
        events: Vec<Event>,
    ) -> Result<Vec<EventDetail>, sqlx::Error> {
        if events.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = events.iter().map(|e| e.id).collect();

        let mut organizers = group_pairs(
            sqlx::query_as(Relation::Organizers.load_sql())
                .bind(&ids)
                .fetch_all(pool)
                .await?,
        );
        let mut participants = group_pairs(
            sqlx::query_as(Relation::Participants.load_sql())
                .bind(&ids)
                .fetch_all(pool)
                .await?,
        );
        let mut projects = group_pairs(
            sqlx::query_as(Relation::Projects.load_sql())
                .bind(&ids)
                .fetch_all(pool)
                .await?,
        );
        let mut tasks = group_pairs(
            sqlx::query_as("SELECT event_id, id FROM tasks WHERE event_id = ANY($1) ORDER BY id")
                .bind(&ids)
                .fetch_all(pool)
                .await?,
        );

        Ok(events
            .into_iter()
            .map(|event| EventDetail {
                organizers: organizers.remove(&event.id).unwrap_or_default(),
                participants: participants.remove(&event.id).unwrap_or_default(),
                projects: projects.remove(&event.id).unwrap_or_default(),
                tasks: tasks.remove(&event.id).unwrap_or_default(),
                event,
            })
            .collect())
    }
}

fn dedup_sorted(mut ids: Vec<i64>) -> Vec<i64> {
    ids.sort_unstable();
    ids.dedup();
    ids
}
