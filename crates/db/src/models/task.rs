//! Task model.
//!
//! `status` is a free column slug rather than a closed enum because the
//! column vocabulary is site-configurable; the canonical slugs live in
//! [`crate::models::column`]. All mutations triggered by webhook processing
//! go through the task service façade in the services crate, never through
//! raw queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    /// Board column, kept coherent with `status` (the column's slug).
    pub column_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: i64,
    pub due_date: Option<DateTime<Utc>>,
    pub assignee: Option<String>,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: i64,
    pub assignee: Option<String>,
    pub column_id: Option<Uuid>,
}

const TASK_COLUMNS: &str = "id, project_id, column_id, title, description, status, priority, \
                            due_date, assignee, position, created_at, updated_at";

impl Task {
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateTask,
        id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (id, project_id, column_id, title, description, status, priority, assignee)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(data.project_id)
        .bind(data.column_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.status)
        .bind(data.priority)
        .bind(&data.assignee)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_project(
        pool: &SqlitePool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = $1 ORDER BY position, created_at"
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Full update. Callers pass the complete resulting state; partial-patch
    /// semantics live in the task service façade.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        title: &str,
        description: Option<&str>,
        status: &str,
        column_id: Option<Uuid>,
        priority: i64,
        due_date: Option<DateTime<Utc>>,
        assignee: Option<&str>,
        position: i64,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks
             SET title = $2, description = $3, status = $4, column_id = $5, priority = $6,
                 due_date = $7, assignee = $8, position = $9,
                 updated_at = datetime('now', 'subsec')
             WHERE id = $1
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(status)
        .bind(column_id)
        .bind(priority)
        .bind(due_date)
        .bind(assignee)
        .bind(position)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
