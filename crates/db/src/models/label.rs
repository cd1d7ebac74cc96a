//! Labels for task categorization.
//!
//! `color` holds an internal color token ("teal", "1a2b3c", ...); the
//! outbound label sync translates tokens to hex triplets when mirroring a
//! label onto the external forge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Label {
    pub id: Uuid,
    /// Project ID if project-specific, NULL if global.
    pub project_id: Option<Uuid>,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateLabel {
    pub project_id: Option<Uuid>,
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    "gray".to_string()
}

const LABEL_COLUMNS: &str = "id, project_id, name, color, created_at, updated_at";

impl Label {
    pub async fn create(pool: &SqlitePool, data: &CreateLabel) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Label>(&format!(
            "INSERT INTO labels (id, project_id, name, color) VALUES ($1, $2, $3, $4)
             RETURNING {LABEL_COLUMNS}"
        ))
        .bind(id)
        .bind(data.project_id)
        .bind(&data.name)
        .bind(&data.color)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Label>(&format!(
            "SELECT {LABEL_COLUMNS} FROM labels WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Labels visible to a project (global + project-specific).
    pub async fn find_for_project(
        pool: &SqlitePool,
        project_id: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Label>(&format!(
            "SELECT {LABEL_COLUMNS} FROM labels
             WHERE project_id IS NULL OR project_id = $1
             ORDER BY name"
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    pub async fn attach_to_task(
        pool: &SqlitePool,
        task_id: Uuid,
        label_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT OR IGNORE INTO task_labels (id, task_id, label_id) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(task_id)
            .bind(label_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn detach_from_task(
        pool: &SqlitePool,
        task_id: Uuid,
        label_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_labels WHERE task_id = $1 AND label_id = $2")
            .bind(task_id)
            .bind(label_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn find_by_task_id(
        pool: &SqlitePool,
        task_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Label>(
            "SELECT l.id, l.project_id, l.name, l.color, l.created_at, l.updated_at
             FROM labels l
             INNER JOIN task_labels tl ON l.id = tl.label_id
             WHERE tl.task_id = $1
             ORDER BY l.name",
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }
}
