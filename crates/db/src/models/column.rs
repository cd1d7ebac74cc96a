//! Board columns: the site-configurable vocabulary that task statuses and
//! workflow rules point into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

pub const TODO_SLUG: &str = "to-do";
pub const IN_PROGRESS_SLUG: &str = "in-progress";
pub const IN_REVIEW_SLUG: &str = "in-review";
pub const DONE_SLUG: &str = "done";

/// The four canonical columns every project must have. Sites may add custom
/// columns beyond these; the bootstrap only fills gaps.
pub const CANONICAL_COLUMNS: [(&str, &str, i64, bool); 4] = [
    (TODO_SLUG, "To Do", 0, false),
    (IN_PROGRESS_SLUG, "In Progress", 1, false),
    (IN_REVIEW_SLUG, "In Review", 2, false),
    (DONE_SLUG, "Done", 3, true),
];

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Column {
    pub id: Uuid,
    pub project_id: Uuid,
    pub slug: String,
    pub name: String,
    pub position: i64,
    /// Tasks in a final column count as completed.
    pub is_final: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Column {
    pub async fn create(
        pool: &SqlitePool,
        project_id: Uuid,
        slug: &str,
        name: &str,
        position: i64,
        is_final: bool,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Column>(
            "INSERT INTO columns (id, project_id, slug, name, position, is_final)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, project_id, slug, name, position, is_final, created_at, updated_at",
        )
        .bind(id)
        .bind(project_id)
        .bind(slug)
        .bind(name)
        .bind(position)
        .bind(is_final)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Column>(
            "SELECT id, project_id, slug, name, position, is_final, created_at, updated_at
             FROM columns WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_project(
        pool: &SqlitePool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Column>(
            "SELECT id, project_id, slug, name, position, is_final, created_at, updated_at
             FROM columns WHERE project_id = $1 ORDER BY position, slug",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_slug(
        pool: &SqlitePool,
        project_id: Uuid,
        slug: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Column>(
            "SELECT id, project_id, slug, name, position, is_final, created_at, updated_at
             FROM columns WHERE project_id = $1 AND slug = $2",
        )
        .bind(project_id)
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM columns WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
