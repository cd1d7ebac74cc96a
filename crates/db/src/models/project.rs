use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

/// A project owning tasks, columns and forge integrations.
///
/// Project CRUD itself is conventional application glue; the sync engine
/// only ever reads projects through its integrations.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub async fn create(pool: &SqlitePool, name: &str, id: Uuid) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            "INSERT INTO projects (id, name) VALUES ($1, $2)
             RETURNING id, name, created_at, updated_at",
        )
        .bind(id)
        .bind(name)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            "SELECT id, name, created_at, updated_at FROM projects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            "SELECT id, name, created_at, updated_at FROM projects ORDER BY name",
        )
        .fetch_all(pool)
        .await
    }
}
