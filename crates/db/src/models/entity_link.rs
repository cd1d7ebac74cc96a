//! Entity links: the durable join records between tasks and external forge
//! resources. At most one link exists per (resource_type, external_id, url),
//! enforced by a unique index, and links are removed by cascade when their
//! task is deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum::{Display, EnumString};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize, Display, EnumString,
)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResourceType {
    Issue,
    PullRequest,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EntityLink {
    pub id: Uuid,
    pub task_id: Uuid,
    pub resource_type: ResourceType,
    pub external_id: String,
    pub url: String,
    pub title: String,
    /// Opaque JSON payload (issue number, repository, reporter).
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateEntityLink {
    pub task_id: Uuid,
    pub resource_type: ResourceType,
    pub external_id: String,
    pub url: String,
    pub title: String,
    pub metadata: Option<serde_json::Value>,
}

const LINK_COLUMNS: &str =
    "id, task_id, resource_type, external_id, url, title, metadata, created_at";

impl EntityLink {
    pub async fn create(pool: &SqlitePool, data: &CreateEntityLink) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        let metadata = data.metadata.as_ref().map(|m| m.to_string());
        sqlx::query_as::<_, EntityLink>(&format!(
            "INSERT INTO entity_links (id, task_id, resource_type, external_id, url, title, metadata)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {LINK_COLUMNS}"
        ))
        .bind(id)
        .bind(data.task_id)
        .bind(data.resource_type)
        .bind(&data.external_id)
        .bind(&data.url)
        .bind(&data.title)
        .bind(metadata)
        .fetch_one(pool)
        .await
    }

    /// Link for a distinct external resource, keyed exactly as the unique
    /// index is.
    pub async fn find_by_external_ref(
        pool: &SqlitePool,
        resource_type: ResourceType,
        external_id: &str,
        url: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, EntityLink>(&format!(
            "SELECT {LINK_COLUMNS} FROM entity_links
             WHERE resource_type = $1 AND external_id = $2 AND url = $3"
        ))
        .bind(resource_type)
        .bind(external_id)
        .bind(url)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_task(
        pool: &SqlitePool,
        task_id: Uuid,
        resource_type: ResourceType,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, EntityLink>(&format!(
            "SELECT {LINK_COLUMNS} FROM entity_links
             WHERE task_id = $1 AND resource_type = $2
             ORDER BY created_at LIMIT 1"
        ))
        .bind(task_id)
        .bind(resource_type)
        .fetch_optional(pool)
        .await
    }
}
