//! Workflow rules: per-project mapping from an external lifecycle event to a
//! target board column, superseding the default open/closed mapping.
//!
//! The (project, provider, event_type) scope is unique; writes are strict
//! upserts, so there is never more than one applicable rule and "last upsert
//! wins" is the whole conflict story.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum::{Display, EnumString};
use uuid::Uuid;

use super::integration::ForgeProvider;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize, Display, EnumString,
)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkflowEvent {
    IssueOpened,
    IssueClosed,
    IssueReopened,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WorkflowRule {
    pub id: Uuid,
    pub project_id: Uuid,
    pub provider: ForgeProvider,
    pub event_type: WorkflowEvent,
    pub column_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const RULE_COLUMNS: &str = "id, project_id, provider, event_type, column_id, created_at, updated_at";

impl WorkflowRule {
    /// Insert or update the rule for (project, provider, event_type).
    /// Never produces duplicates.
    pub async fn upsert(
        pool: &SqlitePool,
        project_id: Uuid,
        provider: ForgeProvider,
        event_type: WorkflowEvent,
        column_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, WorkflowRule>(&format!(
            "INSERT INTO workflow_rules (id, project_id, provider, event_type, column_id)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT(project_id, provider, event_type) DO UPDATE SET
                 column_id = excluded.column_id,
                 updated_at = datetime('now', 'subsec')
             RETURNING {RULE_COLUMNS}"
        ))
        .bind(id)
        .bind(project_id)
        .bind(provider)
        .bind(event_type)
        .bind(column_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_scope(
        pool: &SqlitePool,
        project_id: Uuid,
        provider: ForgeProvider,
        event_type: WorkflowEvent,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, WorkflowRule>(&format!(
            "SELECT {RULE_COLUMNS} FROM workflow_rules
             WHERE project_id = $1 AND provider = $2 AND event_type = $3"
        ))
        .bind(project_id)
        .bind(provider)
        .bind(event_type)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_project(
        pool: &SqlitePool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, WorkflowRule>(&format!(
            "SELECT {RULE_COLUMNS} FROM workflow_rules
             WHERE project_id = $1 ORDER BY provider, event_type"
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM workflow_rules WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
