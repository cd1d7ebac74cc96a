//! Forge integrations: the stored binding of a project to an external
//! repository plus the credentials and webhook secret for that repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum::{Display, EnumString};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize, Display, EnumString, Default,
)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ForgeProvider {
    #[default]
    Gitea,
    Github,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Integration {
    pub id: Uuid,
    pub project_id: Uuid,
    pub provider: ForgeProvider,
    pub repo_owner: String,
    pub repo_name: String,
    /// HMAC secret for inbound webhook verification. None means verification
    /// is skipped for this integration (explicit trust decision).
    #[serde(skip_serializing)]
    pub webhook_secret: Option<String>,
    /// API token for outbound calls against the forge.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// Base URL of the forge API, e.g. `https://gitea.example.com`.
    pub api_base_url: Option<String>,
    /// Pre-rule close target, consumed once by the column bootstrap.
    pub legacy_done_column: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateIntegration {
    pub provider: ForgeProvider,
    pub repo_owner: String,
    pub repo_name: String,
    pub webhook_secret: Option<String>,
    pub access_token: Option<String>,
    pub api_base_url: Option<String>,
}

const INTEGRATION_COLUMNS: &str = "id, project_id, provider, repo_owner, repo_name, \
                                   webhook_secret, access_token, api_base_url, \
                                   legacy_done_column, is_active, created_at, updated_at";

impl Integration {
    pub async fn create(
        pool: &SqlitePool,
        project_id: Uuid,
        data: &CreateIntegration,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Integration>(&format!(
            "INSERT INTO integrations
                 (id, project_id, provider, repo_owner, repo_name, webhook_secret,
                  access_token, api_base_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {INTEGRATION_COLUMNS}"
        ))
        .bind(id)
        .bind(project_id)
        .bind(data.provider)
        .bind(&data.repo_owner)
        .bind(&data.repo_name)
        .bind(&data.webhook_secret)
        .bind(&data.access_token)
        .bind(&data.api_base_url)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Integration>(&format!(
            "SELECT {INTEGRATION_COLUMNS} FROM integrations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// The active integration bound to a repository, if any.
    pub async fn find_active_by_repo(
        pool: &SqlitePool,
        provider: ForgeProvider,
        repo_owner: &str,
        repo_name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Integration>(&format!(
            "SELECT {INTEGRATION_COLUMNS} FROM integrations
             WHERE provider = $1 AND repo_owner = $2 AND repo_name = $3 AND is_active = 1"
        ))
        .bind(provider)
        .bind(repo_owner)
        .bind(repo_name)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_project(
        pool: &SqlitePool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Integration>(&format!(
            "SELECT {INTEGRATION_COLUMNS} FROM integrations
             WHERE project_id = $1 ORDER BY created_at"
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_active_by_project(
        pool: &SqlitePool,
        project_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Integration>(&format!(
            "SELECT {INTEGRATION_COLUMNS} FROM integrations
             WHERE project_id = $1 AND is_active = 1
             ORDER BY created_at LIMIT 1"
        ))
        .bind(project_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_all_active(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Integration>(&format!(
            "SELECT {INTEGRATION_COLUMNS} FROM integrations WHERE is_active = 1"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn deactivate(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE integrations SET is_active = 0, updated_at = datetime('now', 'subsec')
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn rotate_secret(
        pool: &SqlitePool,
        id: Uuid,
        webhook_secret: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE integrations SET webhook_secret = $2, updated_at = datetime('now', 'subsec')
             WHERE id = $1",
        )
        .bind(id)
        .bind(webhook_secret)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
