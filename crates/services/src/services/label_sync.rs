//! Best-effort mirroring of task labels onto linked forge issues.
//!
//! Label sync is deliberately lossy in the failure direction: a forge
//! outage, missing credentials, or an unlinked task must never fail the
//! user's label operation. Every skip and failure is logged and swallowed.

use db::models::entity_link::{EntityLink, ResourceType};
use db::models::integration::Integration;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use super::forge::{ForgeApi, ForgeError, RepoRef};

/// Fallback hex color when a token cannot be resolved.
pub const NEUTRAL_COLOR: &str = "6b7280";

/// Internal color tokens and their hex triplets.
const NAMED_COLORS: [(&str, &str); 12] = [
    ("red", "ef4444"),
    ("orange", "f97316"),
    ("amber", "f59e0b"),
    ("yellow", "eab308"),
    ("green", "22c55e"),
    ("teal", "14b8a6"),
    ("cyan", "06b6d4"),
    ("blue", "3b82f6"),
    ("indigo", "6366f1"),
    ("purple", "a855f7"),
    ("pink", "ec4899"),
    ("gray", "6b7280"),
];

/// Resolves an internal color token to a 6-digit hex triplet (no `#`).
///
/// Named tokens win, then literal 6-digit hex passes through, then 3-digit
/// hex expands (`abc` becomes `aabbcc`); anything else lands on the neutral
/// gray.
pub fn resolve_color(token: &str) -> String {
    let token = token.trim().trim_start_matches('#');
    let lowered = token.to_ascii_lowercase();

    if let Some((_, hex)) = NAMED_COLORS.iter().find(|(name, _)| *name == lowered) {
        return (*hex).to_string();
    }
    if lowered.len() == 6 && lowered.chars().all(|c| c.is_ascii_hexdigit()) {
        return lowered;
    }
    if lowered.len() == 3 && lowered.chars().all(|c| c.is_ascii_hexdigit()) {
        return lowered.chars().flat_map(|c| [c, c]).collect();
    }
    NEUTRAL_COLOR.to_string()
}

#[derive(Debug, Error)]
enum LabelSyncError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Forge(#[from] ForgeError),
}

/// Why a push was skipped without contacting the forge.
#[derive(Debug)]
enum Skip {
    NoIssueLink,
    NoIntegration,
    NoCredentials,
    BadIssueNumber(String),
}

pub struct LabelSyncService {
    pool: SqlitePool,
    forge: Arc<dyn ForgeApi>,
}

impl LabelSyncService {
    pub fn new(pool: SqlitePool, forge: Arc<dyn ForgeApi>) -> Self {
        Self { pool, forge }
    }

    /// Mirrors a label attachment onto the task's linked issue. Never fails
    /// the caller.
    pub async fn push_label(&self, task_id: Uuid, name: &str, color: &str) {
        match self.try_push(task_id, name, color).await {
            Ok(Ok(())) => debug!(%task_id, label = name, "label pushed to forge"),
            Ok(Err(skip)) => debug!(%task_id, label = name, reason = ?skip, "label push skipped"),
            Err(e) => warn!(%task_id, label = name, error = %e, "label push failed"),
        }
    }

    /// Mirrors a label detachment. Never fails the caller.
    pub async fn remove_label(&self, task_id: Uuid, name: &str) {
        match self.try_remove(task_id, name).await {
            Ok(Ok(())) => debug!(%task_id, label = name, "label removed on forge"),
            Ok(Err(skip)) => debug!(%task_id, label = name, reason = ?skip, "label removal skipped"),
            Err(e) => warn!(%task_id, label = name, error = %e, "label removal failed"),
        }
    }

    async fn resolve_target(
        &self,
        task_id: Uuid,
    ) -> Result<Result<(RepoRef, i64), Skip>, LabelSyncError> {
        let Some(link) = EntityLink::find_by_task(&self.pool, task_id, ResourceType::Issue).await?
        else {
            return Ok(Err(Skip::NoIssueLink));
        };

        let task = db::models::task::Task::find_by_id(&self.pool, task_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let Some(integration) =
            Integration::find_active_by_project(&self.pool, task.project_id).await?
        else {
            return Ok(Err(Skip::NoIntegration));
        };

        let repo = match RepoRef::from_integration(&integration) {
            Ok(repo) => repo,
            Err(ForgeError::MissingCredentials) | Err(ForgeError::MissingBaseUrl) => {
                return Ok(Err(Skip::NoCredentials));
            }
            Err(e) => return Err(e.into()),
        };

        let issue_number: i64 = match link.external_id.parse() {
            Ok(n) => n,
            Err(_) => return Ok(Err(Skip::BadIssueNumber(link.external_id))),
        };

        Ok(Ok((repo, issue_number)))
    }

    async fn try_push(
        &self,
        task_id: Uuid,
        name: &str,
        color: &str,
    ) -> Result<Result<(), Skip>, LabelSyncError> {
        let (repo, issue_number) = match self.resolve_target(task_id).await? {
            Ok(target) => target,
            Err(skip) => return Ok(Err(skip)),
        };

        let label = match self.forge.get_label(&repo, name).await? {
            Some(label) => label,
            None => {
                self.forge
                    .create_label(&repo, name, &resolve_color(color))
                    .await?
            }
        };
        self.forge.add_labels(&repo, issue_number, &[label.id]).await?;
        Ok(Ok(()))
    }

    async fn try_remove(
        &self,
        task_id: Uuid,
        name: &str,
    ) -> Result<Result<(), Skip>, LabelSyncError> {
        let (repo, issue_number) = match self.resolve_target(task_id).await? {
            Ok(target) => target,
            Err(skip) => return Ok(Err(skip)),
        };

        // Label already gone on the forge counts as done.
        if let Some(label) = self.forge.get_label(&repo, name).await? {
            self.forge.remove_label(&repo, issue_number, label.id).await?;
        }
        Ok(Ok(()))
    }
}
