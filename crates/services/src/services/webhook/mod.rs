//! Inbound webhook processing.
//!
//! The pipeline for a delivery is: filter the event kind, parse the payload,
//! resolve the repository's integration, verify the HMAC signature, then
//! dispatch on the issue action. Benign conditions (unknown repository,
//! replayed delivery, self-authored echo) resolve to [`SyncOutcome::Ignored`]
//! so the forge sees a 2xx and does not retry.

pub mod handlers;
pub mod loop_guard;
pub mod payload;
pub mod signature;

use db::models::integration::{ForgeProvider, Integration};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use super::config::SyncSettings;
use super::state_mapper::StateMapError;
use super::task_service::TaskService;
use payload::{IssueAction, IssuePayload};

#[derive(Debug, Error)]
pub enum SyncError {
    /// Signature missing or failed verification. Mapped to 401.
    #[error("webhook authentication failed: {0}")]
    Authentication(String),
    /// Payload malformed or semantically unusable. Mapped to 400.
    #[error("invalid webhook payload: {0}")]
    Validation(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<StateMapError> for SyncError {
    fn from(err: StateMapError) -> Self {
        match err {
            StateMapError::UnsupportedState(s) => {
                SyncError::Validation(format!("unsupported issue state: {s}"))
            }
            StateMapError::Database(e) => SyncError::Database(e),
        }
    }
}

/// What a successfully processed delivery did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    TaskCreated(Uuid),
    TaskUpdated(Uuid),
    TaskDeleted(Uuid),
    /// Delivery acknowledged without changing anything.
    Ignored(String),
}

impl SyncOutcome {
    pub fn message(&self) -> String {
        match self {
            SyncOutcome::TaskCreated(id) => format!("task {id} created"),
            SyncOutcome::TaskUpdated(id) => format!("task {id} updated"),
            SyncOutcome::TaskDeleted(id) => format!("task {id} deleted"),
            SyncOutcome::Ignored(reason) => reason.clone(),
        }
    }
}

#[derive(Clone)]
pub struct WebhookService {
    pub(crate) pool: SqlitePool,
    pub(crate) settings: SyncSettings,
    pub(crate) tasks: TaskService,
}

impl WebhookService {
    pub fn new(pool: SqlitePool, settings: SyncSettings, tasks: TaskService) -> Self {
        Self {
            pool,
            settings,
            tasks,
        }
    }

    /// Processes one delivery. `event_header` is the provider's event-kind
    /// header (`X-GitHub-Event` / `X-Gitea-Event`), `signature` the
    /// `X-Hub-Signature-256` value, `body` the raw request bytes the
    /// signature was computed over.
    pub async fn process(
        &self,
        provider: ForgeProvider,
        event_header: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<SyncOutcome, SyncError> {
        match event_header {
            Some("issues") => {}
            other => {
                debug!(provider = %provider, event = ?other, "ignoring non-issue event");
                return Ok(SyncOutcome::Ignored(format!(
                    "event {} not handled",
                    other.unwrap_or("<missing>")
                )));
            }
        }

        let payload: IssuePayload = serde_json::from_slice(body)
            .map_err(|e| SyncError::Validation(format!("malformed payload: {e}")))?;

        let (owner, repo) = payload::split_full_name(&payload.repository.full_name)
            .ok_or_else(|| {
                SyncError::Validation(format!(
                    "repository full_name {:?} is not owner/name",
                    payload.repository.full_name
                ))
            })?;

        let Some(integration) =
            Integration::find_active_by_repo(&self.pool, provider, owner, repo).await?
        else {
            debug!(provider = %provider, owner, repo, "no active integration for repository");
            return Ok(SyncOutcome::Ignored(format!(
                "no integration configured for {owner}/{repo}"
            )));
        };

        // Verification happens before any mutation. An integration without a
        // secret has opted out of verification.
        signature::verify_signature(integration.webhook_secret.as_deref(), signature, body)?;

        let Some(action) = IssueAction::classify(&payload.action) else {
            return Ok(SyncOutcome::Ignored(format!(
                "issue action {:?} not handled",
                payload.action
            )));
        };

        info!(
            provider = %provider,
            action = %payload.action,
            issue = payload.issue.number,
            repo = %payload.repository.full_name,
            "processing issue webhook"
        );

        match action {
            IssueAction::Opened => self.handle_opened(&integration, &payload).await,
            IssueAction::Closed | IssueAction::Reopened => {
                self.handle_state_change(&integration, &payload, action).await
            }
            IssueAction::Edited => self.handle_edited(&payload).await,
            IssueAction::Deleted => self.handle_deleted(&payload).await,
        }
    }
}
