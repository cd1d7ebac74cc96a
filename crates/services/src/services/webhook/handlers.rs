//! Per-action webhook handlers.

use db::models::entity_link::{CreateEntityLink, EntityLink, ResourceType};
use db::models::integration::Integration;
use db::models::task::Task;
use serde_json::json;
use tracing::{debug, warn};

use super::super::events::UpdateSource;
use super::super::state_mapper;
use super::super::task_service::{TaskPatch, DEFAULT_SYNC_PRIORITY};
use super::loop_guard;
use super::payload::{IssueAction, IssuePayload};
use super::{SyncError, SyncOutcome, WebhookService};

const EMPTY_DESCRIPTION: &str = "No description provided.";

impl WebhookService {
    /// `opened`: create a mirror task and its entity link, unless the issue
    /// is one of our own echoes or already linked.
    pub(super) async fn handle_opened(
        &self,
        integration: &Integration,
        payload: &IssuePayload,
    ) -> Result<SyncOutcome, SyncError> {
        let issue = &payload.issue;

        if loop_guard::is_self_authored(&issue.title, issue.body.as_deref()) {
            debug!(issue = issue.number, "suppressing self-authored echo");
            return Ok(SyncOutcome::Ignored("self-authored issue echo".to_string()));
        }

        let title = issue.title.trim();
        if title.is_empty() {
            return Err(SyncError::Validation("issue title is empty".to_string()));
        }

        let external_id = issue.number.to_string();
        if let Some(existing) = EntityLink::find_by_external_ref(
            &self.pool,
            ResourceType::Issue,
            &external_id,
            &issue.html_url,
        )
        .await?
        {
            debug!(issue = issue.number, task_id = %existing.task_id, "replayed delivery");
            return Ok(SyncOutcome::Ignored(format!(
                "issue #{} already linked to task {}",
                issue.number, existing.task_id
            )));
        }

        let status = state_mapper::resolve_status(
            &self.pool,
            integration.project_id,
            integration.provider,
            db::models::workflow_rule::WorkflowEvent::IssueOpened,
            &issue.state,
        )
        .await?;

        let description = issue
            .body
            .as_deref()
            .map(loop_guard::strip_task_markers)
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| EMPTY_DESCRIPTION.to_string());

        let task = self
            .tasks
            .create(
                integration.project_id,
                title.to_string(),
                Some(description),
                status,
                DEFAULT_SYNC_PRIORITY,
                None,
            )
            .await?;

        let reporter = issue.user.as_ref().map(|u| u.login.clone());
        if let Err(e) = EntityLink::create(
            &self.pool,
            &CreateEntityLink {
                task_id: task.id,
                resource_type: ResourceType::Issue,
                external_id,
                url: issue.html_url.clone(),
                title: title.to_string(),
                metadata: Some(json!({
                    "number": issue.number,
                    "repository": payload.repository.full_name,
                    "reporter": reporter,
                })),
            },
        )
        .await
        {
            // The task exists either way; surface the failure so the forge
            // retries and the replay hits the already-linked path once the
            // link lands.
            warn!(task_id = %task.id, error = %e, "failed to record entity link");
            return Err(e.into());
        }

        Ok(SyncOutcome::TaskCreated(task.id))
    }

    /// `closed` / `reopened`: move the linked task to the mapped column.
    pub(super) async fn handle_state_change(
        &self,
        integration: &Integration,
        payload: &IssuePayload,
        action: IssueAction,
    ) -> Result<SyncOutcome, SyncError> {
        let issue = &payload.issue;

        let Some(link) = self.find_issue_link(payload).await? else {
            return Ok(SyncOutcome::Ignored(format!(
                "no task linked to issue #{}",
                issue.number
            )));
        };

        let Some(task) = Task::find_by_id(&self.pool, link.task_id).await? else {
            // Link outlived its task somehow; nothing to move.
            warn!(link_id = %link.id, "entity link points at missing task");
            return Ok(SyncOutcome::Ignored(format!(
                "linked task for issue #{} no longer exists",
                issue.number
            )));
        };

        let event_type = match action {
            IssueAction::Closed => db::models::workflow_rule::WorkflowEvent::IssueClosed,
            IssueAction::Reopened => db::models::workflow_rule::WorkflowEvent::IssueReopened,
            _ => unreachable!("handle_state_change only dispatched for closed/reopened"),
        };

        let target = state_mapper::resolve_status(
            &self.pool,
            integration.project_id,
            integration.provider,
            event_type,
            &issue.state,
        )
        .await?;

        if task.status == target {
            return Ok(SyncOutcome::Ignored(format!(
                "task {} already in status {target}",
                task.id
            )));
        }

        let updated = self
            .tasks
            .update(
                task.id,
                TaskPatch {
                    status: Some(target),
                    source: UpdateSource::Webhook,
                    ..Default::default()
                },
            )
            .await?;

        Ok(SyncOutcome::TaskUpdated(updated.id))
    }

    /// `edited`: re-sync title (always) and description (when enabled).
    pub(super) async fn handle_edited(
        &self,
        payload: &IssuePayload,
    ) -> Result<SyncOutcome, SyncError> {
        let issue = &payload.issue;

        let Some(link) = self.find_issue_link(payload).await? else {
            return Ok(SyncOutcome::Ignored(format!(
                "no task linked to issue #{}",
                issue.number
            )));
        };

        let Some(task) = Task::find_by_id(&self.pool, link.task_id).await? else {
            return Ok(SyncOutcome::Ignored(format!(
                "linked task for issue #{} no longer exists",
                issue.number
            )));
        };

        let new_title = match issue.title.trim() {
            "" => None,
            t if t != task.title => Some(t.to_string()),
            _ => None,
        };

        let new_description = if self.settings.sync_issue_body {
            let incoming = issue
                .body
                .as_deref()
                .map(loop_guard::strip_task_markers)
                .unwrap_or_default();
            if incoming != task.description.clone().unwrap_or_default() {
                // An empty string clears the description through the patch.
                Some(incoming)
            } else {
                None
            }
        } else {
            None
        };

        if new_title.is_none() && new_description.is_none() {
            return Ok(SyncOutcome::Ignored(format!(
                "task {} already matches issue #{}",
                task.id, issue.number
            )));
        }

        let updated = self
            .tasks
            .update(
                task.id,
                TaskPatch {
                    title: new_title,
                    description: new_description,
                    source: UpdateSource::Webhook,
                    ..Default::default()
                },
            )
            .await?;

        Ok(SyncOutcome::TaskUpdated(updated.id))
    }

    /// `deleted`: remove the mirror task; the entity link goes with it by
    /// cascade.
    pub(super) async fn handle_deleted(
        &self,
        payload: &IssuePayload,
    ) -> Result<SyncOutcome, SyncError> {
        let issue = &payload.issue;

        let Some(link) = self.find_issue_link(payload).await? else {
            return Ok(SyncOutcome::Ignored(format!(
                "no task linked to issue #{}",
                issue.number
            )));
        };

        match self.tasks.delete(link.task_id).await {
            Ok(task) => Ok(SyncOutcome::TaskDeleted(task.id)),
            Err(sqlx::Error::RowNotFound) => Ok(SyncOutcome::Ignored(format!(
                "linked task for issue #{} no longer exists",
                issue.number
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_issue_link(
        &self,
        payload: &IssuePayload,
    ) -> Result<Option<EntityLink>, sqlx::Error> {
        EntityLink::find_by_external_ref(
            &self.pool,
            ResourceType::Issue,
            &payload.issue.number.to_string(),
            &payload.issue.html_url,
        )
        .await
    }
}
