//! Maps external issue lifecycle state to a board column slug.
//!
//! Resolution order: a workflow rule scoped to (project, provider, event)
//! wins; otherwise the fixed default mapping applies (open issues land in
//! "to-do", closed issues in "done"). A rule pointing at a column that has
//! since been deleted is ignored with a warning rather than failing the
//! webhook.

use db::models::{
    column::{Column, DONE_SLUG, TODO_SLUG},
    integration::ForgeProvider,
    workflow_rule::{WorkflowEvent, WorkflowRule},
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StateMapError {
    #[error("unsupported issue state: {0}")]
    UnsupportedState(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Default mapping from a forge issue `state` field.
pub fn default_status(state: &str) -> Result<&'static str, StateMapError> {
    match state {
        "open" => Ok(TODO_SLUG),
        "closed" => Ok(DONE_SLUG),
        other => Err(StateMapError::UnsupportedState(other.to_string())),
    }
}

/// Status slug a task should carry after the given lifecycle event.
pub async fn resolve_status(
    pool: &SqlitePool,
    project_id: Uuid,
    provider: ForgeProvider,
    event_type: WorkflowEvent,
    issue_state: &str,
) -> Result<String, StateMapError> {
    let fallback = default_status(issue_state)?;

    if let Some(rule) = WorkflowRule::find_by_scope(pool, project_id, provider, event_type).await? {
        match Column::find_by_id(pool, rule.column_id).await? {
            Some(column) => return Ok(column.slug),
            None => {
                warn!(
                    rule_id = %rule.id,
                    column_id = %rule.column_id,
                    %event_type,
                    "workflow rule references a deleted column, using default mapping"
                );
            }
        }
    }

    Ok(fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::models::project::Project;
    use db::test_utils::create_test_pool;

    async fn seed_project(pool: &SqlitePool) -> Project {
        Project::create(pool, "Mapper", Uuid::new_v4()).await.unwrap()
    }

    #[test]
    fn default_mapping_covers_open_and_closed() {
        assert_eq!(default_status("open").unwrap(), "to-do");
        assert_eq!(default_status("closed").unwrap(), "done");
        assert!(matches!(
            default_status("locked"),
            Err(StateMapError::UnsupportedState(_))
        ));
    }

    #[tokio::test]
    async fn rule_overrides_default_mapping() {
        let (pool, _tmp) = create_test_pool().await;
        let project = seed_project(&pool).await;
        let review = Column::create(&pool, project.id, "in-review", "In Review", 2, false)
            .await
            .unwrap();
        WorkflowRule::upsert(
            &pool,
            project.id,
            ForgeProvider::Gitea,
            WorkflowEvent::IssueClosed,
            review.id,
        )
        .await
        .unwrap();

        let status = resolve_status(
            &pool,
            project.id,
            ForgeProvider::Gitea,
            WorkflowEvent::IssueClosed,
            "closed",
        )
        .await
        .unwrap();
        assert_eq!(status, "in-review");
    }

    #[tokio::test]
    async fn deleted_rule_column_falls_back_to_default() {
        let (pool, _tmp) = create_test_pool().await;
        let project = seed_project(&pool).await;
        let col = Column::create(&pool, project.id, "staging", "Staging", 5, false)
            .await
            .unwrap();
        WorkflowRule::upsert(
            &pool,
            project.id,
            ForgeProvider::Github,
            WorkflowEvent::IssueClosed,
            col.id,
        )
        .await
        .unwrap();
        Column::delete(&pool, col.id).await.unwrap();

        let status = resolve_status(
            &pool,
            project.id,
            ForgeProvider::Github,
            WorkflowEvent::IssueClosed,
            "closed",
        )
        .await
        .unwrap();
        assert_eq!(status, "done");
    }

    #[tokio::test]
    async fn scope_is_per_provider() {
        let (pool, _tmp) = create_test_pool().await;
        let project = seed_project(&pool).await;
        let col = Column::create(&pool, project.id, "triage", "Triage", 0, false)
            .await
            .unwrap();
        WorkflowRule::upsert(
            &pool,
            project.id,
            ForgeProvider::Github,
            WorkflowEvent::IssueOpened,
            col.id,
        )
        .await
        .unwrap();

        let gitea = resolve_status(
            &pool,
            project.id,
            ForgeProvider::Gitea,
            WorkflowEvent::IssueOpened,
            "open",
        )
        .await
        .unwrap();
        assert_eq!(gitea, "to-do");
    }
}
