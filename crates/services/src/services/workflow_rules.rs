//! Admin operations for workflow rules, with the validation the raw model
//! layer does not do.

use db::models::column::Column;
use db::models::integration::ForgeProvider;
use db::models::workflow_rule::{WorkflowEvent, WorkflowRule};
use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum WorkflowRuleError {
    #[error("column belongs to a different project")]
    CrossProjectColumn,
    #[error("column not found")]
    ColumnNotFound,
    #[error("workflow rule not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Deserialize)]
pub struct UpsertWorkflowRule {
    pub provider: ForgeProvider,
    pub event_type: WorkflowEvent,
    pub column_id: Uuid,
}

/// Creates or replaces the rule for the request's scope. The target column
/// must exist and belong to the same project.
pub async fn upsert_rule(
    pool: &SqlitePool,
    project_id: Uuid,
    req: &UpsertWorkflowRule,
) -> Result<WorkflowRule, WorkflowRuleError> {
    let column = Column::find_by_id(pool, req.column_id)
        .await?
        .ok_or(WorkflowRuleError::ColumnNotFound)?;
    if column.project_id != project_id {
        return Err(WorkflowRuleError::CrossProjectColumn);
    }

    Ok(WorkflowRule::upsert(pool, project_id, req.provider, req.event_type, req.column_id).await?)
}

pub async fn delete_rule(pool: &SqlitePool, id: Uuid) -> Result<(), WorkflowRuleError> {
    if WorkflowRule::delete(pool, id).await? == 0 {
        return Err(WorkflowRuleError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::models::project::Project;
    use db::test_utils::create_test_pool;

    #[tokio::test]
    async fn rejects_column_from_another_project() {
        let (pool, _tmp) = create_test_pool().await;
        let a = Project::create(&pool, "A", Uuid::new_v4()).await.unwrap();
        let b = Project::create(&pool, "B", Uuid::new_v4()).await.unwrap();
        let b_col = Column::create(&pool, b.id, "done", "Done", 3, true).await.unwrap();

        let err = upsert_rule(
            &pool,
            a.id,
            &UpsertWorkflowRule {
                provider: ForgeProvider::Gitea,
                event_type: WorkflowEvent::IssueClosed,
                column_id: b_col.id,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WorkflowRuleError::CrossProjectColumn));
    }

    #[tokio::test]
    async fn rejects_missing_column() {
        let (pool, _tmp) = create_test_pool().await;
        let project = Project::create(&pool, "A", Uuid::new_v4()).await.unwrap();

        let err = upsert_rule(
            &pool,
            project.id,
            &UpsertWorkflowRule {
                provider: ForgeProvider::Gitea,
                event_type: WorkflowEvent::IssueClosed,
                column_id: Uuid::new_v4(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WorkflowRuleError::ColumnNotFound));
    }

    #[tokio::test]
    async fn delete_missing_rule_is_not_found() {
        let (pool, _tmp) = create_test_pool().await;
        let err = delete_rule(&pool, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, WorkflowRuleError::NotFound));
    }
}
