//! Startup bootstrap: column provisioning, task backfill, and default
//! workflow rules.
//!
//! Runs on every boot and is idempotent. It only fills gaps; columns and
//! rules an admin has customized are never overwritten.

use db::models::column::{Column, CANONICAL_COLUMNS, DONE_SLUG, TODO_SLUG};
use db::models::integration::Integration;
use db::models::project::Project;
use db::models::workflow_rule::{WorkflowEvent, WorkflowRule};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BootstrapSummary {
    pub columns_created: u64,
    pub tasks_backfilled: u64,
    pub rules_created: u64,
}

pub async fn run(pool: &SqlitePool) -> Result<BootstrapSummary, sqlx::Error> {
    let mut summary = BootstrapSummary::default();

    for project in Project::find_all(pool).await? {
        summary.columns_created += ensure_canonical_columns(pool, project.id).await?;
        summary.tasks_backfilled += backfill_task_columns(pool, project.id).await?;
    }

    for integration in Integration::find_all_active(pool).await? {
        summary.rules_created += ensure_default_rules(pool, &integration).await?;
    }

    info!(
        columns = summary.columns_created,
        backfilled = summary.tasks_backfilled,
        rules = summary.rules_created,
        "bootstrap complete"
    );
    Ok(summary)
}

/// Creates whichever canonical columns the project is missing.
async fn ensure_canonical_columns(pool: &SqlitePool, project_id: Uuid) -> Result<u64, sqlx::Error> {
    let mut created = 0;
    for (slug, name, position, is_final) in CANONICAL_COLUMNS {
        if Column::find_by_slug(pool, project_id, slug).await?.is_none() {
            Column::create(pool, project_id, slug, name, position, is_final).await?;
            created += 1;
        }
    }
    Ok(created)
}

/// Points tasks at the column matching their status slug. Tasks whose
/// status names no column are left alone.
async fn backfill_task_columns(pool: &SqlitePool, project_id: Uuid) -> Result<u64, sqlx::Error> {
    let mut backfilled = 0;
    for column in Column::find_by_project(pool, project_id).await? {
        let result = sqlx::query(
            "UPDATE tasks SET column_id = $1
             WHERE project_id = $2 AND status = $3
               AND (column_id IS NULL OR column_id != $1)",
        )
        .bind(column.id)
        .bind(project_id)
        .bind(&column.slug)
        .execute(pool)
        .await?;
        backfilled += result.rows_affected();
    }
    Ok(backfilled)
}

/// Seeds the default open/close rules for an integration's project, leaving
/// any rule the admin already configured untouched. A legacy done-column
/// setting on the integration takes precedence over the stock close target.
async fn ensure_default_rules(
    pool: &SqlitePool,
    integration: &Integration,
) -> Result<u64, sqlx::Error> {
    let project_id = integration.project_id;
    let mut created = 0;

    let close_slug = match integration.legacy_done_column.as_deref() {
        Some(slug) => {
            if Column::find_by_slug(pool, project_id, slug).await?.is_some() {
                slug
            } else {
                warn!(
                    integration_id = %integration.id,
                    slug,
                    "legacy done column does not exist, using default close target"
                );
                DONE_SLUG
            }
        }
        None => DONE_SLUG,
    };

    let defaults = [
        (WorkflowEvent::IssueOpened, TODO_SLUG),
        (WorkflowEvent::IssueClosed, close_slug),
    ];

    for (event_type, slug) in defaults {
        let existing =
            WorkflowRule::find_by_scope(pool, project_id, integration.provider, event_type)
                .await?;
        if existing.is_some() {
            continue;
        }
        let Some(column) = Column::find_by_slug(pool, project_id, slug).await? else {
            continue;
        };
        WorkflowRule::upsert(pool, project_id, integration.provider, event_type, column.id)
            .await?;
        created += 1;
    }

    Ok(created)
}
