//! Task mutation façade.
//!
//! Every task mutation performed by the sync engine goes through this
//! service: it keeps `column_id` coherent with the status slug and publishes
//! domain events tagged with the mutation source. Webhook handlers never
//! touch the tasks table directly.

use chrono::{DateTime, Utc};
use db::models::{
    column::Column,
    task::{CreateTask, Task},
};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::events::{EventPublisher, TaskEvent, UpdateSource};

/// Priority assigned to tasks created from inbound webhooks.
pub const DEFAULT_SYNC_PRIORITY: i64 = 0;

/// Partial update; `None` keeps the existing value. An empty description
/// string clears the field.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Option<i64>,
    pub position: Option<i64>,
    pub assignee: Option<String>,
    pub source: UpdateSource,
}

#[derive(Clone)]
pub struct TaskService {
    pool: SqlitePool,
    events: EventPublisher,
}

impl TaskService {
    pub fn new(pool: SqlitePool, events: EventPublisher) -> Self {
        Self { pool, events }
    }

    pub async fn create(
        &self,
        project_id: Uuid,
        title: String,
        description: Option<String>,
        status: String,
        priority: i64,
        assignee: Option<String>,
    ) -> Result<Task, sqlx::Error> {
        let column = Column::find_by_slug(&self.pool, project_id, &status).await?;

        let task = Task::create(
            &self.pool,
            &CreateTask {
                project_id,
                title,
                description,
                status,
                priority,
                assignee,
                column_id: column.map(|c| c.id),
            },
            Uuid::new_v4(),
        )
        .await?;

        debug!(task_id = %task.id, project_id = %project_id, "created task");

        // Fire-and-forget: nobody listening is fine.
        let _ = self.events.send(TaskEvent::Created { task: task.clone() });

        Ok(task)
    }

    pub async fn update(&self, id: Uuid, patch: TaskPatch) -> Result<Task, sqlx::Error> {
        let existing = Task::find_by_id(&self.pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let title = patch.title.unwrap_or(existing.title);
        let description = match patch.description {
            Some(s) if s.trim().is_empty() => None,
            Some(s) => Some(s),
            None => existing.description,
        };
        let status = patch.status.unwrap_or(existing.status);
        let column_id = Column::find_by_slug(&self.pool, existing.project_id, &status)
            .await?
            .map(|c| c.id);
        let priority = patch.priority.unwrap_or(existing.priority);
        let due_date = patch.due_date.or(existing.due_date);
        let assignee = patch.assignee.or(existing.assignee);
        let position = patch.position.unwrap_or(existing.position);

        let task = Task::update(
            &self.pool,
            id,
            &title,
            description.as_deref(),
            &status,
            column_id,
            priority,
            due_date,
            assignee.as_deref(),
            position,
        )
        .await?;

        let _ = self.events.send(TaskEvent::Updated {
            task: task.clone(),
            source: patch.source,
        });

        Ok(task)
    }

    /// Deletes the task and returns its final state. Owned entities
    /// (entity links, label attachments) are removed by FK cascade.
    pub async fn delete(&self, id: Uuid) -> Result<Task, sqlx::Error> {
        let existing = Task::find_by_id(&self.pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        Task::delete(&self.pool, id).await?;

        let _ = self.events.send(TaskEvent::Deleted {
            task: existing.clone(),
        });

        Ok(existing)
    }
}
