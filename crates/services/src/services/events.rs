//! Domain events published by the task mutation façade.
//!
//! Consumers (activity feeds, outbound mirroring) subscribe via a broadcast
//! channel. Events carry the mutation source so outbound sync can recognize
//! webhook-born changes and avoid pushing them back to the forge.

use db::models::task::Task;
use serde::Serialize;
use tokio::sync::broadcast;

/// Where a task mutation originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UpdateSource {
    /// A human edit through the API/UI.
    #[default]
    User,
    /// Applied while processing an inbound forge webhook. Outbound sync
    /// must not re-push these.
    Webhook,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskEvent {
    Created { task: Task },
    Updated { task: Task, source: UpdateSource },
    Deleted { task: Task },
}

pub type EventPublisher = broadcast::Sender<TaskEvent>;

/// Channel sized for bursts; events are fire-and-forget and slow consumers
/// simply lag.
pub fn channel() -> (EventPublisher, broadcast::Receiver<TaskEvent>) {
    broadcast::channel(256)
}
