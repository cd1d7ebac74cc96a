use std::sync::Arc;

use db::DBService;
use services::services::config::SyncSettings;
use services::services::events::{self, EventPublisher};
use services::services::forge::HttpForgeClient;
use services::services::label_sync::LabelSyncService;
use services::services::task_service::TaskService;
use services::services::webhook::WebhookService;

pub mod error;
pub mod file_logging;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub webhooks: WebhookService,
    pub label_sync: Arc<LabelSyncService>,
    pub events: EventPublisher,
}

impl AppState {
    pub fn new(db: DBService, settings: SyncSettings) -> Self {
        let (events, _rx) = events::channel();
        let tasks = TaskService::new(db.pool.clone(), events.clone());
        let webhooks = WebhookService::new(db.pool.clone(), settings, tasks);
        let label_sync = Arc::new(LabelSyncService::new(
            db.pool.clone(),
            Arc::new(HttpForgeClient::new()),
        ));
        Self {
            db,
            webhooks,
            label_sync,
            events,
        }
    }
}
