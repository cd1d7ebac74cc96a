//! End-to-end webhook processing against a real temporary database.

use db::models::column::Column;
use db::models::entity_link::{EntityLink, ResourceType};
use db::models::integration::{CreateIntegration, ForgeProvider, Integration};
use db::models::project::Project;
use db::models::task::Task;
use db::models::workflow_rule::{WorkflowEvent, WorkflowRule};
use db::test_utils::create_test_pool;
use hmac::{Hmac, Mac};
use services::services::bootstrap;
use services::services::config::SyncSettings;
use services::services::events;
use services::services::task_service::TaskService;
use services::services::webhook::{SyncError, SyncOutcome, WebhookService};
use sha2::Sha256;
use sqlx::SqlitePool;
use uuid::Uuid;

const SECRET: &str = "hunter2";
const ISSUE_URL: &str = "https://gitea.example.com/acme/widgets/issues/42";

fn sign(body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

fn issue_body(action: &str, state: &str, title: &str, body: Option<&str>) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "action": action,
        "issue": {
            "id": 9001,
            "number": 42,
            "title": title,
            "body": body,
            "state": state,
            "html_url": ISSUE_URL,
            "user": { "login": "alice" }
        },
        "repository": {
            "name": "widgets",
            "full_name": "acme/widgets",
            "owner": { "login": "acme" }
        }
    }))
    .unwrap()
}

async fn setup(pool: &SqlitePool) -> (Project, WebhookService) {
    let project = Project::create(pool, "Widgets", Uuid::new_v4()).await.unwrap();
    Integration::create(
        pool,
        project.id,
        &CreateIntegration {
            provider: ForgeProvider::Gitea,
            repo_owner: "acme".to_string(),
            repo_name: "widgets".to_string(),
            webhook_secret: Some(SECRET.to_string()),
            access_token: None,
            api_base_url: None,
        },
    )
    .await
    .unwrap();
    bootstrap::run(pool).await.unwrap();

    let (tx, _rx) = events::channel();
    let tasks = TaskService::new(pool.clone(), tx);
    let service = WebhookService::new(pool.clone(), SyncSettings::default(), tasks);
    (project, service)
}

async fn deliver(service: &WebhookService, body: &[u8]) -> Result<SyncOutcome, SyncError> {
    service
        .process(ForgeProvider::Gitea, Some("issues"), Some(&sign(body)), body)
        .await
}

#[tokio::test]
async fn opened_issue_creates_linked_task() {
    let (pool, _tmp) = create_test_pool().await;
    let (project, service) = setup(&pool).await;

    let body = issue_body("opened", "open", "Widget breaks", Some("It fell apart."));
    let outcome = deliver(&service, &body).await.unwrap();

    let SyncOutcome::TaskCreated(task_id) = outcome else {
        panic!("expected TaskCreated, got {outcome:?}");
    };
    let task = Task::find_by_id(&pool, task_id).await.unwrap().unwrap();
    assert_eq!(task.project_id, project.id);
    assert_eq!(task.title, "Widget breaks");
    assert_eq!(task.description.as_deref(), Some("It fell apart."));
    assert_eq!(task.status, "to-do");
    let todo = Column::find_by_slug(&pool, project.id, "to-do").await.unwrap().unwrap();
    assert_eq!(task.column_id, Some(todo.id));

    let link = EntityLink::find_by_external_ref(&pool, ResourceType::Issue, "42", ISSUE_URL)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(link.task_id, task_id);
    let metadata: serde_json::Value = serde_json::from_str(link.metadata.as_deref().unwrap()).unwrap();
    assert_eq!(metadata["number"], 42);
    assert_eq!(metadata["reporter"], "alice");
}

#[tokio::test]
async fn replayed_opened_delivery_is_idempotent() {
    let (pool, _tmp) = create_test_pool().await;
    let (project, service) = setup(&pool).await;

    let body = issue_body("opened", "open", "Widget breaks", None);
    deliver(&service, &body).await.unwrap();
    let outcome = deliver(&service, &body).await.unwrap();

    assert!(matches!(outcome, SyncOutcome::Ignored(_)));
    assert_eq!(Task::find_by_project(&pool, project.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn missing_body_gets_placeholder_description() {
    let (pool, _tmp) = create_test_pool().await;
    let (_project, service) = setup(&pool).await;

    let body = issue_body("opened", "open", "Widget breaks", None);
    let SyncOutcome::TaskCreated(task_id) = deliver(&service, &body).await.unwrap() else {
        panic!("expected TaskCreated");
    };
    let task = Task::find_by_id(&pool, task_id).await.unwrap().unwrap();
    assert_eq!(task.description.as_deref(), Some("No description provided."));
}

#[tokio::test]
async fn opened_issue_with_blank_title_is_rejected() {
    let (pool, _tmp) = create_test_pool().await;
    let (project, service) = setup(&pool).await;

    let body = issue_body("opened", "open", "   ", Some("Body without a title"));
    let err = deliver(&service, &body).await.unwrap_err();

    assert!(matches!(err, SyncError::Validation(_)));
    assert!(Task::find_by_project(&pool, project.id).await.unwrap().is_empty());
    assert!(
        EntityLink::find_by_external_ref(&pool, ResourceType::Issue, "42", ISSUE_URL)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn self_authored_issue_is_suppressed() {
    let (pool, _tmp) = create_test_pool().await;
    let (project, service) = setup(&pool).await;

    let marker_body = format!("Mirror\n\n<!-- forgeboard:task:{} -->", Uuid::new_v4());
    let body = issue_body("opened", "open", "Widget breaks", Some(&marker_body));
    let outcome = deliver(&service, &body).await.unwrap();
    assert!(matches!(outcome, SyncOutcome::Ignored(_)));

    let titled = issue_body("opened", "open", "[forgeboard] Widget breaks", None);
    let outcome = deliver(&service, &titled).await.unwrap();
    assert!(matches!(outcome, SyncOutcome::Ignored(_)));

    assert!(Task::find_by_project(&pool, project.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn closed_issue_moves_task_to_done() {
    let (pool, _tmp) = create_test_pool().await;
    let (project, service) = setup(&pool).await;

    let opened = issue_body("opened", "open", "Widget breaks", None);
    let SyncOutcome::TaskCreated(task_id) = deliver(&service, &opened).await.unwrap() else {
        panic!("expected TaskCreated");
    };

    let closed = issue_body("closed", "closed", "Widget breaks", None);
    let outcome = deliver(&service, &closed).await.unwrap();
    assert_eq!(outcome, SyncOutcome::TaskUpdated(task_id));

    let task = Task::find_by_id(&pool, task_id).await.unwrap().unwrap();
    assert_eq!(task.status, "done");
    let done = Column::find_by_slug(&pool, project.id, "done").await.unwrap().unwrap();
    assert_eq!(task.column_id, Some(done.id));

    // Converged replay is a no-op.
    let outcome = deliver(&service, &closed).await.unwrap();
    assert!(matches!(outcome, SyncOutcome::Ignored(_)));
}

#[tokio::test]
async fn workflow_rule_overrides_close_target() {
    let (pool, _tmp) = create_test_pool().await;
    let (project, service) = setup(&pool).await;

    let review = Column::find_by_slug(&pool, project.id, "in-review")
        .await
        .unwrap()
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

    let opened = issue_body("opened", "open", "Widget breaks", None);
    let SyncOutcome::TaskCreated(task_id) = deliver(&service, &opened).await.unwrap() else {
        panic!("expected TaskCreated");
    };
    let closed = issue_body("closed", "closed", "Widget breaks", None);
    deliver(&service, &closed).await.unwrap();

    let task = Task::find_by_id(&pool, task_id).await.unwrap().unwrap();
    assert_eq!(task.status, "in-review");
}

#[tokio::test]
async fn reopened_issue_returns_task_to_todo() {
    let (pool, _tmp) = create_test_pool().await;
    let (_project, service) = setup(&pool).await;

    let opened = issue_body("opened", "open", "Widget breaks", None);
    let SyncOutcome::TaskCreated(task_id) = deliver(&service, &opened).await.unwrap() else {
        panic!("expected TaskCreated");
    };
    deliver(&service, &issue_body("closed", "closed", "Widget breaks", None))
        .await
        .unwrap();
    deliver(&service, &issue_body("reopened", "open", "Widget breaks", None))
        .await
        .unwrap();

    let task = Task::find_by_id(&pool, task_id).await.unwrap().unwrap();
    assert_eq!(task.status, "to-do");
}

#[tokio::test]
async fn edited_issue_resyncs_title_and_body() {
    let (pool, _tmp) = create_test_pool().await;
    let (_project, service) = setup(&pool).await;

    let opened = issue_body("opened", "open", "Widget breaks", Some("Old body"));
    let SyncOutcome::TaskCreated(task_id) = deliver(&service, &opened).await.unwrap() else {
        panic!("expected TaskCreated");
    };

    let edited = issue_body("edited", "open", "Widget shatters", Some("New body"));
    let outcome = deliver(&service, &edited).await.unwrap();
    assert_eq!(outcome, SyncOutcome::TaskUpdated(task_id));

    let task = Task::find_by_id(&pool, task_id).await.unwrap().unwrap();
    assert_eq!(task.title, "Widget shatters");
    assert_eq!(task.description.as_deref(), Some("New body"));

    // Identical payload converges to a no-op.
    let outcome = deliver(&service, &edited).await.unwrap();
    assert!(matches!(outcome, SyncOutcome::Ignored(_)));
}

#[tokio::test]
async fn body_sync_can_be_disabled() {
    let (pool, _tmp) = create_test_pool().await;
    let (_project, service) = setup(&pool).await;

    let opened = issue_body("opened", "open", "Widget breaks", Some("Original"));
    let SyncOutcome::TaskCreated(task_id) = deliver(&service, &opened).await.unwrap() else {
        panic!("expected TaskCreated");
    };

    let (tx, _rx) = events::channel();
    let frozen = WebhookService::new(
        pool.clone(),
        SyncSettings {
            sync_issue_body: false,
        },
        TaskService::new(pool.clone(), tx),
    );
    let edited = issue_body("edited", "open", "Widget shatters", Some("Rewritten"));
    deliver(&frozen, &edited).await.unwrap();

    let task = Task::find_by_id(&pool, task_id).await.unwrap().unwrap();
    assert_eq!(task.title, "Widget shatters");
    assert_eq!(task.description.as_deref(), Some("Original"));
}

#[tokio::test]
async fn deleted_issue_removes_task_and_link() {
    let (pool, _tmp) = create_test_pool().await;
    let (_project, service) = setup(&pool).await;

    let opened = issue_body("opened", "open", "Widget breaks", None);
    let SyncOutcome::TaskCreated(task_id) = deliver(&service, &opened).await.unwrap() else {
        panic!("expected TaskCreated");
    };

    let deleted = issue_body("deleted", "closed", "Widget breaks", None);
    let outcome = deliver(&service, &deleted).await.unwrap();
    assert_eq!(outcome, SyncOutcome::TaskDeleted(task_id));

    assert!(Task::find_by_id(&pool, task_id).await.unwrap().is_none());
    assert!(
        EntityLink::find_by_external_ref(&pool, ResourceType::Issue, "42", ISSUE_URL)
            .await
            .unwrap()
            .is_none()
    );

    // A second delete for the same issue is benign.
    let outcome = deliver(&service, &deleted).await.unwrap();
    assert!(matches!(outcome, SyncOutcome::Ignored(_)));
}

#[tokio::test]
async fn bad_signature_is_rejected_before_any_mutation() {
    let (pool, _tmp) = create_test_pool().await;
    let (project, service) = setup(&pool).await;

    let body = issue_body("opened", "open", "Widget breaks", None);
    let err = service
        .process(
            ForgeProvider::Gitea,
            Some("issues"),
            Some("sha256=deadbeef"),
            &body,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Authentication(_)));
    assert!(Task::find_by_project(&pool, project.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_repository_is_acknowledged() {
    let (pool, _tmp) = create_test_pool().await;
    let (_project, service) = setup(&pool).await;

    let mut payload: serde_json::Value =
        serde_json::from_slice(&issue_body("opened", "open", "Widget breaks", None)).unwrap();
    payload["repository"]["full_name"] = "other/repo".into();
    let body = serde_json::to_vec(&payload).unwrap();

    let outcome = deliver(&service, &body).await.unwrap();
    assert!(matches!(outcome, SyncOutcome::Ignored(_)));
}

#[tokio::test]
async fn non_issue_events_are_acknowledged() {
    let (pool, _tmp) = create_test_pool().await;
    let (_project, service) = setup(&pool).await;

    let outcome = service
        .process(ForgeProvider::Gitea, Some("push"), None, b"{}")
        .await
        .unwrap();
    assert!(matches!(outcome, SyncOutcome::Ignored(_)));
}

#[tokio::test]
async fn malformed_payload_is_a_validation_error() {
    let (pool, _tmp) = create_test_pool().await;
    let (_project, service) = setup(&pool).await;

    let err = service
        .process(ForgeProvider::Gitea, Some("issues"), None, b"not json")
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Validation(_)));
}
