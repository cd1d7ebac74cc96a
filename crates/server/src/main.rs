use anyhow::Error as AnyhowError;
use db::DBService;
use server::{AppState, file_logging, routes};
use services::services::bootstrap;
use services::services::config::SyncSettings;
use sqlx::Error as SqlxError;
use thiserror::Error;
use utils::assets::asset_dir;

#[derive(Debug, Error)]
pub enum ForgeboardError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Sqlx(#[from] SqlxError),
    #[error(transparent)]
    Other(#[from] AnyhowError),
}

#[tokio::main]
async fn main() -> Result<(), ForgeboardError> {
    dotenvy::dotenv().ok();

    // The guard must be held for the lifetime of the application so file
    // logs are flushed.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _file_log_guard = file_logging::init_logging(&log_level);

    if !asset_dir().exists() {
        std::fs::create_dir_all(asset_dir())?;
    }

    let db = DBService::new().await?;

    let summary = bootstrap::run(&db.pool).await?;
    if summary.columns_created > 0 || summary.tasks_backfilled > 0 || summary.rules_created > 0 {
        tracing::info!(
            columns = summary.columns_created,
            backfilled = summary.tasks_backfilled,
            rules = summary.rules_created,
            "startup bootstrap applied changes"
        );
    }

    let settings = SyncSettings::from_env();
    let state = AppState::new(db, settings);

    let host = std::env::var("FORGEBOARD_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("FORGEBOARD_PORT")
        .or_else(|_| std::env::var("PORT"))
        .ok()
        .and_then(|s| s.trim().parse::<u16>().ok())
        .unwrap_or(3731);

    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}")).await?;
    tracing::info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
