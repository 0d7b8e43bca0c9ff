pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod state;
pub mod background;

use crate::config::Config;
use crate::domain::services::notification_service::NotificationService;
use crate::error::AppError;
use crate::infra::factory::bootstrap_state;
use crate::state::AppState;
use crate::background::start_notification_worker;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub fn init_logging() -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily("./logs", "rsvp-service.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("info,rsvp_backend=debug"));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .pretty()
        .with_target(false)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()));

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!("Logging initialized. Writing JSON logs to ./logs/");
    guard
}

/// Connects storage, runs migrations and starts the notification worker.
pub async fn start(config: &Config) -> Result<(Arc<AppState>, JoinHandle<()>), AppError> {
    let (state, rx) = bootstrap_state(config).await?;
    let state = Arc::new(state);

    let notification_service = NotificationService::new(state.email_service.clone());
    let worker = tokio::spawn(async move {
        start_notification_worker(rx, notification_service).await;
    });

    info!("RSVP service ready (max attendees per response: {})", config.max_attendee_count);
    Ok((state, worker))
}
