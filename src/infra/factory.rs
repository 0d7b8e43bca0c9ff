use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::models::notification::Notification;
use crate::error::AppError;
use crate::state::{AppState, Repositories};
use crate::infra::email::http_email_service::HttpEmailService;
use crate::infra::repositories::{
    postgres_event_repo::PostgresEventRepo, postgres_response_store::PostgresResponseStore,
    postgres_user_repo::PostgresUserRepo, postgres_group_repo::PostgresGroupRepo,
    sqlite_event_repo::SqliteEventRepo, sqlite_response_store::SqliteResponseStore,
    sqlite_user_repo::SqliteUserRepo, sqlite_group_repo::SqliteGroupRepo,
};

pub async fn bootstrap_state(config: &Config) -> Result<(AppState, UnboundedReceiver<Notification>), AppError> {
    let database_url = &config.database_url;
    let email_service = Arc::new(HttpEmailService::new(
        config.mail_service_url.clone(),
        config.mail_service_token.clone(),
    ));

    let repos = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let pool = connect_postgres(database_url).await?;
        run_postgres_migrations(&pool).await?;
        postgres_repositories(pool)
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let pool = connect_sqlite(database_url).await?;
        run_sqlite_migrations(&pool).await?;
        sqlite_repositories(pool)
    };

    Ok(AppState::assemble(config.clone(), repos, email_service))
}

pub async fn connect_postgres(database_url: &str) -> Result<PgPool, AppError> {
    let opts = PgConnectOptions::from_str(database_url)?
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect_with(opts)
        .await?;
    Ok(pool)
}

pub async fn connect_sqlite(database_url: &str) -> Result<SqlitePool, AppError> {
    let opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await?;
    Ok(pool)
}

pub fn postgres_repositories(pool: PgPool) -> Repositories {
    Repositories {
        event_repo: Arc::new(PostgresEventRepo::new(pool.clone())),
        user_repo: Arc::new(PostgresUserRepo::new(pool.clone())),
        group_repo: Arc::new(PostgresGroupRepo::new(pool.clone())),
        response_store: Arc::new(PostgresResponseStore::new(pool)),
    }
}

pub fn sqlite_repositories(pool: SqlitePool) -> Repositories {
    Repositories {
        event_repo: Arc::new(SqliteEventRepo::new(pool.clone())),
        user_repo: Arc::new(SqliteUserRepo::new(pool.clone())),
        group_repo: Arc::new(SqliteGroupRepo::new(pool.clone())),
        response_store: Arc::new(SqliteResponseStore::new(pool)),
    }
}

pub async fn run_postgres_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations/postgres").run(pool).await?;
    Ok(())
}

pub async fn run_sqlite_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations/sqlite").run(pool).await?;
    Ok(())
}
