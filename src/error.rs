use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Cannot respond to past events")]
    EventPast,
    #[error("Timed out waiting for event lock: {0}")]
    LockTimeout(String),
    #[error("Notification delivery failed: {0}")]
    Notification(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl AppError {
    /// Failures where nothing was committed and restating the same call may
    /// succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Database(_) | AppError::LockTimeout(_))
    }

    /// Unique-constraint violations surfaced by either backend.
    pub fn is_unique_violation(&self) -> bool {
        if let AppError::Database(e) = self
            && let Some(db_err) = e.as_database_error() {
            let code = db_err.code().unwrap_or_default();

            // 2067 = SQLite Unique Constraint, 1555 = SQLite Primary Key
            // 23505 = PostgreSQL Unique Violation
            return code == "2067" || code == "1555" || code == "23505";
        }
        false
    }

    pub fn log(&self) {
        match self {
            AppError::Database(e) => error!("Database error: {:?}", e),
            AppError::InternalWithMsg(msg) => error!("Internal error: {}", msg),
            other => tracing::debug!("Request rejected: {}", other),
        }
    }
}
