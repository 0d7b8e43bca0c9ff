use std::env;
use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_MAX_ATTENDEE_COUNT: i32 = 2;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub mail_service_url: String,
    pub mail_service_token: String,
    /// Seats one response may claim: the respondent plus guests.
    pub max_attendee_count: i32,
    pub lock_wait_timeout: Duration,
    /// Prefix for event links in outgoing mail; the event id is appended.
    pub base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let max_attendee_count = match env::var("MAX_ATTENDEE_COUNT") {
            Ok(v) => v.parse::<i32>()
                .map_err(|_| AppError::Config("MAX_ATTENDEE_COUNT must be a number".into()))?,
            Err(_) => DEFAULT_MAX_ATTENDEE_COUNT,
        };
        if max_attendee_count < 1 {
            return Err(AppError::Config("MAX_ATTENDEE_COUNT must be at least 1".into()));
        }

        let lock_timeout_ms = match env::var("RSVP_LOCK_TIMEOUT_MS") {
            Ok(v) => v.parse::<u64>()
                .map_err(|_| AppError::Config("RSVP_LOCK_TIMEOUT_MS must be a number".into()))?,
            Err(_) => 5000,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| AppError::Config("DATABASE_URL must be set".into()))?,
            mail_service_url: env::var("MAIL_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/send".to_string()),
            mail_service_token: env::var("MAIL_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            max_attendee_count,
            lock_wait_timeout: Duration::from_millis(lock_timeout_ms),
            base_url: env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000/event/".to_string()),
        })
    }
}
