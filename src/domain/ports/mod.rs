use crate::domain::models::{
    event::{Event, EventWithAttendance},
    response::{EventResponse, EventResponseDetail, WaitlistEntry},
    user::User,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: &Event) -> Result<Event, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<EventWithAttendance>, AppError>;
    async fn list_upcoming(&self, now: DateTime<Utc>) -> Result<Vec<EventWithAttendance>, AppError>;
    async fn soft_delete(&self, id: &str) -> Result<(), AppError>;
    async fn list_responses(&self, event_id: &str) -> Result<Vec<EventResponseDetail>, AppError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn add_member(&self, group_id: &str, user_id: &str) -> Result<(), AppError>;
    async fn remove_member(&self, group_id: &str, user_id: &str) -> Result<(), AppError>;
    async fn has_member(&self, group_id: &str, user_id: &str) -> Result<bool, AppError>;
    async fn list_members(&self, group_id: &str) -> Result<Vec<User>, AppError>;
}

/// Opens the atomic scope in which every admission decision is read, decided
/// and written.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn ResponseTransaction>, AppError>;
}

/// Reads and writes against one open transaction. Dropping it without calling
/// `commit` rolls everything back.
#[async_trait]
pub trait ResponseTransaction: Send {
    /// Loads a non-deleted event with its seated total and locks it for the
    /// rest of the transaction.
    async fn get_event(&mut self, event_id: &str) -> Result<Option<EventWithAttendance>, AppError>;
    /// Membership lookup on the transaction's own connection.
    async fn has_group_member(&mut self, group_id: &str, user_id: &str) -> Result<bool, AppError>;
    async fn get_response(&mut self, event_id: &str, user_id: &str) -> Result<Option<EventResponse>, AppError>;
    /// Inserts or updates; `created_at` and `seq` are kept from the first insert.
    async fn upsert_response(&mut self, response: &EventResponse) -> Result<EventResponse, AppError>;
    /// Rewrites the editable event fields; call after `get_event` so the
    /// event is already locked.
    async fn update_event(&mut self, event: &Event) -> Result<Event, AppError>;
    async fn delete_response(&mut self, event_id: &str, user_id: &str) -> Result<(), AppError>;
    /// Oldest-first waitlisted rows, at most `limit`.
    async fn list_waitlist(&mut self, event_id: &str, limit: i64) -> Result<Vec<WaitlistEntry>, AppError>;
    async fn promote_waitlist(&mut self, entries: &[WaitlistEntry]) -> Result<(), AppError>;
    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), AppError>;
}
