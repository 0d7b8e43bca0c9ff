use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// One user's answer for one event. A user without a row has not responded.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq, Eq)]
pub struct EventResponse {
    pub event_id: String,
    pub user_id: String,
    pub attendee_count: i32,
    pub on_waitlist: bool,
    pub seq: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventResponse {
    pub fn new(event_id: String, user_id: String, attendee_count: i32, on_waitlist: bool) -> Self {
        let now = Utc::now();
        Self {
            event_id,
            user_id,
            attendee_count,
            on_waitlist,
            seq: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Seats this response occupies against capacity.
    pub fn seats_held(&self) -> i32 {
        if self.on_waitlist { 0 } else { self.attendee_count }
    }
}

/// Response row joined with the responding user, for display.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct EventResponseDetail {
    pub event_id: String,
    pub user_id: String,
    pub attendee_count: i32,
    pub on_waitlist: bool,
    pub created_at: DateTime<Utc>,
    pub user_full_name: Option<String>,
}

/// Waitlisted response joined with the contact details needed to notify the
/// user once promoted.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct WaitlistEntry {
    pub event_id: String,
    pub user_id: String,
    pub seq: i64,
    pub created_at: DateTime<Utc>,
    pub user_full_name: Option<String>,
    pub user_email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Seated,
    Waitlisted,
    Removed,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ResponseOutcome {
    pub status: ResponseStatus,
    pub attendee_count: i32,
    pub promoted_user_ids: Vec<String>,
}
