use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::response::EventResponseDetail;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub group_id: Option<String>,
    pub capacity: i32,
    pub start: DateTime<Utc>,
    pub location: String,
    pub creator_id: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

pub struct NewEventParams {
    pub name: String,
    pub group_id: Option<String>,
    pub capacity: i32,
    pub start: DateTime<Utc>,
    pub location: String,
    pub creator_id: String,
}

impl Event {
    pub fn new(params: NewEventParams) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: params.name,
            group_id: params.group_id.filter(|g| !g.is_empty()),
            capacity: params.capacity,
            start: params.start,
            location: params.location,
            creator_id: params.creator_id,
            is_deleted: false,
            created_at: Utc::now(),
        }
    }

    pub fn is_past_at(&self, now: DateTime<Utc>) -> bool {
        now > self.start
    }

    pub fn is_past(&self) -> bool {
        self.is_past_at(Utc::now())
    }
}

/// An event together with the number of seats currently taken by
/// non-waitlisted responses.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct EventWithAttendance {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub event: Event,
    pub total_attendee_count: i64,
}

impl EventWithAttendance {
    pub fn spots_left(&self) -> i64 {
        i64::from(self.event.capacity) - self.total_attendee_count
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct EventDetailed {
    pub event: EventWithAttendance,
    pub responses: Vec<EventResponseDetail>,
    pub user_response: Option<EventResponseDetail>,
    pub max_attendee_count: i32,
}
