use serde::{Deserialize, Serialize};

use super::{response::WaitlistEntry, user::User};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub user_id: String,
    pub full_name: String,
    pub email: Option<String>,
}

impl From<&User> for Recipient {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
        }
    }
}

impl From<&WaitlistEntry> for Recipient {
    fn from(entry: &WaitlistEntry) -> Self {
        Self {
            user_id: entry.user_id.clone(),
            full_name: entry.user_full_name.clone().unwrap_or_default(),
            email: entry.user_email.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    NewEvent,
    OffWaitlist,
}

/// A message handed to the notification worker once the originating
/// transaction has committed.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Notification {
    pub kind: NotificationKind,
    pub event_id: String,
    pub subject: String,
    pub body: String,
    pub recipients: Vec<Recipient>,
}

impl Notification {
    pub fn off_waitlist(event_id: &str, event_name: &str, recipients: Vec<Recipient>) -> Self {
        Self {
            kind: NotificationKind::OffWaitlist,
            event_id: event_id.to_string(),
            subject: format!("You're going to {}!", event_name),
            body: format!("You're off the waitlist and now listed for the event {}. See you there!", event_name),
            recipients,
        }
    }

    pub fn new_event(event_id: &str, event_name: &str, location: &str, base_url: &str, recipients: Vec<Recipient>) -> Self {
        Self {
            kind: NotificationKind::NewEvent,
            event_id: event_id.to_string(),
            subject: format!("New Event: {}", event_name),
            body: format!("A new event has been created located at {}. Sign up at {}{}", location, base_url, event_id),
            recipients,
        }
    }
}
