use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::models::event::{Event, EventDetailed, EventWithAttendance, NewEventParams};
use crate::domain::models::notification::{Notification, Recipient};
use crate::domain::ports::{EventRepository, GroupRepository, ResponseStore};
use crate::domain::services::access::{can_access, ensure_access};
use crate::domain::services::event_locks::EventLocks;
use crate::domain::services::notification_service::NotificationDispatcher;
use crate::error::AppError;

pub struct UpdateEventParams {
    pub id: String,
    pub name: String,
    pub capacity: i32,
    pub start: DateTime<Utc>,
    pub location: String,
}

/// Event lifecycle outside of admission: creation, edits, soft deletion and
/// the read views shown to members.
pub struct EventService {
    events: Arc<dyn EventRepository>,
    store: Arc<dyn ResponseStore>,
    groups: Arc<dyn GroupRepository>,
    locks: EventLocks,
    notifier: NotificationDispatcher,
    base_url: String,
    max_attendee_count: i32,
    lock_wait_timeout: Duration,
}

impl EventService {
    pub fn new(
        events: Arc<dyn EventRepository>,
        store: Arc<dyn ResponseStore>,
        groups: Arc<dyn GroupRepository>,
        locks: EventLocks,
        notifier: NotificationDispatcher,
        base_url: String,
        max_attendee_count: i32,
        lock_wait_timeout: Duration,
    ) -> Self {
        Self { events, store, groups, locks, notifier, base_url, max_attendee_count, lock_wait_timeout }
    }

    pub async fn create(&self, params: NewEventParams) -> Result<Event, AppError> {
        validate_event_fields(&params.name, params.capacity)?;

        let created = self.events.create(&Event::new(params)).await?;
        info!("Event created: {} ({})", created.id, created.name);

        if let Some(group_id) = created.group_id.as_deref() {
            // Members are looked up after the insert; a failure here only costs the announcement.
            match self.groups.list_members(group_id).await {
                Ok(members) => {
                    let recipients = members.iter().map(Recipient::from).collect();
                    self.notifier.dispatch(Notification::new_event(
                        &created.id,
                        &created.name,
                        &created.location,
                        &self.base_url,
                        recipients,
                    ));
                }
                Err(e) => warn!("Could not load members of group {} for announcement: {}", group_id, e),
            }
        }

        Ok(created)
    }

    pub async fn get(&self, event_id: &str) -> Result<EventWithAttendance, AppError> {
        self.events.find_by_id(event_id).await?
            .ok_or(AppError::NotFound("Event not found".into()))
    }

    pub async fn get_detailed(&self, event_id: &str, user_id: &str) -> Result<EventDetailed, AppError> {
        let event = self.get(event_id).await?;
        ensure_access(self.groups.as_ref(), event.event.group_id.as_deref(), user_id).await?;

        let responses = self.events.list_responses(event_id).await?;
        let user_response = responses.iter().find(|r| r.user_id == user_id).cloned();

        Ok(EventDetailed {
            event,
            responses,
            user_response,
            max_attendee_count: self.max_attendee_count,
        })
    }

    /// Upcoming events the user is allowed to see, soonest first.
    pub async fn list_current(&self, user_id: &str) -> Result<Vec<EventWithAttendance>, AppError> {
        let upcoming = self.events.list_upcoming(Utc::now()).await?;

        let mut visible = Vec::with_capacity(upcoming.len());
        for event in upcoming {
            if can_access(self.groups.as_ref(), event.event.group_id.as_deref(), user_id).await? {
                visible.push(event);
            }
        }
        Ok(visible)
    }

    /// Edits an event. Capacity may not drop below the seats already taken;
    /// existing responses are never re-evaluated. The check and the write share
    /// the admission transaction's lock on the event.
    pub async fn update(&self, params: UpdateEventParams) -> Result<Event, AppError> {
        validate_event_fields(&params.name, params.capacity)?;

        let _lock = self.locks.acquire(&params.id, self.lock_wait_timeout).await?;
        let mut tx = self.store.begin().await?;

        let current = tx.get_event(&params.id).await?
            .ok_or(AppError::NotFound("Event not found".into()))?;
        if i64::from(params.capacity) < current.total_attendee_count {
            return Err(AppError::Conflict(format!(
                "capacity {} is below the {} seats already taken",
                params.capacity, current.total_attendee_count
            )));
        }

        let mut event = current.event;
        event.name = params.name;
        event.capacity = params.capacity;
        event.start = params.start;
        event.location = params.location;

        let updated = tx.update_event(&event).await?;
        tx.commit().await?;

        info!("Event updated: {}", updated.id);
        Ok(updated)
    }

    pub async fn delete(&self, event_id: &str) -> Result<(), AppError> {
        self.events.soft_delete(event_id).await?;
        info!("Event deleted: {}", event_id);
        Ok(())
    }
}

fn validate_event_fields(name: &str, capacity: i32) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Event name is required".into()));
    }
    if capacity < 0 {
        return Err(AppError::Validation("Capacity cannot be negative".into()));
    }
    Ok(())
}
