use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, info_span, Instrument};

use crate::domain::models::notification::{Notification, Recipient};
use crate::domain::models::response::{EventResponse, ResponseOutcome, ResponseStatus};
use crate::domain::ports::ResponseStore;
use crate::domain::services::access::forbidden;
use crate::domain::services::admission::{decide, validate_attendee_count, AdmissionAction};
use crate::domain::services::event_locks::EventLocks;
use crate::domain::services::notification_service::NotificationDispatcher;
use crate::error::AppError;

/// Seats and waitlists RSVPs. All decisions for one event run one at a time
/// inside a single store transaction.
pub struct RsvpService {
    store: Arc<dyn ResponseStore>,
    locks: EventLocks,
    notifier: NotificationDispatcher,
    max_attendee_count: i32,
    lock_wait_timeout: Duration,
}

impl RsvpService {
    pub fn new(
        store: Arc<dyn ResponseStore>,
        locks: EventLocks,
        notifier: NotificationDispatcher,
        max_attendee_count: i32,
        lock_wait_timeout: Duration,
    ) -> Self {
        Self {
            store,
            locks,
            notifier,
            max_attendee_count,
            lock_wait_timeout,
        }
    }

    pub async fn handle_response(&self, event_id: &str, user_id: &str, requested: i32) -> Result<ResponseOutcome, AppError> {
        let span = info_span!("handle_response", event_id = %event_id, user_id = %user_id, requested);
        let result = self.admit(event_id, user_id, requested).instrument(span).await;
        if let Err(e) = &result {
            e.log();
        }
        result
    }

    async fn admit(&self, event_id: &str, user_id: &str, requested: i32) -> Result<ResponseOutcome, AppError> {
        validate_attendee_count(requested, self.max_attendee_count)?;

        let (outcome, event_name, off_waitlist) = {
            let _lock = self.locks.acquire(event_id, self.lock_wait_timeout).await?;
            let mut tx = self.store.begin().await?;

            let event = tx.get_event(event_id).await?
                .ok_or(AppError::NotFound("Event not found".into()))?;

            if let Some(group_id) = event.event.group_id.as_deref()
                && !tx.has_group_member(group_id, user_id).await? {
                return Err(forbidden());
            }

            if event.event.is_past() {
                return Err(AppError::EventPast);
            }

            let existing = tx.get_response(event_id, user_id).await?;
            let spots_left = event.spots_left();
            let decision = decide(spots_left, existing.as_ref(), requested)?;

            debug!(
                "spots left:{} delta:{} was_waitlisted:{}",
                spots_left,
                decision.delta,
                existing.as_ref().is_some_and(|r| r.on_waitlist)
            );

            let (status, attendee_count) = match decision.action {
                AdmissionAction::Remove => {
                    tx.delete_response(event_id, user_id).await?;
                    (ResponseStatus::Removed, 0)
                }
                AdmissionAction::Upsert { attendee_count, on_waitlist } => {
                    let response = EventResponse::new(event_id.to_string(), user_id.to_string(), attendee_count, on_waitlist);
                    let stored = tx.upsert_response(&response).await?;
                    let status = if stored.on_waitlist { ResponseStatus::Waitlisted } else { ResponseStatus::Seated };
                    (status, stored.attendee_count)
                }
            };

            let off_waitlist = if decision.promote > 0 {
                let waitlist = tx.list_waitlist(event_id, decision.promote).await?;
                tx.promote_waitlist(&waitlist).await?;
                waitlist
            } else {
                Vec::new()
            };

            tx.commit().await?;

            let outcome = ResponseOutcome {
                status,
                attendee_count,
                promoted_user_ids: off_waitlist.iter().map(|w| w.user_id.clone()).collect(),
            };
            info!(
                status = ?outcome.status,
                promoted = outcome.promoted_user_ids.len(),
                "RSVP recorded for event {}",
                event.event.name
            );
            (outcome, event.event.name, off_waitlist)
        };

        if !off_waitlist.is_empty() {
            let recipients = off_waitlist.iter().map(Recipient::from).collect();
            self.notifier.dispatch(Notification::off_waitlist(event_id, &event_name, recipients));
        }

        Ok(outcome)
    }
}
