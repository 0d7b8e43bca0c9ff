use crate::domain::models::response::EventResponse;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionAction {
    /// Drop the caller's row; "no response" is the absence of a row.
    Remove,
    Upsert { attendee_count: i32, on_waitlist: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionDecision {
    pub action: AdmissionAction,
    /// Requested count minus the caller's previous count, whatever its status.
    pub delta: i32,
    /// How many waitlisted rows to seat after applying `action`.
    pub promote: i64,
}

pub fn validate_attendee_count(requested: i32, max_attendee_count: i32) -> Result<(), AppError> {
    if requested < 0 {
        return Err(AppError::Validation("cannot have less than 0 attendees".into()));
    }
    if requested > max_attendee_count {
        return Err(AppError::Validation(format!(
            "maximum of {} plus one(s) allowed",
            max_attendee_count - 1
        )));
    }
    Ok(())
}

/// Decides where a response lands given the event's free seats before the
/// change and the caller's current row.
///
/// Seats are compared against what the caller actually holds, so a waitlisted
/// caller restating their answer competes for a seat like a newcomer. Promotion
/// only happens when a previously seated caller gives seats back to an event
/// that had none left.
pub fn decide(
    spots_left: i64,
    existing: Option<&EventResponse>,
    requested: i32,
) -> Result<AdmissionDecision, AppError> {
    let existing_count = existing.map_or(0, |r| r.attendee_count);
    let delta = requested - existing_count;

    let action = if requested == 0 {
        AdmissionAction::Remove
    } else {
        let seat_delta = requested - existing.map_or(0, EventResponse::seats_held);
        let on_waitlist = spots_left - i64::from(seat_delta) < 0;
        if on_waitlist && requested > 1 {
            return Err(AppError::Validation("no plus ones when adding to waitlist".into()));
        }
        AdmissionAction::Upsert { attendee_count: requested, on_waitlist }
    };

    let was_seated = existing.is_none_or(|r| !r.on_waitlist);
    let promote = if spots_left == 0 && delta < 0 && was_seated {
        i64::from(-delta)
    } else {
        0
    };

    Ok(AdmissionDecision { action, delta, promote })
}
