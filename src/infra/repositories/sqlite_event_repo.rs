use crate::domain::{
    models::{event::{Event, EventWithAttendance}, response::EventResponseDetail},
    ports::EventRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub(crate) const SELECT_EVENT_WITH_ATTENDANCE: &str = r#"
    SELECT e.id, e.name, e.group_id, e.capacity, e.start, e.location, e.creator_id, e.is_deleted, e.created_at,
        COALESCE((
            SELECT SUM(r.attendee_count) FROM event_responses AS r
            WHERE r.event_id = e.id AND r.on_waitlist = FALSE
        ), 0) AS total_attendee_count
    FROM events AS e
"#;

pub struct SqliteEventRepo {
    pool: SqlitePool,
}

impl SqliteEventRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepo {
    async fn create(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            "INSERT INTO events (id, name, group_id, capacity, start, location, creator_id, is_deleted, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&event.id)
            .bind(&event.name)
            .bind(&event.group_id)
            .bind(event.capacity)
            .bind(event.start)
            .bind(&event.location)
            .bind(&event.creator_id)
            .bind(event.is_deleted)
            .bind(event.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<EventWithAttendance>, AppError> {
        sqlx::query_as::<_, EventWithAttendance>(
            &format!("{SELECT_EVENT_WITH_ATTENDANCE} WHERE e.id = ? AND e.is_deleted = FALSE")
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_upcoming(&self, now: DateTime<Utc>) -> Result<Vec<EventWithAttendance>, AppError> {
        sqlx::query_as::<_, EventWithAttendance>(
            &format!("{SELECT_EVENT_WITH_ATTENDANCE} WHERE e.is_deleted = FALSE AND e.start >= ? ORDER BY e.start ASC")
        )
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn soft_delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE events SET is_deleted = TRUE WHERE id = ? AND is_deleted = FALSE")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound("Event not found".into())); }
        Ok(())
    }

    async fn list_responses(&self, event_id: &str) -> Result<Vec<EventResponseDetail>, AppError> {
        sqlx::query_as::<_, EventResponseDetail>(
            "SELECT r.event_id, r.user_id, r.attendee_count, r.on_waitlist, r.created_at, u.full_name AS user_full_name
             FROM event_responses AS r
             LEFT JOIN users AS u ON u.id = r.user_id
             WHERE r.event_id = ?
             ORDER BY r.created_at ASC, r.seq ASC"
        )
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
