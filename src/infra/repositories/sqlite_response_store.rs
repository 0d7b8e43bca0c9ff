use crate::domain::{
    models::{event::{Event, EventWithAttendance}, response::{EventResponse, WaitlistEntry}},
    ports::{ResponseStore, ResponseTransaction},
};
use crate::error::AppError;
use crate::infra::repositories::sqlite_event_repo::SELECT_EVENT_WITH_ATTENDANCE;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};

pub struct SqliteResponseStore {
    pool: SqlitePool,
}

impl SqliteResponseStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResponseStore for SqliteResponseStore {
    async fn begin(&self) -> Result<Box<dyn ResponseTransaction>, AppError> {
        let tx = self.pool.begin().await.map_err(AppError::Database)?;
        Ok(Box::new(SqliteResponseTx { tx }))
    }
}

pub struct SqliteResponseTx {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl ResponseTransaction for SqliteResponseTx {
    async fn get_event(&mut self, event_id: &str) -> Result<Option<EventWithAttendance>, AppError> {
        // A no-op write first, so the transaction owns the database write lock
        // before it reads anything it will later act on.
        sqlx::query("UPDATE events SET is_deleted = is_deleted WHERE id = ?")
            .bind(event_id)
            .execute(&mut *self.tx)
            .await
            .map_err(AppError::Database)?;

        sqlx::query_as::<_, EventWithAttendance>(
            &format!("{SELECT_EVENT_WITH_ATTENDANCE} WHERE e.id = ? AND e.is_deleted = FALSE")
        )
            .bind(event_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(AppError::Database)
    }

    async fn has_group_member(&mut self, group_id: &str, user_id: &str) -> Result<bool, AppError> {
        let found = sqlx::query("SELECT 1 FROM group_members WHERE group_id = ? AND user_id = ?")
            .bind(group_id)
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(AppError::Database)?;
        Ok(found.is_some())
    }

    async fn get_response(&mut self, event_id: &str, user_id: &str) -> Result<Option<EventResponse>, AppError> {
        sqlx::query_as::<_, EventResponse>(
            "SELECT event_id, user_id, attendee_count, on_waitlist, seq, created_at, updated_at
             FROM event_responses WHERE event_id = ? AND user_id = ?"
        )
            .bind(event_id)
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(AppError::Database)
    }

    async fn upsert_response(&mut self, response: &EventResponse) -> Result<EventResponse, AppError> {
        sqlx::query_as::<_, EventResponse>(
            "INSERT INTO event_responses (event_id, user_id, attendee_count, on_waitlist, seq, created_at, updated_at)
             VALUES (?, ?, ?, ?, (SELECT COALESCE(MAX(seq), 0) + 1 FROM event_responses), ?, ?)
             ON CONFLICT (event_id, user_id) DO UPDATE SET
                attendee_count = excluded.attendee_count,
                on_waitlist = excluded.on_waitlist,
                updated_at = excluded.updated_at
             RETURNING event_id, user_id, attendee_count, on_waitlist, seq, created_at, updated_at"
        )
            .bind(&response.event_id)
            .bind(&response.user_id)
            .bind(response.attendee_count)
            .bind(response.on_waitlist)
            .bind(response.created_at)
            .bind(response.updated_at)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(AppError::Database)
    }

    async fn update_event(&mut self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            "UPDATE events SET name = ?, capacity = ?, start = ?, location = ?
             WHERE id = ? AND is_deleted = FALSE
             RETURNING *"
        )
            .bind(&event.name)
            .bind(event.capacity)
            .bind(event.start)
            .bind(&event.location)
            .bind(&event.id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Event not found".into()))
    }

    async fn delete_response(&mut self, event_id: &str, user_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM event_responses WHERE event_id = ? AND user_id = ?")
            .bind(event_id)
            .bind(user_id)
            .execute(&mut *self.tx)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn list_waitlist(&mut self, event_id: &str, limit: i64) -> Result<Vec<WaitlistEntry>, AppError> {
        sqlx::query_as::<_, WaitlistEntry>(
            "SELECT r.event_id, r.user_id, r.seq, r.created_at, u.full_name AS user_full_name, u.email AS user_email
             FROM event_responses AS r
             LEFT JOIN users AS u ON u.id = r.user_id
             WHERE r.event_id = ? AND r.on_waitlist = TRUE
             ORDER BY r.created_at ASC, r.seq ASC
             LIMIT ?"
        )
            .bind(event_id)
            .bind(limit)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(AppError::Database)
    }

    async fn promote_waitlist(&mut self, entries: &[WaitlistEntry]) -> Result<(), AppError> {
        let now = Utc::now();
        for entry in entries {
            sqlx::query("UPDATE event_responses SET on_waitlist = FALSE, updated_at = ? WHERE event_id = ? AND user_id = ?")
                .bind(now)
                .bind(&entry.event_id)
                .bind(&entry.user_id)
                .execute(&mut *self.tx)
                .await
                .map_err(AppError::Database)?;
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await.map_err(AppError::Database)
    }
}
