use crate::domain::{
    models::{event::{Event, EventWithAttendance}, response::{EventResponse, WaitlistEntry}},
    ports::{ResponseStore, ResponseTransaction},
};
use crate::error::AppError;
use crate::infra::repositories::postgres_event_repo::SELECT_EVENT_WITH_ATTENDANCE;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};

pub struct PostgresResponseStore {
    pool: PgPool,
}

impl PostgresResponseStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResponseStore for PostgresResponseStore {
    async fn begin(&self) -> Result<Box<dyn ResponseTransaction>, AppError> {
        let tx = self.pool.begin().await.map_err(AppError::Database)?;
        Ok(Box::new(PostgresResponseTx { tx }))
    }
}

pub struct PostgresResponseTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ResponseTransaction for PostgresResponseTx {
    async fn get_event(&mut self, event_id: &str) -> Result<Option<EventWithAttendance>, AppError> {
        // Row lock on the event serialises admissions across processes too.
        let locked = sqlx::query("SELECT id FROM events WHERE id = $1 AND is_deleted = FALSE FOR UPDATE")
            .bind(event_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(AppError::Database)?;
        if locked.is_none() {
            return Ok(None);
        }

        sqlx::query_as::<_, EventWithAttendance>(
            &format!("{SELECT_EVENT_WITH_ATTENDANCE} WHERE e.id = $1")
        )
            .bind(event_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(AppError::Database)
    }

    async fn has_group_member(&mut self, group_id: &str, user_id: &str) -> Result<bool, AppError> {
        let found = sqlx::query("SELECT 1 FROM group_members WHERE group_id = $1 AND user_id = $2")
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
             FROM event_responses WHERE event_id = $1 AND user_id = $2"
        )
            .bind(event_id)
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(AppError::Database)
    }

    async fn upsert_response(&mut self, response: &EventResponse) -> Result<EventResponse, AppError> {
        sqlx::query_as::<_, EventResponse>(
            "INSERT INTO event_responses (event_id, user_id, attendee_count, on_waitlist, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (event_id, user_id) DO UPDATE SET
                attendee_count = EXCLUDED.attendee_count,
                on_waitlist = EXCLUDED.on_waitlist,
                updated_at = EXCLUDED.updated_at
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
            "UPDATE events SET name = $1, capacity = $2, start = $3, location = $4
             WHERE id = $5 AND is_deleted = FALSE
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
        sqlx::query("DELETE FROM event_responses WHERE event_id = $1 AND user_id = $2")
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
             WHERE r.event_id = $1 AND r.on_waitlist = TRUE
             ORDER BY r.created_at ASC, r.seq ASC
             LIMIT $2"
        )
            .bind(event_id)
            .bind(limit)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(AppError::Database)
    }

    async fn promote_waitlist(&mut self, entries: &[WaitlistEntry]) -> Result<(), AppError> {
        if entries.is_empty() {
            return Ok(());
        }
        let user_ids: Vec<String> = entries.iter().map(|e| e.user_id.clone()).collect();
        sqlx::query(
            "UPDATE event_responses SET on_waitlist = FALSE, updated_at = $1
             WHERE event_id = $2 AND user_id = ANY($3)"
        )
            .bind(Utc::now())
            .bind(&entries[0].event_id)
            .bind(&user_ids)
            .execute(&mut *self.tx)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await.map_err(AppError::Database)
    }
}
