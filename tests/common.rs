#![allow(dead_code)]

use rsvp_backend::{
    background::start_notification_worker,
    config::Config,
    domain::models::{event::{Event, NewEventParams}, user::User},
    domain::ports::EmailService,
    domain::services::notification_service::NotificationService,
    error::AppError,
    infra::factory::{connect_sqlite, run_sqlite_migrations, sqlite_repositories},
    state::AppState,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{Pool, Sqlite};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Records every delivery; addresses in `failing` are rejected.
#[derive(Default)]
pub struct MockEmailService {
    pub sent: Mutex<Vec<SentEmail>>,
    pub failing: Mutex<HashSet<String>>,
}

#[async_trait]
impl EmailService for MockEmailService {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), AppError> {
        if self.failing.lock().unwrap().contains(recipient) {
            return Err(AppError::Notification(format!("mailbox {} unavailable", recipient)));
        }
        self.sent.lock().unwrap().push(SentEmail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

pub struct TestApp {
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub email: Arc<MockEmailService>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_max_attendees(2).await
    }

    pub async fn with_max_attendees(max_attendee_count: i32) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let pool = connect_sqlite(&db_url)
            .await
            .expect("Failed to connect to test db");

        run_sqlite_migrations(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url,
            mail_service_url: "http://localhost".to_string(),
            mail_service_token: "token".to_string(),
            max_attendee_count,
            lock_wait_timeout: std::time::Duration::from_secs(10),
            base_url: "http://localhost:3000/event/".to_string(),
        };

        let email = Arc::new(MockEmailService::default());
        let (state, rx) = AppState::assemble(config, sqlite_repositories(pool.clone()), email.clone());
        let state = Arc::new(state);

        // Start Notification Worker
        let notification_service = NotificationService::new(email.clone());
        tokio::spawn(async move {
            start_notification_worker(rx, notification_service).await;
        });

        Self {
            pool,
            db_filename,
            state,
            email,
        }
    }

    /// Another service instance on the same database file, with its own pool
    /// and its own in-process event locks.
    pub async fn second_instance(&self) -> Arc<AppState> {
        let pool = connect_sqlite(&self.state.config.database_url)
            .await
            .expect("Failed to connect second instance");
        let email = Arc::new(MockEmailService::default());
        let (state, _rx) = AppState::assemble(self.state.config.clone(), sqlite_repositories(pool), email);
        Arc::new(state)
    }

    pub async fn create_user(&self, name: &str) -> User {
        let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
        self.state.user_repo
            .create(&User::new(name.to_string(), Some(email)))
            .await
            .expect("Failed to create user")
    }

    pub async fn create_users(&self, prefix: &str, count: usize) -> Vec<User> {
        let mut users = Vec::with_capacity(count);
        for i in 0..count {
            users.push(self.create_user(&format!("{} {}", prefix, i)).await);
        }
        users
    }

    /// Inserts through the repository so tests can place events in the past.
    pub async fn create_event_at(&self, capacity: i32, group_id: Option<&str>, start: DateTime<Utc>) -> Event {
        let event = Event::new(NewEventParams {
            name: format!("Game {}", &Uuid::new_v4().to_string()[..8]),
            group_id: group_id.map(str::to_string),
            capacity,
            start,
            location: "Court 3".to_string(),
            creator_id: "organizer".to_string(),
        });
        self.state.event_repo.create(&event).await.expect("Failed to create event")
    }

    pub async fn create_event(&self, capacity: i32) -> Event {
        self.create_event_at(capacity, None, Utc::now() + Duration::days(3)).await
    }

    pub async fn seated_total(&self, event_id: &str) -> i64 {
        self.state.event_service.get(event_id).await.expect("event").total_attendee_count
    }

    /// Waits for the notification worker to deliver at least `count` emails.
    pub async fn wait_for_emails(&self, count: usize) -> Vec<SentEmail> {
        for _ in 0..100 {
            {
                let sent = self.email.sent.lock().unwrap();
                if sent.len() >= count {
                    return sent.clone();
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        self.email.sent.lock().unwrap().clone()
    }

    pub fn sent_emails(&self) -> Vec<SentEmail> {
        self.email.sent.lock().unwrap().clone()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
