use async_trait::async_trait;
use chrono::{Duration, Utc};
use rsvp_backend::{
    config::Config,
    domain::models::{event::{Event, NewEventParams}, user::User},
    domain::ports::EmailService,
    error::AppError,
    infra::factory::{connect_postgres, postgres_repositories, run_postgres_migrations},
    state::AppState,
};
use std::sync::Arc;
use tokio::task::JoinSet;

struct NoopEmail;

#[async_trait]
impl EmailService for NoopEmail {
    async fn send(&self, _recipient: &str, _subject: &str, _body: &str) -> Result<(), AppError> {
        Ok(())
    }
}

async fn instance(db_url: &str) -> Arc<AppState> {
    let pool = connect_postgres(db_url).await.expect("Failed to connect to DB");
    run_postgres_migrations(&pool).await.expect("Failed to migrate DB");

    let config = Config {
        database_url: db_url.to_string(),
        mail_service_url: "http://localhost".to_string(),
        mail_service_token: "token".to_string(),
        max_attendee_count: 2,
        lock_wait_timeout: std::time::Duration::from_secs(10),
        base_url: "http://localhost:3000/event/".to_string(),
    };
    let (state, _rx) = AppState::assemble(config, postgres_repositories(pool), Arc::new(NoopEmail));
    Arc::new(state)
}

/// Two service instances share one database but no in-process locks, so only
/// the row lock on the event keeps them from overbooking.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_row_lock_serializes_across_instances() {
    let db_url = match std::env::var("DATABASE_URL") {
        Ok(url) if url.starts_with("postgres") => url,
        _ => {
            println!("Skipping concurrency test (not targeting Postgres)");
            return;
        }
    };

    let first = instance(&db_url).await;
    let second = instance(&db_url).await;

    let capacity = 7;
    let event = first.event_repo.create(&Event::new(NewEventParams {
        name: "Cross-instance Game".to_string(),
        group_id: None,
        capacity,
        start: Utc::now() + Duration::days(1),
        location: "Court 1".to_string(),
        creator_id: "organizer".to_string(),
    })).await.unwrap();

    let mut user_ids = Vec::new();
    for i in 0..30 {
        let user = first.user_repo.create(&User::new(format!("Racer {}", i), None)).await.unwrap();
        user_ids.push(user.id);
    }

    let mut set = JoinSet::new();
    for (i, user_id) in user_ids.into_iter().enumerate() {
        let state = if i % 2 == 0 { first.clone() } else { second.clone() };
        let event_id = event.id.clone();
        set.spawn(async move {
            state.rsvp_service.handle_response(&event_id, &user_id, 1).await
        });
    }

    while let Some(res) = set.join_next().await {
        res.unwrap().unwrap();
    }

    let responses = first.event_repo.list_responses(&event.id).await.unwrap();
    let seated = responses.iter().filter(|r| !r.on_waitlist).count();
    assert_eq!(seated, capacity as usize);
    assert_eq!(responses.len(), 30);
}
