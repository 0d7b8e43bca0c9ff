mod common;

use common::TestApp;
use rsvp_backend::domain::models::response::ResponseStatus;
use rsvp_backend::domain::services::event_service::UpdateEventParams;
use rsvp_backend::error::AppError;

#[tokio::test]
async fn test_leaving_full_event_promotes_oldest_waitlisted() {
    let app = TestApp::new().await;
    let a = app.create_user("Alice").await;
    let b = app.create_user("Bob").await;
    let c = app.create_user("Carol").await;
    let event = app.create_event(2).await;

    app.state.rsvp_service.handle_response(&event.id, &a.id, 1).await.unwrap();
    app.state.rsvp_service.handle_response(&event.id, &b.id, 1).await.unwrap();

    let waitlisted = app.state.rsvp_service.handle_response(&event.id, &c.id, 1).await.unwrap();
    assert_eq!(waitlisted.status, ResponseStatus::Waitlisted);

    let outcome = app.state.rsvp_service.handle_response(&event.id, &a.id, 0).await.unwrap();
    assert_eq!(outcome.status, ResponseStatus::Removed);
    assert_eq!(outcome.promoted_user_ids, vec![c.id.clone()]);

    let responses = app.state.event_repo.list_responses(&event.id).await.unwrap();
    assert_eq!(responses.len(), 2);
    assert!(responses.iter().all(|r| !r.on_waitlist));
    assert!(responses.iter().any(|r| r.user_id == b.id));
    assert!(responses.iter().any(|r| r.user_id == c.id));
    assert_eq!(app.seated_total(&event.id).await, 2);
}

#[tokio::test]
async fn test_plus_one_while_waitlisted_is_rejected() {
    let app = TestApp::new().await;
    let a = app.create_user("Alice").await;
    let b = app.create_user("Bob").await;
    let event = app.create_event(2).await;

    app.state.rsvp_service.handle_response(&event.id, &a.id, 2).await.unwrap();
    let outcome = app.state.rsvp_service.handle_response(&event.id, &b.id, 1).await.unwrap();
    assert_eq!(outcome.status, ResponseStatus::Waitlisted);

    let err = app.state.rsvp_service.handle_response(&event.id, &b.id, 2).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(ref m) if m == "no plus ones when adding to waitlist"));

    let responses = app.state.event_repo.list_responses(&event.id).await.unwrap();
    let b_row = responses.iter().find(|r| r.user_id == b.id).unwrap();
    assert_eq!(b_row.attendee_count, 1);
    assert!(b_row.on_waitlist);
}

#[tokio::test]
async fn test_freed_plus_one_promotes_in_fifo_order() {
    let app = TestApp::new().await;
    let a = app.create_user("Alice").await;
    let b = app.create_user("Bob").await;
    let waiting = app.create_users("Waiting", 3).await;
    let event = app.create_event(3).await;

    app.state.rsvp_service.handle_response(&event.id, &a.id, 2).await.unwrap();
    app.state.rsvp_service.handle_response(&event.id, &b.id, 1).await.unwrap();
    for user in &waiting {
        let outcome = app.state.rsvp_service.handle_response(&event.id, &user.id, 1).await.unwrap();
        assert_eq!(outcome.status, ResponseStatus::Waitlisted);
    }

    let outcome = app.state.rsvp_service.handle_response(&event.id, &a.id, 0).await.unwrap();
    assert_eq!(outcome.promoted_user_ids, vec![waiting[0].id.clone(), waiting[1].id.clone()]);

    let responses = app.state.event_repo.list_responses(&event.id).await.unwrap();
    let still_waiting: Vec<_> = responses.iter().filter(|r| r.on_waitlist).map(|r| r.user_id.clone()).collect();
    assert_eq!(still_waiting, vec![waiting[2].id.clone()]);
    assert_eq!(app.seated_total(&event.id).await, 3);
}

#[tokio::test]
async fn test_dropping_plus_one_promotes_one() {
    let app = TestApp::new().await;
    let a = app.create_user("Alice").await;
    let waiting = app.create_users("Waiting", 2).await;
    let event = app.create_event(2).await;

    app.state.rsvp_service.handle_response(&event.id, &a.id, 2).await.unwrap();
    for user in &waiting {
        app.state.rsvp_service.handle_response(&event.id, &user.id, 1).await.unwrap();
    }

    let outcome = app.state.rsvp_service.handle_response(&event.id, &a.id, 1).await.unwrap();
    assert_eq!(outcome.status, ResponseStatus::Seated);
    assert_eq!(outcome.promoted_user_ids, vec![waiting[0].id.clone()]);
    assert_eq!(app.seated_total(&event.id).await, 2);
}

#[tokio::test]
async fn test_waitlisted_user_leaving_promotes_nobody() {
    let app = TestApp::new().await;
    let a = app.create_user("Alice").await;
    let b = app.create_user("Bob").await;
    let c = app.create_user("Carol").await;
    let event = app.create_event(1).await;

    app.state.rsvp_service.handle_response(&event.id, &a.id, 1).await.unwrap();
    app.state.rsvp_service.handle_response(&event.id, &b.id, 1).await.unwrap();
    app.state.rsvp_service.handle_response(&event.id, &c.id, 1).await.unwrap();

    let outcome = app.state.rsvp_service.handle_response(&event.id, &b.id, 0).await.unwrap();
    assert!(outcome.promoted_user_ids.is_empty());

    let responses = app.state.event_repo.list_responses(&event.id).await.unwrap();
    let c_row = responses.iter().find(|r| r.user_id == c.id).unwrap();
    assert!(c_row.on_waitlist);
    assert_eq!(app.seated_total(&event.id).await, 1);
}

#[tokio::test]
async fn test_no_promotion_when_event_was_not_full() {
    let app = TestApp::new().await;
    let a = app.create_user("Alice").await;
    let b = app.create_user("Bob").await;
    let event = app.create_event(1).await;

    app.state.rsvp_service.handle_response(&event.id, &a.id, 1).await.unwrap();
    app.state.rsvp_service.handle_response(&event.id, &b.id, 1).await.unwrap();

    // Raising capacity leaves the waitlist untouched.
    app.state.event_service.update(UpdateEventParams {
        id: event.id.clone(),
        name: event.name.clone(),
        capacity: 2,
        start: event.start,
        location: event.location.clone(),
    }).await.unwrap();

    let outcome = app.state.rsvp_service.handle_response(&event.id, &a.id, 0).await.unwrap();
    assert!(outcome.promoted_user_ids.is_empty());

    let responses = app.state.event_repo.list_responses(&event.id).await.unwrap();
    assert_eq!(responses.len(), 1);
    assert!(responses[0].on_waitlist);
}

#[tokio::test]
async fn test_waitlisted_user_restating_takes_free_seat() {
    let app = TestApp::new().await;
    let a = app.create_user("Alice").await;
    let b = app.create_user("Bob").await;
    let event = app.create_event(1).await;

    app.state.rsvp_service.handle_response(&event.id, &a.id, 1).await.unwrap();
    app.state.rsvp_service.handle_response(&event.id, &b.id, 1).await.unwrap();

    app.state.event_service.update(UpdateEventParams {
        id: event.id.clone(),
        name: event.name.clone(),
        capacity: 2,
        start: event.start,
        location: event.location.clone(),
    }).await.unwrap();

    let outcome = app.state.rsvp_service.handle_response(&event.id, &b.id, 1).await.unwrap();
    assert_eq!(outcome.status, ResponseStatus::Seated);
    assert_eq!(app.seated_total(&event.id).await, 2);
}

#[tokio::test]
async fn test_promoted_users_are_emailed() {
    let app = TestApp::new().await;
    let a = app.create_user("Alice").await;
    let b = app.create_user("Bob").await;
    let event = app.create_event(1).await;

    app.state.rsvp_service.handle_response(&event.id, &a.id, 1).await.unwrap();
    app.state.rsvp_service.handle_response(&event.id, &b.id, 1).await.unwrap();
    assert!(app.sent_emails().is_empty());

    app.state.rsvp_service.handle_response(&event.id, &a.id, 0).await.unwrap();

    let sent = app.wait_for_emails(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "bob@example.com");
    assert_eq!(sent[0].subject, format!("You're going to {}!", event.name));
    assert!(sent[0].body.starts_with("Hi Bob!"));
}

#[tokio::test]
async fn test_failed_delivery_does_not_undo_promotion() {
    let app = TestApp::new().await;
    let a = app.create_user("Alice").await;
    let b = app.create_user("Bob").await;
    let c = app.create_user("Carol").await;
    let event = app.create_event(2).await;
    app.email.failing.lock().unwrap().insert("bob@example.com".to_string());

    app.state.rsvp_service.handle_response(&event.id, &a.id, 2).await.unwrap();
    app.state.rsvp_service.handle_response(&event.id, &b.id, 1).await.unwrap();
    app.state.rsvp_service.handle_response(&event.id, &c.id, 1).await.unwrap();

    let outcome = app.state.rsvp_service.handle_response(&event.id, &a.id, 0).await.unwrap();
    assert_eq!(outcome.promoted_user_ids.len(), 2);

    let sent = app.wait_for_emails(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "carol@example.com");

    let responses = app.state.event_repo.list_responses(&event.id).await.unwrap();
    assert!(responses.iter().all(|r| !r.on_waitlist));
}

#[tokio::test]
async fn test_equal_timestamps_promote_in_insertion_order() {
    let app = TestApp::new().await;
    let a = app.create_user("Alice").await;
    let waiting = app.create_users("Waiting", 4).await;
    let event = app.create_event(2).await;

    app.state.rsvp_service.handle_response(&event.id, &a.id, 2).await.unwrap();
    for user in &waiting {
        app.state.rsvp_service.handle_response(&event.id, &user.id, 1).await.unwrap();
    }

    // Collapse the waitlist onto one timestamp so only the insertion sequence
    // can order it.
    sqlx::query("UPDATE event_responses SET created_at = ? WHERE event_id = ? AND on_waitlist = TRUE")
        .bind(chrono::Utc::now())
        .bind(&event.id)
        .execute(&app.pool)
        .await
        .unwrap();

    let outcome = app.state.rsvp_service.handle_response(&event.id, &a.id, 1).await.unwrap();
    assert_eq!(outcome.promoted_user_ids, vec![waiting[0].id.clone()]);

    let outcome = app.state.rsvp_service.handle_response(&event.id, &a.id, 0).await.unwrap();
    assert_eq!(outcome.promoted_user_ids, vec![waiting[1].id.clone()]);

    let responses = app.state.event_repo.list_responses(&event.id).await.unwrap();
    let still_waiting: Vec<_> = responses.iter().filter(|r| r.on_waitlist).map(|r| r.user_id.clone()).collect();
    assert_eq!(still_waiting, vec![waiting[2].id.clone(), waiting[3].id.clone()]);
}
