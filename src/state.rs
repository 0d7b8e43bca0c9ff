use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use crate::domain::models::notification::Notification;
use crate::domain::ports::{
    EventRepository, UserRepository, GroupRepository, ResponseStore, EmailService,
};
use crate::domain::services::event_locks::EventLocks;
use crate::domain::services::event_service::EventService;
use crate::domain::services::notification_service::NotificationDispatcher;
use crate::domain::services::rsvp_service::RsvpService;
use crate::config::Config;

/// Backend-specific storage handles, built by the factory or by tests.
pub struct Repositories {
    pub event_repo: Arc<dyn EventRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub group_repo: Arc<dyn GroupRepository>,
    pub response_store: Arc<dyn ResponseStore>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub event_repo: Arc<dyn EventRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub group_repo: Arc<dyn GroupRepository>,
    pub response_store: Arc<dyn ResponseStore>,
    pub email_service: Arc<dyn EmailService>,
    pub rsvp_service: Arc<RsvpService>,
    pub event_service: Arc<EventService>,
    pub notifier: NotificationDispatcher,
}

impl AppState {
    /// Wires the services together. The returned receiver feeds the
    /// notification worker.
    pub fn assemble(
        config: Config,
        repos: Repositories,
        email_service: Arc<dyn EmailService>,
    ) -> (Self, UnboundedReceiver<Notification>) {
        let (notifier, rx) = NotificationDispatcher::channel();
        let locks = EventLocks::new();

        let rsvp_service = Arc::new(RsvpService::new(
            repos.response_store.clone(),
            locks.clone(),
            notifier.clone(),
            config.max_attendee_count,
            config.lock_wait_timeout,
        ));

        let event_service = Arc::new(EventService::new(
            repos.event_repo.clone(),
            repos.response_store.clone(),
            repos.group_repo.clone(),
            locks,
            notifier.clone(),
            config.base_url.clone(),
            config.max_attendee_count,
            config.lock_wait_timeout,
        ));

        let state = Self {
            config,
            event_repo: repos.event_repo,
            user_repo: repos.user_repo,
            group_repo: repos.group_repo,
            response_store: repos.response_store,
            email_service,
            rsvp_service,
            event_service,
            notifier,
        };
        (state, rx)
    }
}
