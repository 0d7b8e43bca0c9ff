use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::domain::models::notification::{Notification, Recipient};
use crate::domain::ports::EmailService;
use crate::error::AppError;

/// Best-effort fan-out of one message to many recipients.
pub struct NotificationService {
    email_service: Arc<dyn EmailService>,
}

impl NotificationService {
    pub fn new(email_service: Arc<dyn EmailService>) -> Self {
        Self { email_service }
    }

    /// Sends to every recipient that has an email address. A failed delivery
    /// does not stop the remaining ones; the returned error summarises all
    /// failures.
    pub async fn notify(&self, subject: &str, body: &str, recipients: &[Recipient]) -> Result<(), AppError> {
        let mut attempted = 0;
        let mut failures = Vec::new();

        for recipient in recipients {
            let Some(email) = recipient.email.as_deref().filter(|e| !e.is_empty()) else {
                continue;
            };
            attempted += 1;

            let greeting = format!("Hi {}!\n\n{}", recipient.full_name, body);
            match self.email_service.send(email, subject, &greeting).await {
                Ok(()) => info!("Email sent to user {}", recipient.user_id),
                Err(e) => {
                    error!("Error sending email to user {}: {}", recipient.user_id, e);
                    failures.push(format!("{}: {}", recipient.user_id, e));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(AppError::Notification(format!(
                "{} of {} deliveries failed ({})",
                failures.len(),
                attempted,
                failures.join("; ")
            )))
        }
    }
}

/// Sending half of the post-commit notification queue.
#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::UnboundedSender<Notification>,
}

impl NotificationDispatcher {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Never blocks and never fails the caller; a closed queue is only logged.
    pub fn dispatch(&self, notification: Notification) {
        if notification.recipients.is_empty() {
            return;
        }
        if let Err(e) = self.tx.send(notification) {
            warn!("Notification queue closed, dropping message for event {}", e.0.event_id);
        }
    }
}
