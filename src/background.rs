use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info, info_span, Instrument};
use crate::domain::models::notification::Notification;
use crate::domain::services::notification_service::NotificationService;

/// Drains the post-commit notification queue until every sender is gone.
/// Delivery errors are logged; nothing is retried.
pub async fn start_notification_worker(mut rx: UnboundedReceiver<Notification>, service: NotificationService) {
    info!("Starting notification worker...");

    while let Some(notification) = rx.recv().await {
        let span = info_span!(
            "notification",
            kind = ?notification.kind,
            event_id = %notification.event_id,
            recipients = notification.recipients.len()
        );

        async {
            info!("Dispatching notification: {}", notification.subject);
            match service.notify(&notification.subject, &notification.body, &notification.recipients).await {
                Ok(()) => info!("Notification delivered"),
                Err(e) => error!("Error sending notification emails: {}", e),
            }
        }
            .instrument(span)
            .await;
    }

    info!("Notification queue closed, worker exiting");
}
