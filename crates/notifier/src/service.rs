//! Notification service: persists notification records and hands their
//! emails to the dispatcher.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::repository::{NotificationSender, NotificationStore};
use herald_common::types::{CreateNotificationRequest, Notification, NotificationKind};

use crate::dispatch::{EmailDispatcher, EmailTask};
use crate::email::Recipient;

/// Service layer for notification records.
#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
    dispatcher: EmailDispatcher,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationStore>, dispatcher: EmailDispatcher) -> Self {
        Self { store, dispatcher }
    }

    /// Validate and persist a notification.
    pub async fn create_notification(
        &self,
        req: &CreateNotificationRequest,
    ) -> Result<Notification, AppError> {
        if req.message.trim().is_empty() {
            return Err(AppError::Validation("message is required".to_string()));
        }

        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: req.user_id,
            event_id: req.event_id,
            kind: req.kind,
            message: req.message.clone(),
            is_read: false,
            sent_at: Utc::now(),
        };

        self.store.create(&notification).await?;

        tracing::debug!(
            notification_id = %notification.id,
            user_id = %notification.user_id,
            kind = %notification.kind,
            "Notification created"
        );

        Ok(notification)
    }

    /// Persist a notification, then queue its email.
    ///
    /// Only persistence and validation errors are returned; the email is
    /// delivered in the background and its outcome is logged by the
    /// dispatcher.
    pub async fn create_notification_with_email(
        &self,
        req: &CreateNotificationRequest,
        recipient_email: &str,
        recipient_name: &str,
    ) -> Result<Notification, AppError> {
        let notification = self.create_notification(req).await?;

        let task = EmailTask {
            notification_id: notification.id,
            kind: notification.kind,
            event_id: notification.event_id,
            message: notification.message.clone(),
            recipient: Recipient::new(recipient_email, recipient_name),
        };

        if let Err(e) = self.dispatcher.enqueue(task).await {
            tracing::warn!(
                notification_id = %notification.id,
                to = %recipient_email,
                error = %e,
                "Could not queue notification email"
            );
        }

        Ok(notification)
    }

    /// All notifications of a user, newest first.
    pub async fn get_notifications_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Notification>, AppError> {
        self.store.get_by_user(user_id).await
    }

    pub async fn mark_notification_as_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        let owned = self.find_owned(notification_id, user_id).await?;
        self.store.mark_read(owned.id).await?;

        tracing::debug!(notification_id = %notification_id, "Notification marked as read");
        Ok(())
    }

    pub async fn delete_notification(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        let owned = self.find_owned(notification_id, user_id).await?;
        self.store.delete(owned.id).await?;

        tracing::info!(notification_id = %notification_id, "Notification deleted");
        Ok(())
    }

    /// Look the notification up among the user's own, so a foreign id and a
    /// missing id fail the same way.
    async fn find_owned(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<Notification, AppError> {
        self.store
            .get_by_user(user_id)
            .await?
            .into_iter()
            .find(|n| n.id == notification_id)
            .ok_or_else(AppError::notification_not_found)
    }
}

#[async_trait]
impl NotificationSender for NotificationService {
    async fn send_notification_with_email(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        kind: NotificationKind,
        message: &str,
        recipient_email: &str,
        recipient_name: &str,
    ) -> Result<Notification, AppError> {
        let req = CreateNotificationRequest::for_event(user_id, event_id, kind, message);
        self.create_notification_with_email(&req, recipient_email, recipient_name)
            .await
    }
}
