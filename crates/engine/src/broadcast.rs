//! Ad-hoc announcements from an organizer to every participant of an event.

use std::sync::Arc;

use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::repository::{
    EventResolver, NotificationSender, ParticipantResolver, UserResolver,
};
use herald_common::types::{Actor, NotificationKind};

#[derive(Clone)]
pub struct EventBroadcaster {
    events: Arc<dyn EventResolver>,
    participants: Arc<dyn ParticipantResolver>,
    users: Arc<dyn UserResolver>,
    notifier: Arc<dyn NotificationSender>,
}

impl EventBroadcaster {
    pub fn new(
        events: Arc<dyn EventResolver>,
        participants: Arc<dyn ParticipantResolver>,
        users: Arc<dyn UserResolver>,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            events,
            participants,
            users,
            notifier,
        }
    }

    /// Notify every participant of `event_id`. Returns how many
    /// notifications were created; recipients that fail are logged and
    /// skipped.
    pub async fn notify_participants(
        &self,
        actor: &Actor,
        event_id: Uuid,
        kind: NotificationKind,
        message: &str,
    ) -> Result<usize, AppError> {
        if message.trim().is_empty() {
            return Err(AppError::Validation("message is required".to_string()));
        }

        let event = self.events.get_by_id(event_id).await?;
        if !actor.can_manage(&event) {
            return Err(AppError::Forbidden(
                "you are not the organizer of this event".to_string(),
            ));
        }

        let participants = self.participants.find_by_event(event.id).await?;

        let mut sent = 0;
        for participant in &participants {
            let user = match self.users.get_by_id(participant.user_id).await {
                Ok(user) => user,
                Err(e) => {
                    tracing::warn!(user_id = %participant.user_id, error = %e, "Skipping participant");
                    continue;
                }
            };

            if let Err(e) = self
                .notifier
                .send_notification_with_email(
                    user.id, event.id, kind, message, &user.email, &user.name,
                )
                .await
            {
                tracing::warn!(user_id = %user.id, error = %e, "Failed to notify participant");
                continue;
            }
            sent += 1;
        }

        tracing::info!(
            event_id = %event.id,
            kind = %kind,
            participants = participants.len(),
            sent,
            "Announcement sent"
        );

        Ok(sent)
    }
}
