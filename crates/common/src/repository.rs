//! Store and resolver interfaces consumed by the scheduling core.
//!
//! Every collaborator is injected as `Arc<dyn Trait>` so the scheduler and
//! services never touch a global database handle. PostgreSQL implementations
//! live in [`crate::pg`], in-memory ones in [`crate::memory`].

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::types::{
    EventInfo, JobStatus, Notification, NotificationKind, Participant, PendingJob, ScheduleJob,
    UserContact,
};

/// Durable table of scheduled jobs.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, job: &ScheduleJob) -> Result<(), AppError>;

    async fn find_by_id(&self, job_id: Uuid) -> Result<Option<ScheduleJob>, AppError>;

    /// All jobs of an event, oldest first.
    async fn find_by_event(&self, event_id: Uuid) -> Result<Vec<ScheduleJob>, AppError>;

    /// Jobs still `Pending`, each with its owning event loaded.
    async fn find_pending(&self) -> Result<Vec<PendingJob>, AppError>;

    /// Move a `Pending` job to `status`. Returns `false` if the job does not
    /// exist or already left `Pending`.
    async fn update_status(&self, job_id: Uuid, status: JobStatus) -> Result<bool, AppError>;

    async fn update(&self, job: &ScheduleJob) -> Result<(), AppError>;

    /// Removes the job only while it is still `Pending`. Returns `true` if a
    /// row was removed.
    async fn delete(&self, job_id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait ParticipantResolver: Send + Sync {
    /// Participants of an event in registration order.
    async fn find_by_event(&self, event_id: Uuid) -> Result<Vec<Participant>, AppError>;
}

#[async_trait]
pub trait UserResolver: Send + Sync {
    async fn get_by_id(&self, user_id: Uuid) -> Result<UserContact, AppError>;
}

#[async_trait]
pub trait EventResolver: Send + Sync {
    async fn get_by_id(&self, event_id: Uuid) -> Result<EventInfo, AppError>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create(&self, notification: &Notification) -> Result<(), AppError>;

    /// A user's notifications, newest `sent_at` first.
    async fn get_by_user(&self, user_id: Uuid) -> Result<Vec<Notification>, AppError>;

    async fn mark_read(&self, notification_id: Uuid) -> Result<(), AppError>;

    async fn delete(&self, notification_id: Uuid) -> Result<(), AppError>;
}

/// Entry point for code outside the notifier that needs to notify a user
/// and email them.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send_notification_with_email(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        kind: NotificationKind,
        message: &str,
        recipient_email: &str,
        recipient_name: &str,
    ) -> Result<Notification, AppError>;
}

/// The full set of collaborators, bundled for wiring.
#[derive(Clone)]
pub struct Stores {
    pub jobs: Arc<dyn JobStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub events: Arc<dyn EventResolver>,
    pub participants: Arc<dyn ParticipantResolver>,
    pub users: Arc<dyn UserResolver>,
}
