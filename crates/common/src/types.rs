use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// How event start times appear in notification text and emails.
pub const EVENT_DATE_FORMAT: &str = "%d %b %Y %H:%M";

/// What a scheduled job does when it comes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Remind participants that the event is about to start.
    Reminder,
    /// Thank participants once the event is over.
    EndEvent,
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobType::Reminder => write!(f, "reminder"),
            JobType::EndEvent => write!(f, "end_event"),
        }
    }
}

impl std::str::FromStr for JobType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reminder" => Ok(JobType::Reminder),
            "end_event" => Ok(JobType::EndEvent),
            _ => Err(AppError::Validation(
                "invalid job type. must be 'reminder' or 'end_event'".to_string(),
            )),
        }
    }
}

/// Lifecycle of a schedule job. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Done,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Done => write!(f, "done"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Kind of a user-facing notification.
///
/// Shared by every crate that creates notifications, so callers outside the
/// notifier pass a typed value rather than a free-form string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Reminder,
    Update,
    Cancellation,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Reminder => write!(f, "reminder"),
            NotificationKind::Update => write!(f, "update"),
            NotificationKind::Cancellation => write!(f, "cancellation"),
        }
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reminder" => Ok(NotificationKind::Reminder),
            "update" => Ok(NotificationKind::Update),
            "cancellation" => Ok(NotificationKind::Cancellation),
            _ => Err(AppError::Validation(
                "invalid notification type. must be 'reminder', 'update', or 'cancellation'"
                    .to_string(),
            )),
        }
    }
}

/// Account role, as carried in the JWT and the users table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Organizer,
    Participant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Organizer => write!(f, "organizer"),
            Role::Participant => write!(f, "participant"),
        }
    }
}

/// The authenticated user an operation runs on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins manage every event; anyone else only the events they organize.
    pub fn can_manage(&self, event: &EventInfo) -> bool {
        self.is_admin() || event.organizer_id == self.user_id
    }
}

/// Registration state of a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    Registered,
    Attended,
    Cancelled,
}

/// A persisted job pairing an event, a job type and a due time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScheduleJob {
    pub id: Uuid,
    pub event_id: Uuid,
    pub job_type: JobType,
    pub run_at: DateTime<Utc>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

impl ScheduleJob {
    /// A fresh `Pending` job.
    pub fn new(event_id: Uuid, job_type: JobType, run_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            job_type,
            run_at,
            status: JobStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// A job is due once its `run_at` is at or before `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.run_at <= now
    }
}

/// Event details as seen by the scheduling core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventInfo {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub organizer_id: Uuid,
}

/// A pending job with its owning event pre-loaded.
#[derive(Debug, Clone)]
pub struct PendingJob {
    pub job: ScheduleJob,
    pub event: EventInfo,
}

/// A user's registration for an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Participant {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: ParticipantStatus,
    pub created_at: DateTime<Utc>,
}

/// Contact details needed to deliver a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserContact {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// A user-visible notification record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub message: String,
    pub is_read: bool,
    pub sent_at: DateTime<Utc>,
}

/// Parameters for creating a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotificationRequest {
    pub user_id: Uuid,
    pub event_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub message: String,
}

impl CreateNotificationRequest {
    pub fn reminder(user_id: Uuid, event_id: Uuid, message: impl Into<String>) -> Self {
        Self::for_event(user_id, event_id, NotificationKind::Reminder, message)
    }

    pub fn update(user_id: Uuid, event_id: Uuid, message: impl Into<String>) -> Self {
        Self::for_event(user_id, event_id, NotificationKind::Update, message)
    }

    pub fn cancellation(user_id: Uuid, event_id: Uuid, message: impl Into<String>) -> Self {
        Self::for_event(user_id, event_id, NotificationKind::Cancellation, message)
    }

    pub fn for_event(
        user_id: Uuid,
        event_id: Uuid,
        kind: NotificationKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            event_id: Some(event_id),
            kind,
            message: message.into(),
        }
    }
}
