//! PostgreSQL-backed stores.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::repository::{
    EventResolver, JobStore, NotificationStore, ParticipantResolver, Stores, UserResolver,
};
use crate::types::{
    EventInfo, JobStatus, JobType, Notification, Participant, PendingJob, ScheduleJob, UserContact,
};

impl Stores {
    /// Wire every collaborator to the same connection pool.
    pub fn postgres(pool: PgPool) -> Self {
        let directory = Arc::new(PgDirectory::new(pool.clone()));
        Self {
            jobs: Arc::new(PgJobStore::new(pool.clone())),
            notifications: Arc::new(PgNotificationStore::new(pool)),
            events: directory.clone(),
            participants: directory.clone(),
            users: directory,
        }
    }
}

/// `schedule_jobs` table.
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// One row of the pending-jobs join.
#[derive(sqlx::FromRow)]
struct PendingRow {
    id: Uuid,
    event_id: Uuid,
    job_type: JobType,
    run_at: DateTime<Utc>,
    status: JobStatus,
    created_at: DateTime<Utc>,
    title: String,
    description: String,
    location: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    organizer_id: Uuid,
}

impl From<PendingRow> for PendingJob {
    fn from(row: PendingRow) -> Self {
        PendingJob {
            job: ScheduleJob {
                id: row.id,
                event_id: row.event_id,
                job_type: row.job_type,
                run_at: row.run_at,
                status: row.status,
                created_at: row.created_at,
            },
            event: EventInfo {
                id: row.event_id,
                title: row.title,
                description: row.description,
                location: row.location,
                start_time: row.start_time,
                end_time: row.end_time,
                organizer_id: row.organizer_id,
            },
        }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn create(&self, job: &ScheduleJob) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO schedule_jobs (id, event_id, job_type, run_at, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(job.id)
        .bind(job.event_id)
        .bind(job.job_type)
        .bind(job.run_at)
        .bind(job.status)
        .bind(job.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, job_id: Uuid) -> Result<Option<ScheduleJob>, AppError> {
        let job = sqlx::query_as("SELECT * FROM schedule_jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(job)
    }

    async fn find_by_event(&self, event_id: Uuid) -> Result<Vec<ScheduleJob>, AppError> {
        let jobs = sqlx::query_as(
            "SELECT * FROM schedule_jobs WHERE event_id = $1 ORDER BY created_at ASC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs)
    }

    async fn find_pending(&self) -> Result<Vec<PendingJob>, AppError> {
        let rows: Vec<PendingRow> = sqlx::query_as(
            r#"
            SELECT j.id, j.event_id, j.job_type, j.run_at, j.status, j.created_at,
                   e.title, e.description, e.location, e.start_time, e.end_time, e.organizer_id
            FROM schedule_jobs j
            JOIN events e ON e.id = j.event_id
            WHERE j.status = $1
            ORDER BY j.run_at ASC
            "#,
        )
        .bind(JobStatus::Pending)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PendingJob::from).collect())
    }

    async fn update_status(&self, job_id: Uuid, status: JobStatus) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE schedule_jobs SET status = $1 WHERE id = $2 AND status = $3")
            .bind(status)
            .bind(job_id)
            .bind(JobStatus::Pending)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update(&self, job: &ScheduleJob) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE schedule_jobs
            SET event_id = $1, job_type = $2, run_at = $3, status = $4
            WHERE id = $5
            "#,
        )
        .bind(job.event_id)
        .bind(job.job_type)
        .bind(job.run_at)
        .bind(job.status)
        .bind(job.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, job_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM schedule_jobs WHERE id = $1 AND status = $2")
            .bind(job_id)
            .bind(JobStatus::Pending)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// `notifications` table.
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn create(&self, notification: &Notification) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, event_id, kind, message, is_read, sent_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(notification.event_id)
        .bind(notification.kind)
        .bind(&notification.message)
        .bind(notification.is_read)
        .bind(notification.sent_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_user(&self, user_id: Uuid) -> Result<Vec<Notification>, AppError> {
        let notifications = sqlx::query_as(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY sent_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    async fn mark_read(&self, notification_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE notifications SET is_read = true WHERE id = $1")
            .bind(notification_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, notification_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(notification_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Read-only view over `events`, `participants` and `users`.
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventResolver for PgDirectory {
    async fn get_by_id(&self, event_id: Uuid) -> Result<EventInfo, AppError> {
        sqlx::query_as(
            r#"
            SELECT id, title, description, location, start_time, end_time, organizer_id
            FROM events WHERE id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("event not found".to_string()))
    }
}

#[async_trait]
impl ParticipantResolver for PgDirectory {
    async fn find_by_event(&self, event_id: Uuid) -> Result<Vec<Participant>, AppError> {
        let participants = sqlx::query_as(
            "SELECT * FROM participants WHERE event_id = $1 ORDER BY created_at ASC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(participants)
    }
}

#[async_trait]
impl UserResolver for PgDirectory {
    async fn get_by_id(&self, user_id: Uuid) -> Result<UserContact, AppError> {
        sqlx::query_as("SELECT id, email, name, role FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }
}
