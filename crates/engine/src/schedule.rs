//! Schedule management for event organizers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::repository::{EventResolver, JobStore};
use herald_common::types::{Actor, EventInfo, JobStatus, JobType, ScheduleJob};

/// Creates, lists and removes schedule jobs.
#[derive(Clone)]
pub struct ScheduleService {
    jobs: Arc<dyn JobStore>,
    events: Arc<dyn EventResolver>,
}

impl ScheduleService {
    pub fn new(jobs: Arc<dyn JobStore>, events: Arc<dyn EventResolver>) -> Self {
        Self { jobs, events }
    }

    /// Schedule a job for an event the actor manages.
    ///
    /// `run_at` must lie in the future and no later than the event's end.
    pub async fn create_schedule(
        &self,
        actor: &Actor,
        event_id: Uuid,
        job_type: JobType,
        run_at: DateTime<Utc>,
    ) -> Result<ScheduleJob, AppError> {
        let event = self.managed_event(actor, event_id).await?;
        validate_run_at(&event, run_at, Utc::now())?;

        let job = ScheduleJob::new(event.id, job_type, run_at);
        self.jobs.create(&job).await?;

        tracing::info!(
            job_id = %job.id,
            event_id = %event.id,
            job_type = %job.job_type,
            run_at = %job.run_at,
            "Schedule created"
        );

        Ok(job)
    }

    pub async fn get_schedules_by_event(
        &self,
        actor: &Actor,
        event_id: Uuid,
    ) -> Result<Vec<ScheduleJob>, AppError> {
        let event = self.managed_event(actor, event_id).await?;
        self.jobs.find_by_event(event.id).await
    }

    /// Remove a job that has not run yet.
    pub async fn delete_schedule(&self, actor: &Actor, schedule_id: Uuid) -> Result<(), AppError> {
        let job = self
            .jobs
            .find_by_id(schedule_id)
            .await?
            .ok_or_else(|| AppError::NotFound("schedule not found".to_string()))?;

        let event = self.events.get_by_id(job.event_id).await?;
        if !actor.can_manage(&event) {
            return Err(AppError::Forbidden(
                "unauthorized to delete this schedule".to_string(),
            ));
        }

        if job.status != JobStatus::Pending {
            return Err(AppError::Validation(format!(
                "cannot delete a schedule that is already {}",
                job.status
            )));
        }

        // The scheduler may finish the job between the check and the delete.
        if !self.jobs.delete(job.id).await? {
            return match self.jobs.find_by_id(job.id).await? {
                Some(current) => Err(AppError::Validation(format!(
                    "cannot delete a schedule that is already {}",
                    current.status
                ))),
                None => Err(AppError::NotFound("schedule not found".to_string())),
            };
        }

        tracing::info!(job_id = %job.id, event_id = %job.event_id, "Schedule deleted");
        Ok(())
    }

    async fn managed_event(&self, actor: &Actor, event_id: Uuid) -> Result<EventInfo, AppError> {
        let event = self.events.get_by_id(event_id).await?;
        if !actor.can_manage(&event) {
            return Err(AppError::Forbidden(
                "you are not the organizer of this event".to_string(),
            ));
        }
        Ok(event)
    }
}

fn validate_run_at(
    event: &EventInfo,
    run_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    if run_at <= now {
        return Err(AppError::Validation(
            "run_at must be in the future".to_string(),
        ));
    }
    if run_at > event.end_time {
        return Err(AppError::Validation(
            "run_at cannot be after event end time".to_string(),
        ));
    }
    Ok(())
}
