//! Time-driven job scheduler.
//!
//! On every tick the scheduler loads the pending jobs, runs the ones whose
//! `run_at` has passed and writes their terminal status:
//!
//! - participant lookup failed: `Failed`, nobody is notified
//! - otherwise: every participant gets a notification (individual failures
//!   are logged and skipped) and the job becomes `Done`
//!
//! Nothing is retried. A job whose status write fails stays `Pending` and is
//! picked up again on the next tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use herald_common::repository::{JobStore, NotificationSender, ParticipantResolver, UserResolver};
use herald_common::types::{
    EVENT_DATE_FORMAT, EventInfo, JobStatus, JobType, NotificationKind, PendingJob,
};

/// Shortest accepted tick interval.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// What one tick did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Pending jobs whose `run_at` had passed.
    pub due: usize,
    pub done: usize,
    pub failed: usize,
    /// Pending jobs not yet due.
    pub skipped: usize,
    /// Notification records created across all jobs.
    pub notifications: usize,
}

/// Result of running a single due job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobOutcome {
    Done { notifications: usize },
    Failed,
}

impl JobOutcome {
    fn status(self) -> JobStatus {
        match self {
            JobOutcome::Done { .. } => JobStatus::Done,
            JobOutcome::Failed => JobStatus::Failed,
        }
    }
}

pub struct Scheduler {
    jobs: Arc<dyn JobStore>,
    participants: Arc<dyn ParticipantResolver>,
    users: Arc<dyn UserResolver>,
    notifier: Arc<dyn NotificationSender>,
    interval: Duration,
}

impl Scheduler {
    /// `interval` is raised to one second if shorter.
    pub fn new(
        jobs: Arc<dyn JobStore>,
        participants: Arc<dyn ParticipantResolver>,
        users: Arc<dyn UserResolver>,
        notifier: Arc<dyn NotificationSender>,
        interval: Duration,
    ) -> Self {
        Self {
            jobs,
            participants,
            users,
            notifier,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    /// Spawn the tick loop on the current runtime.
    pub fn start(self) -> SchedulerHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(stop_rx));
        SchedulerHandle { stop_tx, task }
    }

    async fn run(self, mut stop: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Scheduler started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.tick(Utc::now()).await;
                    if report.due > 0 {
                        tracing::info!(
                            due = report.due,
                            done = report.done,
                            failed = report.failed,
                            notifications = report.notifications,
                            "Scheduler tick finished"
                        );
                    }
                }
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Scheduler stopped");
    }

    /// Run one sweep as of `now`.
    pub async fn tick(&self, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport::default();

        let pending = match self.jobs.find_pending().await {
            Ok(pending) => pending,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load pending jobs");
                return report;
            }
        };

        for pending_job in &pending {
            if !pending_job.job.is_due(now) {
                report.skipped += 1;
                continue;
            }
            report.due += 1;

            let outcome = self.execute(pending_job).await;
            match outcome {
                JobOutcome::Done { notifications } => {
                    report.done += 1;
                    report.notifications += notifications;
                }
                JobOutcome::Failed => report.failed += 1,
            }

            self.record_status(pending_job, outcome.status()).await;
        }

        report
    }

    async fn execute(&self, pending: &PendingJob) -> JobOutcome {
        let PendingJob { job, event } = pending;
        let (kind, message) = match job.job_type {
            JobType::Reminder => (NotificationKind::Reminder, reminder_message(event)),
            JobType::EndEvent => (NotificationKind::Update, end_event_message(event)),
        };

        let participants = match self.participants.find_by_event(event.id).await {
            Ok(participants) => participants,
            Err(e) => {
                tracing::error!(
                    job_id = %job.id,
                    event_id = %event.id,
                    error = %e,
                    "Failed to load participants"
                );
                return JobOutcome::Failed;
            }
        };

        let mut notifications = 0;
        for participant in &participants {
            let user = match self.users.get_by_id(participant.user_id).await {
                Ok(user) => user,
                Err(e) => {
                    tracing::warn!(
                        job_id = %job.id,
                        user_id = %participant.user_id,
                        error = %e,
                        "Skipping participant, user lookup failed"
                    );
                    continue;
                }
            };

            match self
                .notifier
                .send_notification_with_email(
                    user.id, event.id, kind, &message, &user.email, &user.name,
                )
                .await
            {
                Ok(_) => notifications += 1,
                Err(e) => tracing::warn!(
                    job_id = %job.id,
                    user_id = %user.id,
                    error = %e,
                    "Failed to notify participant"
                ),
            }
        }

        tracing::debug!(
            job_id = %job.id,
            job_type = %job.job_type,
            participants = participants.len(),
            notifications,
            "Job executed"
        );

        JobOutcome::Done { notifications }
    }

    async fn record_status(&self, pending: &PendingJob, status: JobStatus) {
        match self.jobs.update_status(pending.job.id, status).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!(
                job_id = %pending.job.id,
                status = %status,
                "Job already left pending, status not written"
            ),
            Err(e) => tracing::error!(
                job_id = %pending.job.id,
                status = %status,
                error = %e,
                "Failed to write job status, will retry next tick"
            ),
        }
    }
}

/// Controls a running scheduler loop.
pub struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Ask the loop to exit. A tick already in progress runs to completion.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Wait for the loop to exit.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Scheduler task panicked");
        }
    }
}

pub fn reminder_message(event: &EventInfo) -> String {
    format!(
        "Reminder: event '{}' starts soon at {}",
        event.title,
        event.start_time.format(EVENT_DATE_FORMAT)
    )
}

pub fn end_event_message(event: &EventInfo) -> String {
    format!(
        "Event '{}' has ended. Thank you for taking part!",
        event.title
    )
}
