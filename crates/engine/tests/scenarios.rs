//! End-to-end scheduler behaviour against the in-memory stores, with the real
//! notification service and dispatcher in the loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use uuid::Uuid;

use herald_common::memory::InMemoryBackend;
use herald_common::repository::JobStore;
use herald_common::types::{
    Actor, EventInfo, JobStatus, JobType, NotificationKind, Participant, ParticipantStatus, Role,
    ScheduleJob, UserContact,
};
use herald_engine::{EventBroadcaster, ScheduleService, Scheduler};
use herald_notifier::memory::InMemoryMailer;
use herald_notifier::{EmailDispatcher, NotificationService};

// ============================================================
// Shared helpers
// ============================================================

struct World {
    backend: InMemoryBackend,
    mailer: Arc<InMemoryMailer>,
    dispatcher: EmailDispatcher,
    service: Arc<NotificationService>,
}

impl World {
    fn new() -> Self {
        let backend = InMemoryBackend::new();
        let mailer = Arc::new(InMemoryMailer::new());
        let dispatcher = EmailDispatcher::start(mailer.clone(), backend.directory.clone(), 2, 32);
        let service = Arc::new(NotificationService::new(
            backend.notifications.clone(),
            dispatcher.clone(),
        ));
        Self {
            backend,
            mailer,
            dispatcher,
            service,
        }
    }

    fn scheduler(&self) -> Scheduler {
        Scheduler::new(
            self.backend.jobs.clone(),
            self.backend.directory.clone(),
            self.backend.directory.clone(),
            self.service.clone(),
            Duration::from_secs(60),
        )
    }

    async fn add_event(&self, organizer_id: Uuid) -> EventInfo {
        let now = Utc::now();
        let event = EventInfo {
            id: Uuid::new_v4(),
            title: "Community Meetup".to_string(),
            description: "Monthly meetup".to_string(),
            location: "Library".to_string(),
            start_time: now + ChronoDuration::hours(1),
            end_time: now + ChronoDuration::hours(3),
            organizer_id,
        };
        self.backend.directory.insert_event(event.clone()).await;
        event
    }

    async fn add_participant(&self, event_id: Uuid, email: &str) -> Uuid {
        let user_id = Uuid::new_v4();
        self.backend
            .directory
            .insert_user(UserContact {
                id: user_id,
                email: email.to_string(),
                name: email.split('@').next().unwrap_or_default().to_string(),
                role: Role::Participant,
            })
            .await;
        self.backend
            .directory
            .insert_participant(Participant {
                id: Uuid::new_v4(),
                event_id,
                user_id,
                status: ParticipantStatus::Registered,
                created_at: Utc::now(),
            })
            .await;
        user_id
    }

    async fn add_job(&self, event_id: Uuid, job_type: JobType, offset: ChronoDuration) -> ScheduleJob {
        let job = ScheduleJob::new(event_id, job_type, Utc::now() + offset);
        self.backend.jobs.create(&job).await.unwrap();
        job
    }

    async fn status_of(&self, job_id: Uuid) -> JobStatus {
        self.backend
            .jobs
            .find_by_id(job_id)
            .await
            .unwrap()
            .unwrap()
            .status
    }
}

// ============================================================
// Scheduler
// ============================================================

#[tokio::test]
async fn test_due_reminder_notifies_every_participant() {
    let world = World::new();
    let event = world.add_event(Uuid::new_v4()).await;
    world.add_participant(event.id, "ada@example.com").await;
    world.add_participant(event.id, "grace@example.com").await;
    let job = world
        .add_job(event.id, JobType::Reminder, -ChronoDuration::minutes(1))
        .await;

    let report = world.scheduler().tick(Utc::now()).await;
    world.dispatcher.shutdown().await;

    assert_eq!(report.due, 1);
    assert_eq!(report.notifications, 2);
    assert_eq!(world.status_of(job.id).await, JobStatus::Done);

    let records = world.backend.notifications.all().await;
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|n| n.kind == NotificationKind::Reminder));
    assert!(records.iter().all(|n| n.event_id == Some(event.id)));
    assert!(records[0].message.starts_with("Reminder: event 'Community Meetup'"));

    assert_eq!(world.mailer.sent().await.len(), 2);
}

#[tokio::test]
async fn test_future_job_is_left_alone() {
    let world = World::new();
    let event = world.add_event(Uuid::new_v4()).await;
    world.add_participant(event.id, "ada@example.com").await;
    let job = world
        .add_job(event.id, JobType::EndEvent, ChronoDuration::minutes(10))
        .await;

    let report = world.scheduler().tick(Utc::now()).await;

    assert_eq!(report.due, 0);
    assert_eq!(report.skipped, 1);
    assert_eq!(world.status_of(job.id).await, JobStatus::Pending);
    assert!(world.backend.notifications.all().await.is_empty());
}

#[tokio::test]
async fn test_participant_lookup_failure_marks_job_failed() {
    let world = World::new();
    let event = world.add_event(Uuid::new_v4()).await;
    world.add_participant(event.id, "ada@example.com").await;
    world.backend.directory.fail_participants_for(event.id).await;
    let job = world
        .add_job(event.id, JobType::Reminder, -ChronoDuration::seconds(5))
        .await;

    let report = world.scheduler().tick(Utc::now()).await;

    assert_eq!(report.failed, 1);
    assert_eq!(world.status_of(job.id).await, JobStatus::Failed);
    assert!(world.backend.notifications.all().await.is_empty());
}

#[tokio::test]
async fn test_email_failure_for_one_participant_is_isolated() {
    let world = World::new();
    let event = world.add_event(Uuid::new_v4()).await;
    world.add_participant(event.id, "one@example.com").await;
    world.add_participant(event.id, "two@example.com").await;
    world.add_participant(event.id, "three@example.com").await;
    world.mailer.fail_for("two@example.com").await;
    let job = world
        .add_job(event.id, JobType::Reminder, -ChronoDuration::minutes(1))
        .await;

    world.scheduler().tick(Utc::now()).await;
    world.dispatcher.shutdown().await;

    assert_eq!(world.backend.notifications.all().await.len(), 3);
    assert_eq!(world.status_of(job.id).await, JobStatus::Done);

    let stats = world.dispatcher.stats();
    assert_eq!(stats.sent, 2);
    assert_eq!(stats.failed, 1);
}

#[tokio::test]
async fn test_notification_store_failure_does_not_fail_job() {
    let world = World::new();
    let event = world.add_event(Uuid::new_v4()).await;
    let broken = world.add_participant(event.id, "one@example.com").await;
    world.add_participant(event.id, "two@example.com").await;
    world.backend.notifications.fail_for_user(broken).await;
    let job = world
        .add_job(event.id, JobType::EndEvent, -ChronoDuration::minutes(1))
        .await;

    let report = world.scheduler().tick(Utc::now()).await;

    assert_eq!(report.notifications, 1);
    assert_eq!(world.status_of(job.id).await, JobStatus::Done);
    let records = world.backend.notifications.all().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, NotificationKind::Update);
}

#[tokio::test]
async fn test_terminal_jobs_are_never_reexecuted() {
    let world = World::new();
    let event = world.add_event(Uuid::new_v4()).await;
    world.add_participant(event.id, "ada@example.com").await;
    world
        .add_job(event.id, JobType::Reminder, -ChronoDuration::minutes(1))
        .await;

    let scheduler = world.scheduler();
    let first = scheduler.tick(Utc::now()).await;
    let second = scheduler.tick(Utc::now()).await;

    assert_eq!(first.done, 1);
    assert_eq!(second, Default::default());
    assert_eq!(world.backend.notifications.all().await.len(), 1);
}

#[tokio::test]
async fn test_mixed_jobs_in_one_tick() {
    let world = World::new();
    let ok_event = world.add_event(Uuid::new_v4()).await;
    let bad_event = world.add_event(Uuid::new_v4()).await;
    world.add_participant(ok_event.id, "ada@example.com").await;
    world.backend.directory.fail_participants_for(bad_event.id).await;

    let done = world
        .add_job(ok_event.id, JobType::Reminder, -ChronoDuration::minutes(2))
        .await;
    let failed = world
        .add_job(bad_event.id, JobType::Reminder, -ChronoDuration::minutes(2))
        .await;
    let later = world
        .add_job(ok_event.id, JobType::EndEvent, ChronoDuration::hours(3))
        .await;

    let report = world.scheduler().tick(Utc::now()).await;

    assert_eq!((report.due, report.done, report.failed, report.skipped), (2, 1, 1, 1));
    assert_eq!(world.status_of(done.id).await, JobStatus::Done);
    assert_eq!(world.status_of(failed.id).await, JobStatus::Failed);
    assert_eq!(world.status_of(later.id).await, JobStatus::Pending);
}

// ============================================================
// Schedule service + broadcaster
// ============================================================

#[tokio::test]
async fn test_schedule_after_end_time_is_not_persisted() {
    let world = World::new();
    let organizer = Uuid::new_v4();
    let event = world.add_event(organizer).await;
    let service = ScheduleService::new(world.backend.jobs.clone(), world.backend.directory.clone());

    let err = service
        .create_schedule(
            &Actor::new(organizer, Role::Organizer),
            event.id,
            JobType::EndEvent,
            event.end_time + ChronoDuration::hours(1),
        )
        .await
        .unwrap_err();

    assert!(err.to_string().contains("run_at cannot be after event end time"));
    assert!(world.backend.jobs.all().await.is_empty());
}

#[tokio::test]
async fn test_broadcast_reaches_participants_and_counts() {
    let world = World::new();
    let organizer = Uuid::new_v4();
    let event = world.add_event(organizer).await;
    world.add_participant(event.id, "ada@example.com").await;
    let missing = world.add_participant(event.id, "grace@example.com").await;
    world.backend.directory.fail_user(missing).await;

    let broadcaster = EventBroadcaster::new(
        world.backend.directory.clone(),
        world.backend.directory.clone(),
        world.backend.directory.clone(),
        world.service.clone(),
    );

    let sent = broadcaster
        .notify_participants(
            &Actor::new(organizer, Role::Organizer),
            event.id,
            NotificationKind::Cancellation,
            "The meetup is cancelled",
        )
        .await
        .unwrap();
    world.dispatcher.shutdown().await;

    assert_eq!(sent, 1);
    let emails = world.mailer.sent().await;
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].message.subject, "Event cancelled: Community Meetup");

    let stranger = Actor::new(Uuid::new_v4(), Role::Organizer);
    assert!(
        broadcaster
            .notify_participants(&stranger, event.id, NotificationKind::Update, "hi")
            .await
            .is_err()
    );
}
