//! In-memory stores.
//!
//! Used by the test suites and for running the services without a database.
//! Each store can be told to fail specific lookups so partial-failure paths
//! can be exercised.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::AppError;
use crate::repository::{
    EventResolver, JobStore, NotificationStore, ParticipantResolver, Stores, UserResolver,
};
use crate::types::{
    EventInfo, JobStatus, Notification, Participant, PendingJob, ScheduleJob, UserContact,
};

/// Events, participants and users.
#[derive(Default)]
pub struct InMemoryDirectory {
    events: Mutex<Vec<EventInfo>>,
    participants: Mutex<Vec<Participant>>,
    users: Mutex<Vec<UserContact>>,
    failing_participant_events: Mutex<HashSet<Uuid>>,
    failing_users: Mutex<HashSet<Uuid>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_event(&self, event: EventInfo) {
        self.events.lock().await.push(event);
    }

    pub async fn insert_user(&self, user: UserContact) {
        self.users.lock().await.push(user);
    }

    pub async fn insert_participant(&self, participant: Participant) {
        self.participants.lock().await.push(participant);
    }

    /// Make participant lookups for `event_id` fail.
    pub async fn fail_participants_for(&self, event_id: Uuid) {
        self.failing_participant_events.lock().await.insert(event_id);
    }

    /// Make user lookups for `user_id` fail.
    pub async fn fail_user(&self, user_id: Uuid) {
        self.failing_users.lock().await.insert(user_id);
    }
}

#[async_trait]
impl EventResolver for InMemoryDirectory {
    async fn get_by_id(&self, event_id: Uuid) -> Result<EventInfo, AppError> {
        self.events
            .lock()
            .await
            .iter()
            .find(|e| e.id == event_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("event not found".to_string()))
    }
}

#[async_trait]
impl ParticipantResolver for InMemoryDirectory {
    async fn find_by_event(&self, event_id: Uuid) -> Result<Vec<Participant>, AppError> {
        if self.failing_participant_events.lock().await.contains(&event_id) {
            return Err(AppError::Unavailable(format!(
                "participant lookup failed for event {}",
                event_id
            )));
        }

        Ok(self
            .participants
            .lock()
            .await
            .iter()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserResolver for InMemoryDirectory {
    async fn get_by_id(&self, user_id: Uuid) -> Result<UserContact, AppError> {
        if self.failing_users.lock().await.contains(&user_id) {
            return Err(AppError::Unavailable(format!("user lookup failed for {}", user_id)));
        }

        self.users
            .lock()
            .await
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }
}

/// Schedule jobs. Pending jobs are joined against the directory's events.
pub struct InMemoryJobStore {
    jobs: Mutex<Vec<ScheduleJob>>,
    directory: Arc<InMemoryDirectory>,
    fail_find_pending: AtomicBool,
    fail_status_updates: AtomicBool,
}

impl InMemoryJobStore {
    pub fn new(directory: Arc<InMemoryDirectory>) -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
            directory,
            fail_find_pending: AtomicBool::new(false),
            fail_status_updates: AtomicBool::new(false),
        }
    }

    pub fn set_fail_find_pending(&self, fail: bool) {
        self.fail_find_pending.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_status_updates(&self, fail: bool) {
        self.fail_status_updates.store(fail, Ordering::SeqCst);
    }

    pub async fn all(&self) -> Vec<ScheduleJob> {
        self.jobs.lock().await.clone()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, job: &ScheduleJob) -> Result<(), AppError> {
        self.jobs.lock().await.push(job.clone());
        Ok(())
    }

    async fn find_by_id(&self, job_id: Uuid) -> Result<Option<ScheduleJob>, AppError> {
        Ok(self.jobs.lock().await.iter().find(|j| j.id == job_id).cloned())
    }

    async fn find_by_event(&self, event_id: Uuid) -> Result<Vec<ScheduleJob>, AppError> {
        Ok(self
            .jobs
            .lock()
            .await
            .iter()
            .filter(|j| j.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn find_pending(&self) -> Result<Vec<PendingJob>, AppError> {
        if self.fail_find_pending.load(Ordering::SeqCst) {
            return Err(AppError::Unavailable("job store offline".to_string()));
        }

        let pending: Vec<ScheduleJob> = self
            .jobs
            .lock()
            .await
            .iter()
            .filter(|j| j.status == JobStatus::Pending)
            .cloned()
            .collect();

        let mut loaded = Vec::with_capacity(pending.len());
        for job in pending {
            // Orphaned jobs drop out, as with the SQL join.
            let event = EventResolver::get_by_id(self.directory.as_ref(), job.event_id).await;
            if let Ok(event) = event {
                loaded.push(PendingJob { job, event });
            }
        }
        Ok(loaded)
    }

    async fn update_status(&self, job_id: Uuid, status: JobStatus) -> Result<bool, AppError> {
        if self.fail_status_updates.load(Ordering::SeqCst) {
            return Err(AppError::Unavailable("job store offline".to_string()));
        }

        let mut jobs = self.jobs.lock().await;
        match jobs
            .iter_mut()
            .find(|j| j.id == job_id && j.status == JobStatus::Pending)
        {
            Some(job) => {
                job.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update(&self, job: &ScheduleJob) -> Result<(), AppError> {
        let mut jobs = self.jobs.lock().await;
        if let Some(existing) = jobs.iter_mut().find(|j| j.id == job.id) {
            *existing = job.clone();
        }
        Ok(())
    }

    async fn delete(&self, job_id: Uuid) -> Result<bool, AppError> {
        let mut jobs = self.jobs.lock().await;
        let before = jobs.len();
        jobs.retain(|j| j.id != job_id || j.status != JobStatus::Pending);
        Ok(jobs.len() < before)
    }
}

/// Notification records.
#[derive(Default)]
pub struct InMemoryNotificationStore {
    notifications: Mutex<Vec<Notification>>,
    failing_users: Mutex<HashSet<Uuid>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write for `user_id` fail.
    pub async fn fail_for_user(&self, user_id: Uuid) {
        self.failing_users.lock().await.insert(user_id);
    }

    pub async fn all(&self) -> Vec<Notification> {
        self.notifications.lock().await.clone()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn create(&self, notification: &Notification) -> Result<(), AppError> {
        if self.failing_users.lock().await.contains(&notification.user_id) {
            return Err(AppError::Unavailable("notification store offline".to_string()));
        }
        self.notifications.lock().await.push(notification.clone());
        Ok(())
    }

    async fn get_by_user(&self, user_id: Uuid) -> Result<Vec<Notification>, AppError> {
        let mut found: Vec<Notification> = self
            .notifications
            .lock()
            .await
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        Ok(found)
    }

    async fn mark_read(&self, notification_id: Uuid) -> Result<(), AppError> {
        if let Some(n) = self
            .notifications
            .lock()
            .await
            .iter_mut()
            .find(|n| n.id == notification_id)
        {
            n.is_read = true;
        }
        Ok(())
    }

    async fn delete(&self, notification_id: Uuid) -> Result<(), AppError> {
        self.notifications
            .lock()
            .await
            .retain(|n| n.id != notification_id);
        Ok(())
    }
}

/// All in-memory stores sharing one directory.
#[derive(Clone)]
pub struct InMemoryBackend {
    pub directory: Arc<InMemoryDirectory>,
    pub jobs: Arc<InMemoryJobStore>,
    pub notifications: Arc<InMemoryNotificationStore>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        let directory = Arc::new(InMemoryDirectory::new());
        Self {
            jobs: Arc::new(InMemoryJobStore::new(directory.clone())),
            notifications: Arc::new(InMemoryNotificationStore::new()),
            directory,
        }
    }

    pub fn stores(&self) -> Stores {
        Stores {
            jobs: self.jobs.clone(),
            notifications: self.notifications.clone(),
            events: self.directory.clone(),
            participants: self.directory.clone(),
            users: self.directory.clone(),
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}
