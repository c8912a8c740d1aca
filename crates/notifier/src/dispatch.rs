//! Email dispatcher: a bounded queue drained by a capped pool of delivery tasks.
//!
//! Callers enqueue an [`EmailTask`] and return immediately; delivery happens
//! in the background and its outcome is only logged and counted. At most
//! `workers` deliveries run at once and at most `capacity` tasks wait in the
//! queue, so a large fan-out applies back-pressure on the enqueuer instead of
//! spawning unbounded work.
//!
//! [`EmailDispatcher::shutdown`] stops accepting tasks and waits for every
//! queued and in-flight delivery to finish.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, RwLock, Semaphore, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::repository::EventResolver;
use herald_common::types::{EVENT_DATE_FORMAT, NotificationKind};

use crate::email::{EmailGateway, Recipient};

/// Shown when the event behind a notification cannot be loaded.
const FALLBACK_EVENT_TITLE: &str = "Event";
const FALLBACK_EVENT_DATE: &str = "soon";

/// One email to deliver for a persisted notification.
#[derive(Debug, Clone)]
pub struct EmailTask {
    pub notification_id: Uuid,
    pub kind: NotificationKind,
    pub event_id: Option<Uuid>,
    pub message: String,
    pub recipient: Recipient,
}

/// Delivery counters.
#[derive(Debug, Default)]
pub struct DispatchStats {
    enqueued: AtomicU64,
    sent: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`DispatchStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSnapshot {
    pub enqueued: u64,
    pub sent: u64,
    pub failed: u64,
}

impl DispatchStats {
    pub fn snapshot(&self) -> DispatchSnapshot {
        DispatchSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

struct Inner {
    /// `None` once shutdown has begun.
    tx: RwLock<Option<mpsc::Sender<EmailTask>>>,
    runner: Mutex<Option<JoinHandle<()>>>,
    stats: Arc<DispatchStats>,
}

/// Cloneable handle to the background email pool.
#[derive(Clone)]
pub struct EmailDispatcher {
    inner: Arc<Inner>,
}

impl EmailDispatcher {
    /// Start the pool on the current tokio runtime.
    pub fn start(
        gateway: Arc<dyn EmailGateway>,
        events: Arc<dyn EventResolver>,
        workers: usize,
        capacity: usize,
    ) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let stats = Arc::new(DispatchStats::default());
        let runner = tokio::spawn(run(rx, gateway, events, workers.max(1), stats.clone()));

        tracing::info!(workers, capacity, "Email dispatcher started");

        Self {
            inner: Arc::new(Inner {
                tx: RwLock::new(Some(tx)),
                runner: Mutex::new(Some(runner)),
                stats,
            }),
        }
    }

    /// Queue a delivery. Waits only for queue space, never for the send.
    pub async fn enqueue(&self, task: EmailTask) -> Result<(), AppError> {
        let tx = self
            .inner
            .tx
            .read()
            .await
            .clone()
            .ok_or_else(|| AppError::Unavailable("email dispatcher is shut down".to_string()))?;

        tx.send(task)
            .await
            .map_err(|_| AppError::Unavailable("email queue closed".to_string()))?;
        self.inner.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn stats(&self) -> DispatchSnapshot {
        self.inner.stats.snapshot()
    }

    /// Stop accepting tasks and wait until everything queued has been attempted.
    pub async fn shutdown(&self) {
        // Dropping the last long-lived sender lets the runner see the end of
        // the queue once in-flight enqueues finish.
        self.inner.tx.write().await.take();

        if let Some(runner) = self.inner.runner.lock().await.take()
            && let Err(e) = runner.await
        {
            tracing::error!(error = %e, "Email dispatcher task panicked");
        }

        let stats = self.stats();
        tracing::info!(
            enqueued = stats.enqueued,
            sent = stats.sent,
            failed = stats.failed,
            "Email dispatcher drained"
        );
    }
}

async fn run(
    mut rx: mpsc::Receiver<EmailTask>,
    gateway: Arc<dyn EmailGateway>,
    events: Arc<dyn EventResolver>,
    workers: usize,
    stats: Arc<DispatchStats>,
) {
    let slots = Arc::new(Semaphore::new(workers));
    let mut in_flight = JoinSet::new();

    while let Some(task) = rx.recv().await {
        let Ok(permit) = slots.clone().acquire_owned().await else {
            break;
        };

        let gateway = gateway.clone();
        let events = events.clone();
        let stats = stats.clone();
        in_flight.spawn(async move {
            deliver(task, gateway.as_ref(), events.as_ref(), &stats).await;
            drop(permit);
        });

        while in_flight.try_join_next().is_some() {}
    }

    while in_flight.join_next().await.is_some() {}
}

/// Resolve the event's display fields and call the gateway for the task's kind.
async fn deliver(
    task: EmailTask,
    gateway: &dyn EmailGateway,
    events: &dyn EventResolver,
    stats: &DispatchStats,
) {
    let (event_title, event_date) = match task.event_id {
        Some(event_id) => match events.get_by_id(event_id).await {
            Ok(event) => (
                event.title,
                event.start_time.format(EVENT_DATE_FORMAT).to_string(),
            ),
            Err(e) => {
                tracing::debug!(event_id = %event_id, error = %e, "Event lookup failed, using placeholder");
                (FALLBACK_EVENT_TITLE.to_string(), FALLBACK_EVENT_DATE.to_string())
            }
        },
        None => (FALLBACK_EVENT_TITLE.to_string(), FALLBACK_EVENT_DATE.to_string()),
    };

    let result = match task.kind {
        NotificationKind::Reminder => {
            gateway
                .send_reminder(&task.recipient, &event_title, &event_date)
                .await
        }
        NotificationKind::Cancellation => {
            gateway
                .send_cancellation(&task.recipient, &event_title)
                .await
        }
        NotificationKind::Update => {
            gateway
                .send_update(&task.recipient, &event_title, &task.message)
                .await
        }
    };

    match result {
        Ok(()) => {
            stats.sent.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                notification_id = %task.notification_id,
                kind = %task.kind,
                to = %task.recipient.email,
                "Notification email sent"
            );
        }
        Err(e) => {
            stats.failed.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                notification_id = %task.notification_id,
                kind = %task.kind,
                to = %task.recipient.email,
                error = %e,
                "Notification email delivery failed"
            );
        }
    }
}
