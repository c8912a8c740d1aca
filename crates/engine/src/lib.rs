//! Scheduling core: the job scheduler plus the services organizers use to
//! manage schedules and reach their participants.

pub mod broadcast;
pub mod schedule;
pub mod scheduler;

pub use broadcast::EventBroadcaster;
pub use schedule::ScheduleService;
pub use scheduler::{Scheduler, SchedulerHandle, TickReport};
