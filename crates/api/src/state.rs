//! Shared application state for the Axum API server.

use std::sync::Arc;

use herald_common::config::AppConfig;
use herald_common::repository::{Stores, UserResolver};
use herald_engine::{EventBroadcaster, ScheduleService};
use herald_notifier::NotificationService;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub schedules: ScheduleService,
    pub notifications: NotificationService,
    pub broadcaster: EventBroadcaster,
    pub users: Arc<dyn UserResolver>,
}

impl AppState {
    pub fn new(config: AppConfig, stores: &Stores, notifications: NotificationService) -> Self {
        let sender = Arc::new(notifications.clone());
        Self {
            config,
            schedules: ScheduleService::new(stores.jobs.clone(), stores.events.clone()),
            broadcaster: EventBroadcaster::new(
                stores.events.clone(),
                stores.participants.clone(),
                stores.users.clone(),
                sender,
            ),
            notifications,
            users: stores.users.clone(),
        }
    }
}
