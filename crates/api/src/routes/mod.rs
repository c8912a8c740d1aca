pub mod announcements;
pub mod health;
pub mod notifications;
pub mod schedules;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(schedules::router())
        .merge(announcements::router())
        .merge(notifications::router())
        .with_state(state)
}
