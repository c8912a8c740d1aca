//! Schedule routes for event organizers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::types::{JobType, ScheduleJob};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/events/{id}/schedules",
            post(create_schedule).get(list_schedules),
        )
        .route("/api/events/schedules/{id}", delete(delete_schedule))
}

#[derive(Debug, Deserialize)]
pub struct CreateScheduleRequest {
    /// `reminder` or `end_event`, any case.
    pub job_type: String,
    pub run_at: DateTime<Utc>,
}

/// POST /api/events/:id/schedules: Schedule a job for an event.
async fn create_schedule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(event_id): Path<Uuid>,
    Json(body): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<ScheduleJob>), AppError> {
    let actor = auth.require_organizer()?;
    let job_type: JobType = body.job_type.parse()?;

    let job = state
        .schedules
        .create_schedule(&actor, event_id, job_type, body.run_at)
        .await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/events/:id/schedules: List an event's jobs.
async fn list_schedules(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Vec<ScheduleJob>>, AppError> {
    let actor = auth.require_organizer()?;
    let jobs = state
        .schedules
        .get_schedules_by_event(&actor, event_id)
        .await?;
    Ok(Json(jobs))
}

/// DELETE /api/events/schedules/:id: Remove a pending job.
async fn delete_schedule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(schedule_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actor = auth.require_organizer()?;
    state.schedules.delete_schedule(&actor, schedule_id).await?;
    Ok(Json(serde_json::json!({"deleted": true})))
}
