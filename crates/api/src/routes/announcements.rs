//! Organizer announcements to an event's participants.

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::types::NotificationKind;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/events/{id}/announcements", post(announce))
}

#[derive(Debug, Deserialize)]
pub struct AnnouncementRequest {
    /// `update` or `cancellation`; defaults to `update`.
    pub kind: Option<String>,
    pub message: String,
}

/// POST /api/events/:id/announcements: Notify every participant.
async fn announce(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(event_id): Path<Uuid>,
    Json(body): Json<AnnouncementRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actor = auth.require_organizer()?;
    let kind = match body.kind.as_deref() {
        Some(kind) => kind.parse()?,
        None => NotificationKind::Update,
    };

    let sent = state
        .broadcaster
        .notify_participants(&actor, event_id, kind, &body.message)
        .await?;
    Ok(Json(json!({ "sent": sent })))
}
