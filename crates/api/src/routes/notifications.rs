//! Notification inbox routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::types::{CreateNotificationRequest, Notification, NotificationKind};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/notifications",
            get(list_notifications).post(create_notification),
        )
        .route("/api/notifications/{id}/read", put(mark_read))
        .route("/api/notifications/{id}", delete(delete_notification))
}

#[derive(Debug, Deserialize)]
pub struct CreateNotificationBody {
    pub user_id: Uuid,
    pub event_id: Option<Uuid>,
    pub kind: String,
    pub message: String,
    /// Also email the recipient.
    #[serde(default)]
    pub send_email: bool,
}

/// GET /api/notifications: The caller's notifications, newest first.
async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications = state
        .notifications
        .get_notifications_by_user(auth.user_id)
        .await?;
    Ok(Json(notifications))
}

/// POST /api/notifications: Admin-only manual notification.
async fn create_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateNotificationBody>,
) -> Result<(StatusCode, Json<Notification>), AppError> {
    auth.require_admin()?;
    let kind: NotificationKind = body.kind.parse()?;

    let req = CreateNotificationRequest {
        user_id: body.user_id,
        event_id: body.event_id,
        kind,
        message: body.message,
    };

    let notification = if body.send_email {
        let user = state.users.get_by_id(req.user_id).await?;
        state
            .notifications
            .create_notification_with_email(&req, &user.email, &user.name)
            .await?
    } else {
        state.notifications.create_notification(&req).await?
    };

    Ok((StatusCode::CREATED, Json(notification)))
}

/// PUT /api/notifications/:id/read
async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .notifications
        .mark_notification_as_read(id, auth.user_id)
        .await?;
    Ok(Json(serde_json::json!({"read": true})))
}

/// DELETE /api/notifications/:id
async fn delete_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .notifications
        .delete_notification(id, auth.user_id)
        .await?;
    Ok(Json(serde_json::json!({"deleted": true})))
}
