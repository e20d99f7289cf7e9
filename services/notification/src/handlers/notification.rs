use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use cityconnect_core::identity::UserContext;

use crate::domain::repository::NotificationRepository as _;
use crate::domain::types::Notification;
use crate::error::NotificationServiceError;
use crate::state::AppState;

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct NotificationResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    #[serde(serialize_with = "cityconnect_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub fn notification_response(notification: Notification) -> NotificationResponse {
    NotificationResponse {
        id: notification.id.to_string(),
        report_id: notification.report_id.map(|id| id.to_string()),
        title: notification.title,
        message: notification.message,
        is_read: notification.is_read,
        created_at: notification.created_at,
    }
}

#[derive(Serialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub unread_count: u64,
}

// ── GET /notifications ───────────────────────────────────────────────────────

pub async fn get_notifications(
    ctx: UserContext,
    State(state): State<AppState>,
) -> Result<Json<NotificationListResponse>, NotificationServiceError> {
    let repo = state.notification_repo();
    let notifications = repo.list_by_user(ctx.user_id).await?;
    let unread_count = repo.count_unread(ctx.user_id).await?;
    Ok(Json(NotificationListResponse {
        notifications: notifications
            .into_iter()
            .map(notification_response)
            .collect(),
        unread_count,
    }))
}

// ── PATCH /notifications/{id}/read ───────────────────────────────────────────

pub async fn mark_read(
    ctx: UserContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, NotificationServiceError> {
    state.notification_repo().mark_read(id, ctx.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /notifications/read-all ─────────────────────────────────────────────

pub async fn mark_all_read(
    ctx: UserContext,
    State(state): State<AppState>,
) -> Result<StatusCode, NotificationServiceError> {
    state.notification_repo().mark_all_read(ctx.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
