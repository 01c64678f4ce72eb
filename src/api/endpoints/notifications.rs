//! Patient notification inbox.

use axum::extract::State;
use axum::Extension;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiJson};
use crate::api::types::{message, success, ApiContext, ApiResult, Message};
use crate::auth::AuthContext;
use crate::db::repository;
use crate::models::{Notification, User};

fn current(auth: &AuthContext) -> Result<&User, ApiError> {
    auth.patient().ok_or(ApiError::Unauthorized)
}

#[derive(Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
}

/// `GET /api/notifications`: newest first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<NotificationsResponse> {
    let user = current(&auth)?;
    let conn = ctx.core.open_db()?;
    let notifications = repository::list_notifications_for_user(&conn, &user.id)?;
    Ok(success(NotificationsResponse { notifications }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRef {
    pub notification_id: Uuid,
}

/// `POST /api/notifications/mark-read`
pub async fn mark_read(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(body): ApiJson<NotificationRef>,
) -> ApiResult<Message> {
    let user = current(&auth)?;
    let conn = ctx.core.open_db()?;
    repository::mark_notification_read(&conn, &user.id, &body.notification_id)?;
    Ok(message("Notification marked as read"))
}
