use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Actor, UserNotification};
use crate::state::AppState;
use crate::store::NotificationStore;

pub async fn list_notifications(
    State(state): State<AppState>,
    actor: Actor,
) -> AppResult<Json<Vec<UserNotification>>> {
    let inbox = state
        .store
        .list_user_notifications(actor.tenant_id, actor.id)
        .await?;
    Ok(Json(inbox))
}

pub async fn mark_read(
    State(state): State<AppState>,
    actor: Actor,
    Path(notification_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state
        .store
        .mark_notification_read(actor.tenant_id, actor.id, notification_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
