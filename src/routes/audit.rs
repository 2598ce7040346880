use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Actor, AuditEntry};
use crate::state::AppState;
use crate::store::AuditStore;

#[derive(Deserialize)]
pub struct AuditQuery {
    pub entity_id: Option<Uuid>,
}

pub async fn list_audit(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<Vec<AuditEntry>>> {
    if !actor.role.is_admin() {
        return Err(AppError::forbidden(
            "only administrators may read the audit log",
        ));
    }
    let entries = state
        .store
        .list_audit(actor.tenant_id, query.entity_id)
        .await?;
    Ok(Json(entries))
}
