use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Actor, DistributionRule};
use crate::state::AppState;
use crate::store::DirectoryStore;

#[derive(Deserialize)]
pub struct UpsertRuleRequest {
    pub area: String,
    pub user_ids: Vec<Uuid>,
}

pub async fn list_rules(
    State(state): State<AppState>,
    actor: Actor,
) -> AppResult<Json<Vec<DistributionRule>>> {
    if !actor.role.is_admin() {
        return Err(AppError::forbidden(
            "only administrators may view distribution rules",
        ));
    }
    let rules = state.store.list_rules(actor.tenant_id).await?;
    Ok(Json(rules))
}

pub async fn upsert_rule(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<UpsertRuleRequest>,
) -> AppResult<StatusCode> {
    if !actor.role.is_admin() {
        return Err(AppError::forbidden(
            "only administrators may edit distribution rules",
        ));
    }
    let area = payload.area.trim().to_string();
    if area.is_empty() {
        return Err(AppError::bad_request("area must not be empty"));
    }
    state
        .store
        .upsert_rule(DistributionRule {
            id: Uuid::new_v4(),
            tenant_id: actor.tenant_id,
            area,
            user_ids: payload.user_ids,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
