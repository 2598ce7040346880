use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::lifecycle::revision::display_next_revision_number;
use crate::lifecycle::{DispatchOutcome, NewDocumentInput, NewRevisionInput};
use crate::models::{Actor, DistributionEvent, Document, DocumentStatus};
use crate::state::AppState;
use crate::store::NotificationStore;

#[derive(Deserialize)]
pub struct DecisionRequest {
    pub status: DocumentStatus,
    pub observation: Option<String>,
}

#[derive(Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub approving_user_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct ForceStatusRequest {
    pub status: DocumentStatus,
}

#[derive(Serialize)]
pub struct DecisionResponse {
    pub document: Document,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<DispatchOutcome>,
}

#[derive(Serialize)]
pub struct NextRevisionResponse {
    pub current: String,
    pub next: String,
}

pub async fn create_document(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<NewDocumentInput>,
) -> AppResult<(StatusCode, Json<Document>)> {
    let document = state.engine.create_document(payload, &actor).await?;
    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn list_documents(
    State(state): State<AppState>,
    actor: Actor,
) -> AppResult<Json<Vec<Document>>> {
    let documents = state.engine.list_documents(&actor).await?;
    Ok(Json(documents))
}

pub async fn get_document(
    State(state): State<AppState>,
    actor: Actor,
    Path(document_id): Path<Uuid>,
) -> AppResult<Json<Document>> {
    let document = state.engine.get_document(document_id, &actor).await?;
    Ok(Json(document))
}

pub async fn submit_document(
    State(state): State<AppState>,
    actor: Actor,
    Path(document_id): Path<Uuid>,
    Json(payload): Json<SubmitRequest>,
) -> AppResult<Json<Document>> {
    let document = state
        .engine
        .submit_for_approval(document_id, payload.approving_user_id, &actor)
        .await?;
    Ok(Json(document))
}

pub async fn create_revision(
    State(state): State<AppState>,
    actor: Actor,
    Path(document_id): Path<Uuid>,
    Json(payload): Json<NewRevisionInput>,
) -> AppResult<(StatusCode, Json<Document>)> {
    let document = state
        .engine
        .create_new_revision(document_id, payload, &actor)
        .await?;
    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn decide_revision(
    State(state): State<AppState>,
    actor: Actor,
    Path(document_id): Path<Uuid>,
    Json(payload): Json<DecisionRequest>,
) -> AppResult<Json<DecisionResponse>> {
    let outcome = state
        .engine
        .update_revision_status(document_id, payload.status, payload.observation, &actor)
        .await?;
    Ok(Json(DecisionResponse {
        document: outcome.document,
        notifications: outcome.dispatch,
    }))
}

pub async fn force_status(
    State(state): State<AppState>,
    actor: Actor,
    Path(document_id): Path<Uuid>,
    Json(payload): Json<ForceStatusRequest>,
) -> AppResult<Json<Document>> {
    let document = state
        .engine
        .force_status(document_id, payload.status, &actor)
        .await?;
    Ok(Json(document))
}

pub async fn next_revision(
    State(state): State<AppState>,
    actor: Actor,
    Path(document_id): Path<Uuid>,
) -> AppResult<Json<NextRevisionResponse>> {
    let document = state.engine.get_document(document_id, &actor).await?;
    let current = document.current_revision().revision_number.clone();
    let next = display_next_revision_number(&current);
    Ok(Json(NextRevisionResponse { current, next }))
}

pub async fn list_distribution_log(
    State(state): State<AppState>,
    actor: Actor,
    Path(document_id): Path<Uuid>,
) -> AppResult<Json<Vec<DistributionEvent>>> {
    // 404s for foreign tenants before the log is consulted
    state.engine.get_document(document_id, &actor).await?;
    let events = state
        .store
        .distribution_events_for(actor.tenant_id, document_id)
        .await?;
    Ok(Json(events))
}

pub async fn delete_document(
    State(state): State<AppState>,
    actor: Actor,
    Path(document_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.engine.soft_delete(document_id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}
