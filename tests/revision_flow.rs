mod common;

use anyhow::Result;
use axum::http::StatusCode;
use chrono::Utc;
use common::{body_to_vec, TestApp};
use docflow::lifecycle::engine::{NewDocumentInput, NewRevisionInput};
use docflow::lifecycle::revision::RevisionChain;
use docflow::lifecycle::LifecycleError;
use docflow::models::{
    Actor, Document, DocumentStatus, FileDescriptor, Revision, Role,
};
use docflow::store::{DocumentStore, StoreError};
use serde_json::json;
use uuid::Uuid;

fn actor(role: Role, tenant_id: Uuid) -> Actor {
    Actor {
        id: Uuid::new_v4(),
        role,
        tenant_id,
    }
}

fn file() -> FileDescriptor {
    FileDescriptor {
        file_link: "s3://docs/safety-manual".to_string(),
        file_name: "safety-manual.pdf".to_string(),
        file_type: Some("application/pdf".to_string()),
        file_size: 4096,
    }
}

fn new_document_input(approving_user_id: Option<Uuid>) -> NewDocumentInput {
    NewDocumentInput {
        contract_id: None,
        document_type_id: None,
        code: "SAF-010".to_string(),
        title: "Safety manual".to_string(),
        description: None,
        area: None,
        responsible_user_id: None,
        approving_user_id,
        file: file(),
    }
}

/// A document whose current revision is already approved, inserted straight
/// into the store so tests can start mid-chain with arbitrary numbering.
fn approved_document(tenant_id: Uuid, revision_number: &str) -> Document {
    let approver = Uuid::new_v4();
    let mut revision = Revision::new(
        revision_number,
        DocumentStatus::Approved,
        Some(approver),
        file(),
        approver,
    );
    revision.approved_by_user_id = Some(approver);
    revision.approval_date = Some(Utc::now());
    let now = Utc::now();
    Document {
        id: Uuid::new_v4(),
        tenant_id,
        contract_id: None,
        document_type_id: None,
        code: "SAF-010".to_string(),
        title: "Safety manual".to_string(),
        description: None,
        area: None,
        status: DocumentStatus::Approved,
        responsible_user_id: approver,
        revisions: RevisionChain::new(revision),
        last_status_change_date: now,
        created_at: now,
        is_deleted: false,
        deleted_at: None,
    }
}

// Once the pending revision is approved, the next one opens as pending with
// the incremented number.
#[tokio::test]
async fn approved_document_opens_next_numeric_revision() -> Result<()> {
    let app = TestApp::new()?;
    let tenant = Uuid::new_v4();
    let editor = actor(Role::Editor, tenant);
    let admin = actor(Role::Admin, tenant);

    let document = app
        .state
        .engine
        .create_document(new_document_input(Some(admin.id)), &editor)
        .await?;
    app.state
        .engine
        .submit_for_approval(document.id, None, &editor)
        .await?;
    app.state
        .engine
        .update_revision_status(document.id, DocumentStatus::Approved, None, &admin)
        .await?;

    let revised = app
        .state
        .engine
        .create_new_revision(
            document.id,
            NewRevisionInput {
                observation: Some("clarified lockout steps".to_string()),
                approving_user_id: None,
                file: file(),
            },
            &editor,
        )
        .await?;
    assert_eq!(revised.status, DocumentStatus::PendingApproval);
    assert_eq!(revised.current_revision().revision_number, "R01");
    assert_eq!(revised.current_revision().approving_user_id, Some(admin.id));
    assert_eq!(revised.revisions.len(), 2);
    assert!(revised.revisions.invariant_holds());
    Ok(())
}

#[tokio::test]
async fn letter_revision_scheme_advances() -> Result<()> {
    let app = TestApp::new()?;
    let tenant = Uuid::new_v4();
    let editor = actor(Role::Editor, tenant);

    let document = approved_document(tenant, "B");
    app.state.store.insert_document(document.clone()).await?;

    let revised = app
        .state
        .engine
        .create_new_revision(
            document.id,
            NewRevisionInput {
                observation: None,
                approving_user_id: Some(Uuid::new_v4()),
                file: file(),
            },
            &editor,
        )
        .await?;
    assert_eq!(revised.current_revision().revision_number, "C");
    Ok(())
}

#[tokio::test]
async fn exhausted_letter_scheme_is_refused() -> Result<()> {
    let app = TestApp::new()?;
    let tenant = Uuid::new_v4();
    let editor = actor(Role::Editor, tenant);

    let document = approved_document(tenant, "Z");
    app.state.store.insert_document(document.clone()).await?;

    let err = app
        .state
        .engine
        .create_new_revision(
            document.id,
            NewRevisionInput {
                observation: None,
                approving_user_id: Some(Uuid::new_v4()),
                file: file(),
            },
            &editor,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::UnsupportedRevisionScheme(_)));
    Ok(())
}

// An unrecognized scheme surfaces as 422 over HTTP, while the display
// endpoint falls back to the marker suffix instead of failing.
#[tokio::test]
async fn unrecognized_scheme_maps_to_unprocessable() -> Result<()> {
    let app = TestApp::new()?;
    let tenant = Uuid::new_v4();
    let editor_id = Uuid::new_v4();
    let token = app.token_for(editor_id, Role::Editor, tenant)?;

    let document = approved_document(tenant, "1.0");
    app.state.store.insert_document(document.clone()).await?;

    let response = app
        .post_json(
            &format!("/api/documents/{}/revisions", document.id),
            &json!({
                "file": {
                    "file_link": "s3://docs/safety-manual",
                    "file_name": "safety-manual.pdf",
                    "file_type": "application/pdf",
                    "file_size": 4096
                }
            }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = serde_json::from_slice(&body_to_vec(response.into_body()).await?)?;
    assert_eq!(body["kind"], "unsupported_revision_scheme");

    let response = app
        .get(
            &format!("/api/documents/{}/next-revision", document.id),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&body_to_vec(response.into_body()).await?)?;
    assert_eq!(body["current"], "1.0");
    assert_eq!(body["next"], "1.0-Nova");
    Ok(())
}

#[tokio::test]
async fn stale_status_snapshot_is_rejected_by_the_store() -> Result<()> {
    let app = TestApp::new()?;
    let tenant = Uuid::new_v4();
    let editor = actor(Role::Editor, tenant);

    let document = app
        .state
        .engine
        .create_document(new_document_input(None), &editor)
        .await?;

    // Writer read the document as pending, but it is still draft.
    let mut stale = document.clone();
    stale.status = DocumentStatus::Approved;
    let err = app
        .state
        .store
        .update_document_if_status(DocumentStatus::PendingApproval, stale)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
    Ok(())
}

// Two approvers race on the same pending revision: exactly one decision
// lands, the other observes a conflict or an invalid transition depending on
// when its status check ran.
#[tokio::test]
async fn concurrent_decisions_have_exactly_one_winner() -> Result<()> {
    let app = TestApp::new()?;
    let tenant = Uuid::new_v4();
    let editor = actor(Role::Editor, tenant);
    let first = actor(Role::Admin, tenant);
    let second = actor(Role::Admin, tenant);

    let document = app
        .state
        .engine
        .create_document(new_document_input(Some(first.id)), &editor)
        .await?;
    app.state
        .engine
        .submit_for_approval(document.id, None, &editor)
        .await?;

    let (a, b) = tokio::join!(
        app.state.engine.update_revision_status(
            document.id,
            DocumentStatus::Approved,
            None,
            &first,
        ),
        app.state.engine.update_revision_status(
            document.id,
            DocumentStatus::Rejected,
            Some("duplicate submission".to_string()),
            &second,
        ),
    );

    let winners = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(winners, 1, "exactly one decision must land");
    let loser = if a.is_ok() { b.unwrap_err() } else { a.unwrap_err() };
    assert!(matches!(
        loser,
        LifecycleError::ConcurrentModification | LifecycleError::InvalidTransition(_)
    ));

    // The stored document reflects a single terminal decision.
    let stored = app.state.engine.get_document(document.id, &editor).await?;
    assert!(stored.status.is_terminal());
    assert_eq!(stored.revisions.len(), 1);
    assert!(stored.revisions.invariant_holds());
    Ok(())
}

// A soft delete leaves the status untouched, so a decision whose snapshot
// predates the delete must still lose: the stale write may not resurrect
// the document.
#[tokio::test]
async fn soft_delete_wins_against_a_stale_decision() -> Result<()> {
    let app = TestApp::new()?;
    let tenant = Uuid::new_v4();
    let editor = actor(Role::Editor, tenant);
    let admin = actor(Role::Admin, tenant);

    let document = app
        .state
        .engine
        .create_document(new_document_input(Some(admin.id)), &editor)
        .await?;
    app.state
        .engine
        .submit_for_approval(document.id, None, &editor)
        .await?;

    // Decision-side snapshot, taken before the delete lands.
    let mut stale = app.state.store.get_document(tenant, document.id).await?;
    app.state.engine.soft_delete(document.id, &editor).await?;

    stale.status = DocumentStatus::Approved;
    let err = app
        .state
        .store
        .update_document_if_status(DocumentStatus::PendingApproval, stale)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));

    let stored = app.state.store.get_document(tenant, document.id).await?;
    assert!(stored.is_deleted);
    assert_eq!(stored.status, DocumentStatus::PendingApproval);
    Ok(())
}

#[tokio::test]
async fn deleted_documents_refuse_workflow_operations() -> Result<()> {
    let app = TestApp::new()?;
    let tenant = Uuid::new_v4();
    let editor = actor(Role::Editor, tenant);

    let document = app
        .state
        .engine
        .create_document(new_document_input(Some(Uuid::new_v4())), &editor)
        .await?;
    app.state.engine.soft_delete(document.id, &editor).await?;

    let err = app
        .state
        .engine
        .submit_for_approval(document.id, None, &editor)
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::InvalidTransition(_)));

    let err = app
        .state
        .engine
        .soft_delete(document.id, &editor)
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::InvalidTransition(_)));
    Ok(())
}
