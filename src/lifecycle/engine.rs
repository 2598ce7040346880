use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{Actor, Document, DocumentStatus, FileDescriptor, Revision, Role};
use crate::store::DocumentStore;

use super::approval;
use super::audit::{AuditRecorder, ENTITY_DOCUMENT};
use super::distribution::DistributionRuleResolver;
use super::notification::{DispatchOutcome, NotificationDispatcher};
use super::revision::{self, RevisionChain, FIRST_REVISION};
use super::LifecycleError;

#[derive(Debug, Clone, Deserialize)]
pub struct NewDocumentInput {
    pub contract_id: Option<Uuid>,
    pub document_type_id: Option<Uuid>,
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    pub area: Option<String>,
    /// Defaults to the creating actor.
    pub responsible_user_id: Option<Uuid>,
    pub approving_user_id: Option<Uuid>,
    pub file: FileDescriptor,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRevisionInput {
    pub observation: Option<String>,
    /// Carried forward from the previous revision when absent.
    pub approving_user_id: Option<Uuid>,
    pub file: FileDescriptor,
}

/// Result of an approve/reject decision. `dispatch` is present only on
/// approval and is purely informational.
#[derive(Debug)]
pub struct DecisionOutcome {
    pub document: Document,
    pub dispatch: Option<DispatchOutcome>,
}

/// Orchestrator of the per-document state machine and the sole writer of
/// document status and revision data. Every mutation is an optimistic
/// read-validate-write cycle: the write lands only if the status still
/// matches what this operation read.
pub struct DocumentLifecycleEngine {
    documents: Arc<dyn DocumentStore>,
    resolver: DistributionRuleResolver,
    dispatcher: NotificationDispatcher,
    audit: AuditRecorder,
}

impl DocumentLifecycleEngine {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        resolver: DistributionRuleResolver,
        dispatcher: NotificationDispatcher,
        audit: AuditRecorder,
    ) -> Self {
        Self {
            documents,
            resolver,
            dispatcher,
            audit,
        }
    }

    pub async fn create_document(
        &self,
        input: NewDocumentInput,
        actor: &Actor,
    ) -> Result<Document, LifecycleError> {
        if actor.role == Role::Viewer {
            return Err(LifecycleError::Forbidden(
                "viewers cannot create documents".to_string(),
            ));
        }
        let code = input.code.trim().to_string();
        if code.is_empty() {
            return Err(LifecycleError::Validation(
                "document code must not be empty".to_string(),
            ));
        }
        validate_file(&input.file)?;

        let now = Utc::now();
        let revision = Revision::new(
            FIRST_REVISION,
            DocumentStatus::Draft,
            input.approving_user_id,
            input.file,
            actor.id,
        );
        let document = Document {
            id: Uuid::new_v4(),
            tenant_id: actor.tenant_id,
            contract_id: input.contract_id,
            document_type_id: input.document_type_id,
            code,
            title: input.title.trim().to_string(),
            description: input.description,
            area: input.area,
            status: DocumentStatus::Draft,
            responsible_user_id: input.responsible_user_id.unwrap_or(actor.id),
            revisions: RevisionChain::new(revision),
            last_status_change_date: now,
            created_at: now,
            is_deleted: false,
            deleted_at: None,
        };

        self.documents.insert_document(document.clone()).await?;
        self.audit
            .record(
                actor.tenant_id,
                actor.id,
                "create",
                ENTITY_DOCUMENT,
                document.id,
                format!("created {} at revision {}", document.code, FIRST_REVISION),
            )
            .await;
        info!(document_id = %document.id, code = %document.code, "document created");
        Ok(document)
    }

    pub async fn submit_for_approval(
        &self,
        document_id: Uuid,
        approving_user_id: Option<Uuid>,
        actor: &Actor,
    ) -> Result<Document, LifecycleError> {
        let result = self
            .try_submit(document_id, approving_user_id, actor)
            .await;
        self.record_if_denied("submit", document_id, actor, &result)
            .await;
        result
    }

    async fn try_submit(
        &self,
        document_id: Uuid,
        approving_user_id: Option<Uuid>,
        actor: &Actor,
    ) -> Result<Document, LifecycleError> {
        let mut document = self.load_active(actor, document_id).await?;
        if actor.role == Role::Viewer {
            return Err(LifecycleError::Forbidden(
                "viewers cannot submit documents for approval".to_string(),
            ));
        }
        if document.status != DocumentStatus::Draft {
            return Err(LifecycleError::InvalidTransition(format!(
                "only draft documents can be submitted (current status: {})",
                document.status
            )));
        }
        let approver = approving_user_id
            .or(document.current_revision().approving_user_id)
            .ok_or_else(|| {
                LifecycleError::Validation(
                    "an approving user must be assigned before submission".to_string(),
                )
            })?;

        let now = Utc::now();
        {
            let current = document.revisions.current_mut();
            current.approving_user_id = Some(approver);
            current.status = DocumentStatus::PendingApproval;
        }
        document.status = DocumentStatus::PendingApproval;
        document.last_status_change_date = now;

        self.documents
            .update_document_if_status(DocumentStatus::Draft, document.clone())
            .await?;
        self.audit
            .record(
                actor.tenant_id,
                actor.id,
                "submit",
                ENTITY_DOCUMENT,
                document.id,
                format!("submitted {} for approval by {}", document.code, approver),
            )
            .await;
        Ok(document)
    }

    /// Opens the next revision of an approved document. The new revision
    /// starts in `pending_approval` with the approver carried forward unless
    /// overridden.
    pub async fn create_new_revision(
        &self,
        document_id: Uuid,
        input: NewRevisionInput,
        actor: &Actor,
    ) -> Result<Document, LifecycleError> {
        let result = self.try_new_revision(document_id, input, actor).await;
        self.record_if_denied("new_revision", document_id, actor, &result)
            .await;
        result
    }

    async fn try_new_revision(
        &self,
        document_id: Uuid,
        input: NewRevisionInput,
        actor: &Actor,
    ) -> Result<Document, LifecycleError> {
        let mut document = self.load_active(actor, document_id).await?;
        if actor.role == Role::Viewer {
            return Err(LifecycleError::Forbidden(
                "viewers cannot open new revisions".to_string(),
            ));
        }
        if document.status != DocumentStatus::Approved {
            return Err(LifecycleError::InvalidTransition(
                "a new revision may only be opened once the previous one is approved".to_string(),
            ));
        }
        validate_file(&input.file)?;

        let current_number = document.current_revision().revision_number.clone();
        let next_number = revision::next_revision_number(&current_number)
            .map_err(|err| LifecycleError::UnsupportedRevisionScheme(err.to_string()))?;
        let approver = input
            .approving_user_id
            .or(document.current_revision().approving_user_id)
            .ok_or_else(|| {
                LifecycleError::Validation(
                    "an approving user must be assigned for the new revision".to_string(),
                )
            })?;

        let revision = Revision::new(
            next_number.clone(),
            DocumentStatus::PendingApproval,
            Some(approver),
            input.file,
            actor.id,
        );
        document
            .revisions
            .append(revision)
            .map_err(|err| LifecycleError::InvalidTransition(err.to_string()))?;
        document.status = DocumentStatus::PendingApproval;
        document.last_status_change_date = Utc::now();

        self.documents
            .update_document_if_status(DocumentStatus::Approved, document.clone())
            .await?;

        let mut details = format!("opened revision {} of {}", next_number, document.code);
        if let Some(observation) = input
            .observation
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty())
        {
            details.push_str(": ");
            details.push_str(observation);
        }
        self.audit
            .record(
                actor.tenant_id,
                actor.id,
                "new_revision",
                ENTITY_DOCUMENT,
                document.id,
                details,
            )
            .await;
        Ok(document)
    }

    /// Approves or rejects the pending revision. On approval the recipient
    /// set is resolved and notified before this returns; the dispatch
    /// outcome is reported to the caller but can never undo the approval.
    pub async fn update_revision_status(
        &self,
        document_id: Uuid,
        new_status: DocumentStatus,
        observation: Option<String>,
        actor: &Actor,
    ) -> Result<DecisionOutcome, LifecycleError> {
        let action = match new_status {
            DocumentStatus::Rejected => "reject",
            _ => "approve",
        };
        let result = self
            .try_decide(document_id, new_status, observation, actor)
            .await;
        self.record_if_denied(action, document_id, actor, &result)
            .await;
        result
    }

    async fn try_decide(
        &self,
        document_id: Uuid,
        new_status: DocumentStatus,
        observation: Option<String>,
        actor: &Actor,
    ) -> Result<DecisionOutcome, LifecycleError> {
        if !new_status.is_terminal() {
            return Err(LifecycleError::Validation(format!(
                "decision must be approved or rejected, got {new_status}"
            )));
        }
        let mut document = self.load_active(actor, document_id).await?;
        if document.status != DocumentStatus::PendingApproval {
            return Err(LifecycleError::InvalidTransition(format!(
                "only pending documents can be decided (current status: {})",
                document.status
            )));
        }
        if !approval::can_decide(actor, &document) {
            return Err(LifecycleError::Forbidden(
                "only the designated approver or an administrator may decide this revision"
                    .to_string(),
            ));
        }
        let observation = observation
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty());
        if new_status == DocumentStatus::Rejected && observation.is_none() {
            return Err(LifecycleError::Validation(
                "a rejection requires an observation explaining the decision".to_string(),
            ));
        }

        let now = Utc::now();
        {
            let current = document.revisions.current_mut();
            current.status = new_status;
            current.approved_by_user_id = Some(actor.id);
            current.approval_date = Some(now);
            current.approver_observation = observation.clone();
        }
        document.status = new_status;
        document.last_status_change_date = now;

        self.documents
            .update_document_if_status(DocumentStatus::PendingApproval, document.clone())
            .await?;

        let action = match new_status {
            DocumentStatus::Rejected => "reject",
            _ => "approve",
        };
        self.audit
            .record(
                actor.tenant_id,
                actor.id,
                action,
                ENTITY_DOCUMENT,
                document.id,
                observation.unwrap_or_else(|| format!("{} {}", action, document.code)),
            )
            .await;

        // The decision is committed at this point; anything below is
        // informational fan-out that must not fail the call.
        let dispatch = if new_status == DocumentStatus::Approved {
            let recipients = match self.resolver.resolve(&document).await {
                Ok(recipients) => recipients,
                Err(err) => {
                    warn!(document_id = %document.id, error = %err, "distribution rule resolution failed");
                    BTreeSet::new()
                }
            };
            Some(self.dispatcher.dispatch(&document, &recipients).await)
        } else {
            None
        };

        info!(document_id = %document.id, status = %new_status, "revision decided");
        Ok(DecisionOutcome { document, dispatch })
    }

    /// Administrative override outside the normal approval flow: rewrites
    /// the status of the document and its current revision together, keeping
    /// the chain invariant intact. Restricted to admin-equivalent roles.
    pub async fn force_status(
        &self,
        document_id: Uuid,
        status: DocumentStatus,
        actor: &Actor,
    ) -> Result<Document, LifecycleError> {
        let result = self.try_force_status(document_id, status, actor).await;
        self.record_if_denied("force_status", document_id, actor, &result)
            .await;
        result
    }

    async fn try_force_status(
        &self,
        document_id: Uuid,
        status: DocumentStatus,
        actor: &Actor,
    ) -> Result<Document, LifecycleError> {
        if !actor.role.is_admin() {
            return Err(LifecycleError::Forbidden(
                "only administrators may force a document status".to_string(),
            ));
        }
        let mut document = self.load_active(actor, document_id).await?;
        let previous = document.status;
        if previous == status {
            return Err(LifecycleError::Validation(format!(
                "document is already {status}"
            )));
        }

        document.revisions.current_mut().status = status;
        document.status = status;
        document.last_status_change_date = Utc::now();
        debug_assert!(document.revisions.invariant_holds());

        self.documents
            .update_document_if_status(previous, document.clone())
            .await?;
        self.audit
            .record(
                actor.tenant_id,
                actor.id,
                "force_status",
                ENTITY_DOCUMENT,
                document.id,
                format!("forced status from {previous} to {status}"),
            )
            .await;
        warn!(document_id = %document.id, %previous, %status, "status forced outside approval flow");
        Ok(document)
    }

    /// Soft delete. The record stays for reporting; every workflow operation
    /// refuses deleted documents.
    pub async fn soft_delete(
        &self,
        document_id: Uuid,
        actor: &Actor,
    ) -> Result<(), LifecycleError> {
        let result = self.try_soft_delete(document_id, actor).await;
        self.record_if_denied("delete", document_id, actor, &result)
            .await;
        result
    }

    async fn try_soft_delete(
        &self,
        document_id: Uuid,
        actor: &Actor,
    ) -> Result<(), LifecycleError> {
        let mut document = self
            .documents
            .get_document(actor.tenant_id, document_id)
            .await?;
        if document.is_deleted {
            return Err(LifecycleError::InvalidTransition(
                "document has already been deleted".to_string(),
            ));
        }
        if !(actor.role.is_admin() || actor.id == document.responsible_user_id) {
            return Err(LifecycleError::Forbidden(
                "only administrators or the responsible user may delete a document".to_string(),
            ));
        }

        document.is_deleted = true;
        document.deleted_at = Some(Utc::now());
        self.documents
            .update_document_if_status(document.status, document.clone())
            .await?;
        self.audit
            .record(
                actor.tenant_id,
                actor.id,
                "delete",
                ENTITY_DOCUMENT,
                document.id,
                format!("soft-deleted {}", document.code),
            )
            .await;
        Ok(())
    }

    pub async fn get_document(
        &self,
        document_id: Uuid,
        actor: &Actor,
    ) -> Result<Document, LifecycleError> {
        Ok(self
            .documents
            .get_document(actor.tenant_id, document_id)
            .await?)
    }

    pub async fn list_documents(&self, actor: &Actor) -> Result<Vec<Document>, LifecycleError> {
        Ok(self.documents.list_documents(actor.tenant_id).await?)
    }

    async fn load_active(
        &self,
        actor: &Actor,
        document_id: Uuid,
    ) -> Result<Document, LifecycleError> {
        let document = self
            .documents
            .get_document(actor.tenant_id, document_id)
            .await?;
        if document.is_deleted {
            return Err(LifecycleError::InvalidTransition(
                "document has been deleted".to_string(),
            ));
        }
        Ok(document)
    }

    async fn record_if_denied<T>(
        &self,
        action: &str,
        document_id: Uuid,
        actor: &Actor,
        result: &Result<T, LifecycleError>,
    ) {
        if let Err(err) = result {
            if err.is_audited() {
                self.audit
                    .record(
                        actor.tenant_id,
                        actor.id,
                        &format!("{action}_denied"),
                        ENTITY_DOCUMENT,
                        document_id,
                        err.to_string(),
                    )
                    .await;
            }
        }
    }
}

fn validate_file(file: &FileDescriptor) -> Result<(), LifecycleError> {
    if file.file_link.trim().is_empty() || file.file_name.trim().is_empty() {
        return Err(LifecycleError::Validation(
            "a stored file descriptor (link and name) is required".to_string(),
        ));
    }
    Ok(())
}
