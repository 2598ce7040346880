use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lifecycle::revision::RevisionChain;

/// Role carried by the authenticated caller. Admin-equivalent roles may
/// decide any pending approval and may use the administrative override paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Viewer,
    Editor,
    Approver,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}

/// The calling identity, as resolved by the auth layer. The engine trusts
/// these values; token verification happens before an `Actor` exists.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
    pub tenant_id: Uuid,
}

/// Workflow state of a document. Always mirrors the status of the current
/// revision; mutated exclusively by the lifecycle engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    PendingApproval,
    Approved,
    Rejected,
}

impl DocumentStatus {
    /// Terminal statuses freeze a revision; only the last chain entry may be
    /// non-terminal.
    pub fn is_terminal(self) -> bool {
        matches!(self, DocumentStatus::Approved | DocumentStatus::Rejected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::PendingApproval => "pending_approval",
            DocumentStatus::Approved => "approved",
            DocumentStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor of an already-stored file. The raw bytes live with the external
/// storage collaborator; this service only records the pointer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub file_link: String,
    pub file_name: String,
    pub file_type: Option<String>,
    pub file_size: i64,
}

/// One entry of a document's revision chain. Immutable once its status
/// becomes terminal; the approval fields are stamped exactly once.
#[derive(Debug, Clone, Serialize)]
pub struct Revision {
    pub revision_number: String,
    pub status: DocumentStatus,
    pub approving_user_id: Option<Uuid>,
    pub approved_by_user_id: Option<Uuid>,
    pub approval_date: Option<DateTime<Utc>>,
    pub approver_observation: Option<String>,
    pub file_link: String,
    pub file_name: String,
    pub file_type: Option<String>,
    pub file_size: i64,
    pub created_by_user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Revision {
    pub fn new(
        revision_number: impl Into<String>,
        status: DocumentStatus,
        approving_user_id: Option<Uuid>,
        file: FileDescriptor,
        created_by_user_id: Uuid,
    ) -> Self {
        Self {
            revision_number: revision_number.into(),
            status,
            approving_user_id,
            approved_by_user_id: None,
            approval_date: None,
            approver_observation: None,
            file_link: file.file_link,
            file_name: file.file_name,
            file_type: file.file_type,
            file_size: file.file_size,
            created_by_user_id,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub contract_id: Option<Uuid>,
    pub document_type_id: Option<Uuid>,
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    pub area: Option<String>,
    pub status: DocumentStatus,
    pub responsible_user_id: Uuid,
    pub revisions: RevisionChain,
    pub last_status_change_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Document {
    pub fn current_revision(&self) -> &Revision {
        self.revisions.current()
    }
}

/// Maps a `(tenant, area)` key to the users notified when a document in that
/// area becomes approved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionRule {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub area: String,
    pub user_ids: Vec<Uuid>,
}

/// Shared message snapshot for one `(document, revision)` approval event.
/// Later edits to the document never retroactively alter delivered content.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationMessage {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub document_id: Uuid,
    pub revision_number: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserNotification {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub message_id: Uuid,
    pub title: String,
    pub content: String,
    pub is_read: bool,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Success,
    Failed,
}

/// One row per attempted delivery to one recipient for one approval event.
#[derive(Debug, Clone, Serialize)]
pub struct DistributionEvent {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub document_id: Uuid,
    pub revision_number: String,
    pub recipient_id: Uuid,
    pub status: DeliveryStatus,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only record of a state-changing action anywhere in the system.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub action_type: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub user_id: Uuid,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

/// Minimal user directory entry. User management lives elsewhere; the
/// lifecycle service only needs existence checks and the area fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub area: Option<String>,
}
