use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    AuditEntry, DistributionEvent, DistributionRule, Document, DocumentStatus,
    NotificationMessage, UserNotification, UserProfile,
};

pub mod memory;

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("conflicting write: {0}")]
    Conflict(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Document persistence. The compare-and-swap update is the concurrency
/// primitive the engine relies on: a write only lands if the stored status
/// still matches what the writer read.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    async fn insert_document(&self, document: Document) -> StoreResult<()>;

    async fn get_document(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Document>;

    async fn list_documents(&self, tenant_id: Uuid) -> StoreResult<Vec<Document>>;

    /// Replaces the stored document iff its status still equals `expected`
    /// and it has not been deleted in the meantime. A soft delete leaves the
    /// status untouched, so it must conflict stale writers on its own.
    /// Fails with `Conflict` when another writer got there first.
    async fn update_document_if_status(
        &self,
        expected: DocumentStatus,
        updated: Document,
    ) -> StoreResult<()>;
}

/// User directory plus distribution-rule configuration. Users are managed by
/// an external collaborator; this service only reads them.
#[async_trait]
pub trait DirectoryStore: Send + Sync + 'static {
    async fn upsert_user(&self, user: UserProfile) -> StoreResult<()>;

    async fn get_user(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<UserProfile>>;

    async fn upsert_rule(&self, rule: DistributionRule) -> StoreResult<()>;

    async fn rules_for_area(
        &self,
        tenant_id: Uuid,
        area: &str,
    ) -> StoreResult<Vec<DistributionRule>>;

    async fn list_rules(&self, tenant_id: Uuid) -> StoreResult<Vec<DistributionRule>>;
}

/// Notification persistence. Messages are keyed by
/// `(document_id, revision_number)` and per-user rows by
/// `(message_id, user_id)`, which is what makes dispatch idempotent.
#[async_trait]
pub trait NotificationStore: Send + Sync + 'static {
    /// Returns the existing message for the key, inserting `message` if none
    /// exists yet.
    async fn ensure_message(
        &self,
        message: NotificationMessage,
    ) -> StoreResult<NotificationMessage>;

    /// Inserts the row unless the recipient already holds one for the same
    /// message. Returns whether a new row was created.
    async fn insert_user_notification_if_absent(
        &self,
        notification: UserNotification,
    ) -> StoreResult<bool>;

    async fn list_user_notifications(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Vec<UserNotification>>;

    async fn mark_notification_read(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> StoreResult<()>;

    async fn append_distribution_event(&self, event: DistributionEvent) -> StoreResult<()>;

    async fn distribution_events_for(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
    ) -> StoreResult<Vec<DistributionEvent>>;
}

/// Append-only system event log.
#[async_trait]
pub trait AuditStore: Send + Sync + 'static {
    async fn append_audit(&self, entry: AuditEntry) -> StoreResult<()>;

    async fn list_audit(
        &self,
        tenant_id: Uuid,
        entity_id: Option<Uuid>,
    ) -> StoreResult<Vec<AuditEntry>>;
}
