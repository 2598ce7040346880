use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    AuditEntry, DistributionEvent, DistributionRule, Document, DocumentStatus,
    NotificationMessage, UserNotification, UserProfile,
};

use super::{
    AuditStore, DirectoryStore, DocumentStore, NotificationStore, StoreError, StoreResult,
};

/// In-process data layer. All maps live behind `tokio` locks; the document
/// write lock is the mutual-exclusion boundary the status compare-and-swap
/// depends on.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<Uuid, Document>>,
    users: RwLock<HashMap<Uuid, UserProfile>>,
    rules: RwLock<HashMap<(Uuid, String), DistributionRule>>,
    messages: RwLock<HashMap<(Uuid, String), NotificationMessage>>,
    user_notifications: RwLock<Vec<UserNotification>>,
    delivered: RwLock<HashSet<(Uuid, Uuid)>>,
    distribution_events: RwLock<Vec<DistributionEvent>>,
    audit: RwLock<Vec<AuditEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_document(&self, document: Document) -> StoreResult<()> {
        let mut guard = self.documents.write().await;
        if guard.contains_key(&document.id) {
            return Err(StoreError::Conflict(format!(
                "document {} already exists",
                document.id
            )));
        }
        guard.insert(document.id, document);
        Ok(())
    }

    async fn get_document(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Document> {
        let guard = self.documents.read().await;
        guard
            .get(&id)
            .filter(|doc| doc.tenant_id == tenant_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_documents(&self, tenant_id: Uuid) -> StoreResult<Vec<Document>> {
        let guard = self.documents.read().await;
        let mut documents: Vec<Document> = guard
            .values()
            .filter(|doc| doc.tenant_id == tenant_id && !doc.is_deleted)
            .cloned()
            .collect();
        documents.sort_by_key(|doc| doc.created_at);
        Ok(documents)
    }

    async fn update_document_if_status(
        &self,
        expected: DocumentStatus,
        updated: Document,
    ) -> StoreResult<()> {
        let mut guard = self.documents.write().await;
        let stored = guard.get(&updated.id).ok_or(StoreError::NotFound)?;
        if stored.is_deleted {
            return Err(StoreError::Conflict(format!(
                "document {} was deleted since it was read",
                updated.id
            )));
        }
        if stored.status != expected {
            return Err(StoreError::Conflict(format!(
                "document {} moved from {} to {} since it was read",
                updated.id, expected, stored.status
            )));
        }
        guard.insert(updated.id, updated);
        Ok(())
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn upsert_user(&self, user: UserProfile) -> StoreResult<()> {
        self.users.write().await.insert(user.id, user);
        Ok(())
    }

    async fn get_user(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<UserProfile>> {
        let guard = self.users.read().await;
        Ok(guard
            .get(&id)
            .filter(|user| user.tenant_id == tenant_id)
            .cloned())
    }

    async fn upsert_rule(&self, rule: DistributionRule) -> StoreResult<()> {
        let key = (rule.tenant_id, rule.area.clone());
        self.rules.write().await.insert(key, rule);
        Ok(())
    }

    async fn rules_for_area(
        &self,
        tenant_id: Uuid,
        area: &str,
    ) -> StoreResult<Vec<DistributionRule>> {
        let guard = self.rules.read().await;
        Ok(guard
            .get(&(tenant_id, area.to_string()))
            .cloned()
            .into_iter()
            .collect())
    }

    async fn list_rules(&self, tenant_id: Uuid) -> StoreResult<Vec<DistributionRule>> {
        let guard = self.rules.read().await;
        let mut rules: Vec<DistributionRule> = guard
            .values()
            .filter(|rule| rule.tenant_id == tenant_id)
            .cloned()
            .collect();
        rules.sort_by(|a, b| a.area.cmp(&b.area));
        Ok(rules)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn ensure_message(
        &self,
        message: NotificationMessage,
    ) -> StoreResult<NotificationMessage> {
        let key = (message.document_id, message.revision_number.clone());
        let mut guard = self.messages.write().await;
        Ok(guard.entry(key).or_insert(message).clone())
    }

    async fn insert_user_notification_if_absent(
        &self,
        notification: UserNotification,
    ) -> StoreResult<bool> {
        let key = (notification.message_id, notification.user_id);
        let mut delivered = self.delivered.write().await;
        if delivered.contains(&key) {
            return Ok(false);
        }
        delivered.insert(key);
        self.user_notifications.write().await.push(notification);
        Ok(true)
    }

    async fn list_user_notifications(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Vec<UserNotification>> {
        let guard = self.user_notifications.read().await;
        Ok(guard
            .iter()
            .filter(|n| n.tenant_id == tenant_id && n.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn mark_notification_read(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> StoreResult<()> {
        let mut guard = self.user_notifications.write().await;
        let entry = guard
            .iter_mut()
            .find(|n| {
                n.id == notification_id && n.tenant_id == tenant_id && n.user_id == user_id
            })
            .ok_or(StoreError::NotFound)?;
        entry.is_read = true;
        Ok(())
    }

    async fn append_distribution_event(&self, event: DistributionEvent) -> StoreResult<()> {
        self.distribution_events.write().await.push(event);
        Ok(())
    }

    async fn distribution_events_for(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
    ) -> StoreResult<Vec<DistributionEvent>> {
        let guard = self.distribution_events.read().await;
        Ok(guard
            .iter()
            .filter(|e| e.tenant_id == tenant_id && e.document_id == document_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn append_audit(&self, entry: AuditEntry) -> StoreResult<()> {
        self.audit.write().await.push(entry);
        Ok(())
    }

    async fn list_audit(
        &self,
        tenant_id: Uuid,
        entity_id: Option<Uuid>,
    ) -> StoreResult<Vec<AuditEntry>> {
        let guard = self.audit.read().await;
        Ok(guard
            .iter()
            .filter(|entry| entry.tenant_id == tenant_id)
            .filter(|entry| entity_id.map_or(true, |id| entry.entity_id == id))
            .cloned()
            .collect())
    }
}
