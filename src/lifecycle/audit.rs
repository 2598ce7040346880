use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::models::AuditEntry;
use crate::store::AuditStore;

pub const ENTITY_DOCUMENT: &str = "document";

/// Append-only writer for the system event log. Auditing is a side channel:
/// a failed append is logged and swallowed so it never fails the operation
/// that produced it.
#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn AuditStore>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    pub async fn record(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        action_type: &str,
        entity_type: &str,
        entity_id: Uuid,
        details: impl Into<String>,
    ) {
        let entry = AuditEntry {
            id: Uuid::new_v4(),
            tenant_id,
            action_type: action_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id,
            user_id,
            details: details.into(),
            timestamp: Utc::now(),
        };
        if let Err(err) = self.store.append_audit(entry).await {
            tracing::warn!(error = %err, action = action_type, %entity_id, "failed to append audit entry");
        }
    }
}
