use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join_all;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::models::{
    DeliveryStatus, DistributionEvent, Document, NotificationMessage, UserNotification,
};
use crate::store::{DirectoryStore, NotificationStore};

const CONTENT_SNIPPET_LEN: usize = 200;

#[derive(Debug, Clone, Serialize)]
pub struct DispatchFailure {
    pub user_id: Uuid,
    pub reason: String,
}

/// Aggregate outcome of one fan-out. Informational only: the parent approval
/// is final regardless of what ended up in `failed`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchOutcome {
    pub succeeded: Vec<Uuid>,
    pub failed: Vec<DispatchFailure>,
}

/// Per-recipient notification fan-out. Each recipient is processed
/// independently; one failure is captured and logged without aborting the
/// rest. Re-dispatching the same `(document, revision)` event creates no
/// duplicate notifications, only additional distribution-log rows.
pub struct NotificationDispatcher {
    notifications: Arc<dyn NotificationStore>,
    directory: Arc<dyn DirectoryStore>,
}

impl NotificationDispatcher {
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        directory: Arc<dyn DirectoryStore>,
    ) -> Self {
        Self {
            notifications,
            directory,
        }
    }

    pub async fn dispatch(
        &self,
        document: &Document,
        recipients: &BTreeSet<Uuid>,
    ) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        if recipients.is_empty() {
            return outcome;
        }

        let revision_number = document.current_revision().revision_number.clone();
        let title = format!("{} approved", document.code);
        let content = snippet(document.description.as_deref().unwrap_or(&document.title));

        let deliveries = recipients
            .iter()
            .map(|recipient| self.deliver(document, &revision_number, *recipient, &title, &content));

        for (recipient, result) in recipients.iter().zip(join_all(deliveries).await) {
            match result {
                Ok(()) => outcome.succeeded.push(*recipient),
                Err(reason) => {
                    warn!(
                        document_id = %document.id,
                        recipient = %recipient,
                        %reason,
                        "notification delivery failed"
                    );
                    outcome.failed.push(DispatchFailure {
                        user_id: *recipient,
                        reason,
                    });
                }
            }
        }
        outcome
    }

    async fn deliver(
        &self,
        document: &Document,
        revision_number: &str,
        recipient: Uuid,
        title: &str,
        content: &str,
    ) -> Result<(), String> {
        let result = self
            .try_deliver(document, revision_number, recipient, title, content)
            .await;

        let (status, details) = match &result {
            Ok(true) => (DeliveryStatus::Success, "delivered".to_string()),
            Ok(false) => (DeliveryStatus::Success, "already delivered".to_string()),
            Err(reason) => (DeliveryStatus::Failed, reason.clone()),
        };
        let event = DistributionEvent {
            id: Uuid::new_v4(),
            tenant_id: document.tenant_id,
            document_id: document.id,
            revision_number: revision_number.to_string(),
            recipient_id: recipient,
            status,
            details,
            created_at: Utc::now(),
        };
        if let Err(err) = self.notifications.append_distribution_event(event).await {
            warn!(error = %err, recipient = %recipient, "failed to record distribution event");
        }

        result.map(|_| ())
    }

    async fn try_deliver(
        &self,
        document: &Document,
        revision_number: &str,
        recipient: Uuid,
        title: &str,
        content: &str,
    ) -> Result<bool, String> {
        let user = self
            .directory
            .get_user(document.tenant_id, recipient)
            .await
            .map_err(|err| err.to_string())?;
        if user.is_none() {
            return Err(format!("recipient {recipient} does not exist"));
        }

        let message = self
            .notifications
            .ensure_message(NotificationMessage {
                id: Uuid::new_v4(),
                tenant_id: document.tenant_id,
                document_id: document.id,
                revision_number: revision_number.to_string(),
                title: title.to_string(),
                content: content.to_string(),
                created_at: Utc::now(),
            })
            .await
            .map_err(|err| err.to_string())?;

        self.notifications
            .insert_user_notification_if_absent(UserNotification {
                id: Uuid::new_v4(),
                tenant_id: document.tenant_id,
                user_id: recipient,
                message_id: message.id,
                title: message.title.clone(),
                content: message.content.clone(),
                is_read: false,
                received_at: Utc::now(),
            })
            .await
            .map_err(|err| err.to_string())
    }
}

fn snippet(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(CONTENT_SNIPPET_LEN) {
        Some((index, _)) => format!("{}…", &trimmed[..index]),
        None => trimmed.to_string(),
    }
}
