use std::collections::BTreeSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::models::Document;
use crate::store::{DirectoryStore, StoreResult};

/// Resolves which users must be notified when a document becomes approved.
/// Rules are keyed by `(tenant, area)`; when no rule matches the document's
/// own area, rules for the responsible user's area apply instead. An empty
/// result is a valid outcome, not an error.
pub struct DistributionRuleResolver {
    directory: Arc<dyn DirectoryStore>,
    notify_document_owner: bool,
}

impl DistributionRuleResolver {
    pub fn new(directory: Arc<dyn DirectoryStore>, notify_document_owner: bool) -> Self {
        Self {
            directory,
            notify_document_owner,
        }
    }

    pub async fn resolve(&self, document: &Document) -> StoreResult<BTreeSet<Uuid>> {
        let mut rules = Vec::new();
        if let Some(area) = document.area.as_deref() {
            rules = self
                .directory
                .rules_for_area(document.tenant_id, area)
                .await?;
        }

        if rules.is_empty() {
            let owner = self
                .directory
                .get_user(document.tenant_id, document.responsible_user_id)
                .await?;
            if let Some(area) = owner.and_then(|user| user.area) {
                rules = self
                    .directory
                    .rules_for_area(document.tenant_id, &area)
                    .await?;
            }
        }

        let mut recipients: BTreeSet<Uuid> = rules
            .into_iter()
            .flat_map(|rule| rule.user_ids)
            .collect();

        if !self.notify_document_owner {
            recipients.remove(&document.responsible_user_id);
        }

        Ok(recipients)
    }
}
