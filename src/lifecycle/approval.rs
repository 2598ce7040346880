use crate::models::{Actor, Document, DocumentStatus};

/// Authorization predicate for approve/reject decisions. Pure and
/// re-evaluated on every call: the designated approver can change between
/// revisions, so nothing here may be cached.
pub fn can_decide(actor: &Actor, document: &Document) -> bool {
    if actor.role.is_admin() {
        return true;
    }
    document.status == DocumentStatus::PendingApproval
        && document.current_revision().approving_user_id == Some(actor.id)
}
