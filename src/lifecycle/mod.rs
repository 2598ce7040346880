use thiserror::Error;

use crate::store::StoreError;

pub mod approval;
pub mod audit;
pub mod distribution;
pub mod engine;
pub mod notification;
pub mod revision;

pub use engine::{DecisionOutcome, DocumentLifecycleEngine, NewDocumentInput, NewRevisionInput};
pub use notification::{DispatchFailure, DispatchOutcome};

/// Workflow failure taxonomy. Every variant is returned, never thrown across
/// the component boundary; the HTTP layer maps them to status codes and a
/// machine-readable kind.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Recoverable input problem; the caller resubmits corrected input.
    #[error("{0}")]
    Validation(String),
    /// The requested transition is not legal from the current status.
    #[error("{0}")]
    InvalidTransition(String),
    /// Actor is neither the designated approver nor an administrator.
    #[error("{0}")]
    Forbidden(String),
    /// Another writer changed the document between read and write.
    #[error("the document was modified by another request; re-fetch and retry")]
    ConcurrentModification,
    /// Revision identifier does not match a known incrementing pattern.
    #[error("{0}")]
    UnsupportedRevisionScheme(String),
    #[error("document not found")]
    NotFound,
    #[error(transparent)]
    Store(StoreError),
}

impl LifecycleError {
    /// Denied operations are recorded in the audit log; pure validation
    /// failures never touch persistence and stay out of it.
    pub fn is_audited(&self) -> bool {
        matches!(
            self,
            LifecycleError::InvalidTransition(_)
                | LifecycleError::Forbidden(_)
                | LifecycleError::ConcurrentModification
                | LifecycleError::UnsupportedRevisionScheme(_)
        )
    }

    /// Stable identifier matching the HTTP error body's `kind` field.
    pub fn kind(&self) -> &'static str {
        match self {
            LifecycleError::Validation(_) => "validation_error",
            LifecycleError::InvalidTransition(_) => "invalid_transition",
            LifecycleError::Forbidden(_) => "forbidden",
            LifecycleError::ConcurrentModification => "concurrent_modification",
            LifecycleError::UnsupportedRevisionScheme(_) => "unsupported_revision_scheme",
            LifecycleError::NotFound => "not_found",
            LifecycleError::Store(_) => "internal",
        }
    }
}

impl From<StoreError> for LifecycleError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => LifecycleError::NotFound,
            StoreError::Conflict(_) => LifecycleError::ConcurrentModification,
            other => LifecycleError::Store(other),
        }
    }
}
