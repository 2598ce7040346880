use serde::Serialize;
use thiserror::Error;

use crate::models::{DocumentStatus, Revision};

/// Revision number given to every newly created document.
pub const FIRST_REVISION: &str = "R00";

/// Marker appended by the display helper when the current revision number
/// does not follow a recognized incrementing scheme.
pub const UNRECOGNIZED_SCHEME_SUFFIX: &str = "-Nova";

/// Ordered, append-only revision history of one document. Never empty, and
/// at most the last entry may be non-terminal; everything before it is
/// frozen at `approved` or `rejected`.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct RevisionChain {
    entries: Vec<Revision>,
}

#[derive(Debug, Error)]
#[error("cannot append a revision while {number} is still {status}")]
pub struct ChainViolation {
    number: String,
    status: DocumentStatus,
}

impl RevisionChain {
    pub fn new(first: Revision) -> Self {
        Self {
            entries: vec![first],
        }
    }

    pub fn current(&self) -> &Revision {
        self.entries.last().expect("revision chain is never empty")
    }

    /// The current entry is the only one the engine is ever allowed to
    /// mutate; historical entries stay frozen.
    pub(crate) fn current_mut(&mut self) -> &mut Revision {
        self.entries
            .last_mut()
            .expect("revision chain is never empty")
    }

    pub fn append(&mut self, revision: Revision) -> Result<(), ChainViolation> {
        let current = self.current();
        if !current.status.is_terminal() {
            return Err(ChainViolation {
                number: current.revision_number.clone(),
                status: current.status,
            });
        }
        self.entries.push(revision);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &Revision> {
        self.entries.iter()
    }

    /// At most one non-terminal entry, and only in the last position.
    pub fn invariant_holds(&self) -> bool {
        self.entries
            .iter()
            .rev()
            .skip(1)
            .all(|revision| revision.status.is_terminal())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RevisionSchemeError {
    #[error("revision number \"{0}\" does not follow a recognized scheme")]
    Unrecognized(String),
    #[error("revision scheme cannot be incremented any further")]
    Exhausted,
}

/// Computes the next revision identifier. `Rnn` increments the numeric
/// suffix (zero-padded, at least two digits); a single capital letter
/// advances to the next letter and cannot go past `Z`.
pub fn next_revision_number(current: &str) -> Result<String, RevisionSchemeError> {
    if let Some(digits) = current
        .strip_prefix('R')
        .or_else(|| current.strip_prefix('r'))
    {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            let value: u64 = digits
                .parse()
                .map_err(|_| RevisionSchemeError::Unrecognized(current.to_string()))?;
            let next = value.checked_add(1).ok_or(RevisionSchemeError::Exhausted)?;
            let width = digits.len().max(2);
            return Ok(format!("R{next:0width$}"));
        }
    }

    let mut chars = current.chars();
    match (chars.next(), chars.next()) {
        (Some(letter @ 'A'..='Y'), None) => Ok(((letter as u8 + 1) as char).to_string()),
        (Some('Z'), None) => Err(RevisionSchemeError::Exhausted),
        _ => Err(RevisionSchemeError::Unrecognized(current.to_string())),
    }
}

/// Display-oriented variant: unrecognized or exhausted schemes get the
/// explicit marker suffix instead of an error, so grids can always render a
/// "next revision" column without guessing.
pub fn display_next_revision_number(current: &str) -> String {
    next_revision_number(current)
        .unwrap_or_else(|_| format!("{current}{UNRECOGNIZED_SCHEME_SUFFIX}"))
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::models::FileDescriptor;

    use super::*;

    fn revision(number: &str, status: DocumentStatus) -> Revision {
        Revision::new(
            number,
            status,
            None,
            FileDescriptor {
                file_link: "s3://bucket/key".to_string(),
                file_name: "spec.pdf".to_string(),
                file_type: None,
                file_size: 1,
            },
            Uuid::new_v4(),
        )
    }

    #[test]
    fn increments_numeric_scheme() {
        assert_eq!(next_revision_number("R00").unwrap(), "R01");
        assert_eq!(next_revision_number("R09").unwrap(), "R10");
        assert_eq!(next_revision_number("R99").unwrap(), "R100");
        assert_eq!(next_revision_number("r05").unwrap(), "R06");
        assert_eq!(next_revision_number("R005").unwrap(), "R006");
    }

    #[test]
    fn increments_letter_scheme() {
        assert_eq!(next_revision_number("A").unwrap(), "B");
        assert_eq!(next_revision_number("B").unwrap(), "C");
        assert_eq!(next_revision_number("Y").unwrap(), "Z");
    }

    #[test]
    fn letter_scheme_stops_at_z() {
        assert_eq!(
            next_revision_number("Z").unwrap_err(),
            RevisionSchemeError::Exhausted
        );
    }

    #[test]
    fn numeric_scheme_stops_at_the_integer_limit() {
        let number = format!("R{}", u64::MAX);
        assert_eq!(
            next_revision_number(&number).unwrap_err(),
            RevisionSchemeError::Exhausted
        );
    }

    #[test]
    fn unrecognized_schemes_are_rejected() {
        for number in ["1.0", "", "AB", "Rev2", "R1a", "b"] {
            assert!(matches!(
                next_revision_number(number),
                Err(RevisionSchemeError::Unrecognized(_))
            ));
        }
    }

    #[test]
    fn display_helper_marks_unrecognized_schemes() {
        assert_eq!(display_next_revision_number("R01"), "R02");
        assert_eq!(display_next_revision_number("1.0"), "1.0-Nova");
    }

    #[test]
    fn append_requires_terminal_current() {
        let mut chain = RevisionChain::new(revision("R00", DocumentStatus::Draft));
        let err = chain
            .append(revision("R01", DocumentStatus::PendingApproval))
            .unwrap_err();
        assert!(err.to_string().contains("R00"));

        chain.current_mut().status = DocumentStatus::Approved;
        chain
            .append(revision("R01", DocumentStatus::PendingApproval))
            .unwrap();
        assert_eq!(chain.current().revision_number, "R01");
        assert_eq!(chain.len(), 2);
        assert!(chain.invariant_holds());
    }
}
