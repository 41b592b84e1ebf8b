//! Vault errors.
//!
//! Every failure aborts the operation with nothing changed. Nothing is
//! retried. [`VaultError::code`] gives tooling a stable name to branch on,
//! independent of the human-readable message.

use strongbox_protocol::ledger::LedgerError;
use strongbox_protocol::types::{Amount, Timestamp};
use thiserror::Error;

use super::entry::{AssetKind, EntryId};

/// Errors that can occur during vault operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    /// The asset kind tag is not one of the four known kinds.
    #[error("unknown asset kind {0}")]
    UnknownAssetKind(u8),

    /// A zero quantity of a countable asset.
    #[error("cannot lock zero units of a {kind} asset")]
    ZeroAmount {
        /// The kind requested.
        kind: AssetKind,
    },

    /// Native deposits must attach exactly the amount; others must attach nothing.
    #[error("attached value {attached} does not match expected {expected}")]
    ValueMismatch {
        /// Value attached to the call.
        attached: Amount,
        /// Value the asset kind requires.
        expected: Amount,
    },

    /// The asset service refused the movement.
    #[error("{kind} transfer rejected: {source}")]
    TransferRejected {
        /// Kind of asset being moved.
        kind: AssetKind,
        /// The service's reason.
        #[source]
        source: LedgerError,
    },

    /// No entry with this id.
    #[error("vault entry {0} does not exist")]
    UnknownEntry(EntryId),

    /// The entry has already been released.
    #[error("vault entry {0} has already been withdrawn")]
    AlreadyWithdrawn(EntryId),

    /// The unlock time has not been reached.
    #[error("vault entry {entry_id} is locked until {unlock_time} (now {now})")]
    AssetLocked {
        /// The locked entry.
        entry_id: EntryId,
        /// When it unlocks.
        unlock_time: Timestamp,
        /// The time the check ran.
        now: Timestamp,
    },

    /// The authorization's deadline has passed.
    #[error("authorization expired at {deadline} (now {now})")]
    SignatureExpired {
        /// The signed deadline.
        deadline: Timestamp,
        /// The time the check ran.
        now: Timestamp,
    },

    /// The signature is not the depositor's over this exact authorization.
    #[error("signature does not authorize this withdrawal")]
    InvalidSignature,

    /// Persisted entries don't form a dense id sequence.
    #[error("cannot restore vault: entry at position {position} has id {id}")]
    InconsistentRestore {
        /// Position in the persisted list.
        position: usize,
        /// The id found there.
        id: EntryId,
    },
}

impl VaultError {
    /// Stable error name, e.g. `"AssetLocked()"`.
    pub fn code(&self) -> &'static str {
        match self {
            VaultError::UnknownAssetKind(_) => "UnknownAssetKind()",
            VaultError::ZeroAmount { .. } => "ZeroAmount()",
            VaultError::ValueMismatch { .. } => "ValueMismatch()",
            VaultError::TransferRejected { .. } => "TransferRejected()",
            VaultError::UnknownEntry(_) => "UnknownEntry()",
            VaultError::AlreadyWithdrawn(_) => "AlreadyWithdrawn()",
            VaultError::AssetLocked { .. } => "AssetLocked()",
            VaultError::SignatureExpired { .. } => "SignatureExpired()",
            VaultError::InvalidSignature => "InvalidSignature()",
            VaultError::InconsistentRestore { .. } => "InconsistentRestore()",
        }
    }

    /// Wraps a ledger refusal.
    pub(crate) fn rejected(kind: AssetKind, source: LedgerError) -> Self {
        VaultError::TransferRejected { kind, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_codes() {
        let locked = VaultError::AssetLocked {
            entry_id: 0,
            unlock_time: 10,
            now: 5,
        };
        assert_eq!(locked.code(), "AssetLocked()");
        assert_eq!(VaultError::InvalidSignature.code(), "InvalidSignature()");
        assert_eq!(VaultError::AlreadyWithdrawn(3).code(), "AlreadyWithdrawn()");
    }

    #[test]
    fn test_rejected_keeps_source() {
        let err = VaultError::rejected(AssetKind::Fungible, LedgerError::Overflow);
        assert_eq!(err.code(), "TransferRejected()");
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("fungible transfer rejected"));
    }
}
