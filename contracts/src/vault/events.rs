//! Vault audit log.

use serde::{Deserialize, Serialize};
use strongbox_protocol::types::{Address, Amount, Timestamp, TokenId};

use super::entry::{AssetKind, EntryId};

/// An append-only record of what the vault did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultEvent {
    /// An asset was locked.
    VaultCreated {
        entry_id: EntryId,
        depositor: Address,
        asset_kind: AssetKind,
        asset_address: Address,
        token_id: TokenId,
        amount: Amount,
        unlock_time: Timestamp,
    },
    /// An asset was released.
    AssetWithdrawn {
        entry_id: EntryId,
        recipient: Address,
        /// Whoever submitted the withdrawal.
        relayer: Address,
        withdrawn_at: Timestamp,
    },
}

impl VaultEvent {
    /// The entry this event is about.
    pub fn entry_id(&self) -> EntryId {
        match self {
            VaultEvent::VaultCreated { entry_id, .. } | VaultEvent::AssetWithdrawn { entry_id, .. } => *entry_id,
        }
    }
}
