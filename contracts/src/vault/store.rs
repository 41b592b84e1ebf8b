//! # Vault Store
//!
//! Loads and saves a vault together with the ledgers it holds assets in.
//! Both live in one [`VaultDb`] and are written in one commit, so the entry
//! table and the balances it describes never disagree on disk.
//!
//! Receive hooks are code, not state; they are not persisted.

use std::sync::Arc;

use strongbox_protocol::clock::Clock;
use strongbox_protocol::ledger::Ledgers;
use strongbox_protocol::storage::{Commit, DbError, VaultDb};
use strongbox_protocol::types::Address;
use thiserror::Error;
use tracing::debug;

use super::entry::VaultEntry;
use super::error::VaultError;
use super::events::VaultEvent;
use super::registry::{Vault, VaultConfig};

const VAULT_ADDRESS_KEY: &str = "vault_address";
const NETWORK_ID_KEY: &str = "network_id";

/// Errors that can occur loading or saving a vault.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    /// No vault has been saved in this database.
    #[error("no vault has been initialized in this database")]
    NotInitialized,

    /// Metadata present but unreadable.
    #[error("corrupt vault metadata: {0}")]
    CorruptMetadata(&'static str),
}

/// A vault's persistent home.
#[derive(Debug, Clone)]
pub struct VaultStore {
    db: VaultDb,
}

impl VaultStore {
    pub fn new(db: VaultDb) -> Self {
        Self { db }
    }

    /// The underlying database.
    pub fn db(&self) -> &VaultDb {
        &self.db
    }

    /// The saved vault configuration, if any.
    pub fn config(&self) -> Result<Option<VaultConfig>, StoreError> {
        let Some(address) = self.db.get_metadata(VAULT_ADDRESS_KEY)? else {
            return Ok(None);
        };
        let address: [u8; 32] = address
            .as_slice()
            .try_into()
            .map_err(|_| StoreError::CorruptMetadata(VAULT_ADDRESS_KEY))?;
        let network_id = self
            .db
            .get_metadata(NETWORK_ID_KEY)?
            .and_then(|bytes| <[u8; 4]>::try_from(bytes.as_slice()).ok())
            .map(u32::from_be_bytes)
            .ok_or(StoreError::CorruptMetadata(NETWORK_ID_KEY))?;
        Ok(Some(VaultConfig {
            address: Address::from_bytes(address),
            network_id,
        }))
    }

    /// The saved ledgers, or an empty world if none were saved yet.
    pub fn load_ledgers(&self) -> Result<Ledgers, StoreError> {
        Ok(self
            .db
            .ledgers()?
            .map(Ledgers::from_snapshot)
            .unwrap_or_default())
    }

    /// Rebuilds the saved vault on top of `ledgers`.
    pub fn load_vault(&self, ledgers: Arc<Ledgers>, clock: Arc<dyn Clock>) -> Result<Vault, StoreError> {
        let config = self.config()?.ok_or(StoreError::NotInitialized)?;
        let entries: Vec<VaultEntry> = self
            .db
            .entries::<VaultEntry>()?
            .into_iter()
            .map(|(_, entry)| entry)
            .collect();
        let events: Vec<VaultEvent> = self.db.events()?;
        Ok(Vault::restore(config, ledgers, clock, entries, events)?)
    }

    /// Writes the vault's configuration, entries, events and the ledgers in one commit.
    pub fn save(&self, vault: &Vault, ledgers: &Ledgers) -> Result<(), StoreError> {
        let config = vault.config();
        let mut commit = Commit::new();
        commit
            .put_metadata(VAULT_ADDRESS_KEY, config.address.as_bytes())
            .put_metadata(NETWORK_ID_KEY, &config.network_id.to_be_bytes());

        let entries = vault.entries();
        for entry in &entries {
            commit.put_entry(entry.id, entry)?;
        }
        let events = vault.events();
        for (sequence, event) in events.iter().enumerate() {
            commit.put_event(sequence as u64, event)?;
        }
        commit.put_ledgers(&ledgers.snapshot())?;
        self.db.commit(&commit)?;

        debug!(
            vault = %config.address.short(),
            entries = entries.len(),
            events = events.len(),
            "vault saved"
        );
        Ok(())
    }
}
