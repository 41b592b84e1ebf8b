//! # Vault Registry
//!
//! Owns every entry and orchestrates creation and withdrawal.
//!
//! ## Lifecycle
//!
//! ```text
//! create_vault ──► Active ──withdraw_asset──► Withdrawn (terminal)
//! ```
//!
//! ## Locking
//!
//! The registry sits behind a re-entrant mutex that is held for the whole
//! of each `create_vault` / `withdraw_asset`. Other threads wait until the
//! operation commits or rolls back. The same thread may re-enter, which is
//! what happens when a recipient's receive hook calls back into the vault
//! during `push_out`. The inner `RefCell` is never borrowed across a call
//! into an asset service, so the re-entrant call sees the entry already
//! flipped to `Withdrawn` and fails with `AlreadyWithdrawn`.
//!
//! ## Withdrawal order
//!
//! 1. entry exists
//! 2. not withdrawn
//! 3. unlocked
//! 4. deadline not passed
//! 5. depositor's signature over the digest
//! 6. flip to `Withdrawn`
//! 7. push the asset out; on failure flip back and return the error
//! 8. record `AssetWithdrawn`

use std::cell::RefCell;
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use serde::{Deserialize, Serialize};
use strongbox_protocol::clock::Clock;
use strongbox_protocol::config::VAULT_CONTRACT_NAME;
use strongbox_protocol::crypto::{Digest, Signature};
use strongbox_protocol::ledger::AssetServices;
use strongbox_protocol::types::{Address, Amount, Timestamp, TokenId};
use tracing::{debug, info, warn};

use super::adapter::{adapter_for, AssetRef};
use super::authorization::AuthorizationDomain;
use super::entry::{AssetKind, EntryId, VaultEntry};
use super::error::VaultError;
use super::events::VaultEvent;
use super::timelock;

// ---------------------------------------------------------------------------
// Configuration & requests
// ---------------------------------------------------------------------------

/// Where a vault lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// The vault's own address; it holds every deposited asset.
    pub address: Address,
    /// Network id mixed into every authorization digest.
    pub network_id: u32,
}

impl VaultConfig {
    /// The vault `deployer` gets on `network_id`.
    pub fn derived(deployer: &Address, network_id: u32) -> Self {
        Self {
            address: Address::derive(deployer, VAULT_CONTRACT_NAME),
            network_id,
        }
    }
}

/// Arguments to [`Vault::create_vault`].
///
/// `asset_kind` is the raw tag so an unknown kind is the vault's error to
/// report, not the caller's to pre-filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateVault {
    pub asset_kind: u8,
    pub asset_address: Address,
    pub token_id: TokenId,
    pub amount: Amount,
    pub unlock_time: Timestamp,
}

impl CreateVault {
    /// Lock `amount` of native currency.
    pub fn native(amount: Amount, unlock_time: Timestamp) -> Self {
        Self {
            asset_kind: AssetKind::Native.tag(),
            asset_address: Address::ZERO,
            token_id: 0,
            amount,
            unlock_time,
        }
    }

    /// Lock `amount` of the fungible token at `asset`.
    pub fn fungible(asset: Address, amount: Amount, unlock_time: Timestamp) -> Self {
        Self {
            asset_kind: AssetKind::Fungible.tag(),
            asset_address: asset,
            token_id: 0,
            amount,
            unlock_time,
        }
    }

    /// Lock unique token `token_id` of `asset`.
    pub fn non_fungible(asset: Address, token_id: TokenId, unlock_time: Timestamp) -> Self {
        Self {
            asset_kind: AssetKind::NonFungible.tag(),
            asset_address: asset,
            token_id,
            amount: 1,
            unlock_time,
        }
    }

    /// Lock `amount` of id `token_id` of the multi token at `asset`.
    pub fn semi_fungible(asset: Address, token_id: TokenId, amount: Amount, unlock_time: Timestamp) -> Self {
        Self {
            asset_kind: AssetKind::SemiFungible.tag(),
            asset_address: asset,
            token_id,
            amount,
            unlock_time,
        }
    }
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Registry {
    entries: Vec<VaultEntry>,
    events: Vec<VaultEvent>,
}

impl Registry {
    fn get(&self, entry_id: EntryId) -> Option<&VaultEntry> {
        usize::try_from(entry_id).ok().and_then(|i| self.entries.get(i))
    }

    fn set_withdrawn(&mut self, entry_id: EntryId, withdrawn: bool) {
        if let Some(entry) = usize::try_from(entry_id)
            .ok()
            .and_then(|i| self.entries.get_mut(i))
        {
            entry.withdrawn = withdrawn;
        }
    }
}

/// A time-locked, signature-released asset vault.
pub struct Vault {
    config: VaultConfig,
    domain: AuthorizationDomain,
    services: Arc<dyn AssetServices>,
    clock: Arc<dyn Clock>,
    registry: ReentrantMutex<RefCell<Registry>>,
}

impl Vault {
    /// An empty vault.
    pub fn new(config: VaultConfig, services: Arc<dyn AssetServices>, clock: Arc<dyn Clock>) -> Self {
        Self::with_registry(config, services, clock, Registry::default())
    }

    /// Rebuilds a vault from persisted entries and events.
    ///
    /// Entries must be in id order with ids `0..n`.
    pub fn restore(
        config: VaultConfig,
        services: Arc<dyn AssetServices>,
        clock: Arc<dyn Clock>,
        entries: Vec<VaultEntry>,
        events: Vec<VaultEvent>,
    ) -> Result<Self, VaultError> {
        for (position, entry) in entries.iter().enumerate() {
            if usize::try_from(entry.id).ok() != Some(position) {
                return Err(VaultError::InconsistentRestore {
                    position,
                    id: entry.id,
                });
            }
        }
        debug!(
            vault = %config.address.short(),
            entries = entries.len(),
            events = events.len(),
            "vault restored"
        );
        Ok(Self::with_registry(
            config,
            services,
            clock,
            Registry { entries, events },
        ))
    }

    fn with_registry(
        config: VaultConfig,
        services: Arc<dyn AssetServices>,
        clock: Arc<dyn Clock>,
        registry: Registry,
    ) -> Self {
        Self {
            domain: AuthorizationDomain::new(config.network_id, config.address),
            config,
            services,
            clock,
            registry: ReentrantMutex::new(RefCell::new(registry)),
        }
    }

    /// The vault's address.
    pub fn address(&self) -> Address {
        self.config.address
    }

    /// The network the vault's digests are bound to.
    pub fn network_id(&self) -> u32 {
        self.config.network_id
    }

    /// The vault's configuration.
    pub fn config(&self) -> VaultConfig {
        self.config
    }

    /// The digest domain.
    pub fn domain(&self) -> &AuthorizationDomain {
        &self.domain
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Locks an asset and returns the new entry's id.
    ///
    /// `caller` becomes the depositor. `attached_value` is native value sent
    /// along with the call: it must equal `amount` for native deposits and
    /// be zero otherwise. An unlock time in the past is allowed.
    pub fn create_vault(
        &self,
        caller: &Address,
        request: CreateVault,
        attached_value: Amount,
    ) -> Result<EntryId, VaultError> {
        let guard = self.registry.lock();

        let kind = AssetKind::try_from(request.asset_kind)?;
        let amount = match kind {
            AssetKind::NonFungible => 1,
            _ if request.amount == 0 => return Err(VaultError::ZeroAmount { kind }),
            _ => request.amount,
        };
        let asset = AssetRef {
            kind,
            address: if kind.has_contract() {
                request.asset_address
            } else {
                Address::ZERO
            },
            token_id: request.token_id,
            amount,
        };

        adapter_for(kind).pull_in(
            self.services.as_ref(),
            &asset,
            caller,
            &self.config.address,
            attached_value,
        )?;

        let mut registry = guard.borrow_mut();
        let entry_id = registry.entries.len() as EntryId;
        registry.entries.push(VaultEntry {
            id: entry_id,
            asset_kind: kind,
            asset_address: asset.address,
            token_id: asset.token_id,
            amount,
            depositor: *caller,
            unlock_time: request.unlock_time,
            withdrawn: false,
        });
        registry.events.push(VaultEvent::VaultCreated {
            entry_id,
            depositor: *caller,
            asset_kind: kind,
            asset_address: asset.address,
            token_id: asset.token_id,
            amount,
            unlock_time: request.unlock_time,
        });

        info!(
            entry_id,
            kind = %kind,
            asset = %asset.address.short(),
            token_id = asset.token_id,
            amount,
            depositor = %caller.short(),
            unlock_time = request.unlock_time,
            "vault entry created"
        );
        Ok(entry_id)
    }

    /// The digest the depositor signs to release `entry_id` to `recipient`.
    ///
    /// The entry does not have to exist.
    pub fn get_message_hash(&self, entry_id: EntryId, recipient: &Address, deadline: Timestamp) -> Digest {
        self.domain.compute_digest(entry_id, recipient, deadline)
    }

    /// Releases an entry to `recipient` on the depositor's signed authorization.
    ///
    /// `caller` is whoever submits the withdrawal. It need not be the
    /// depositor or the recipient; it is recorded as the relayer.
    pub fn withdraw_asset(
        &self,
        caller: &Address,
        entry_id: EntryId,
        recipient: &Address,
        deadline: Timestamp,
        signature: &Signature,
    ) -> Result<(), VaultError> {
        let guard = self.registry.lock();
        let now = self.clock.now();

        let entry = guard
            .borrow()
            .get(entry_id)
            .cloned()
            .ok_or(VaultError::UnknownEntry(entry_id))?;

        if entry.withdrawn {
            return Err(VaultError::AlreadyWithdrawn(entry_id));
        }
        if !timelock::is_unlocked(entry.unlock_time, now) {
            debug!(
                entry_id,
                remaining = timelock::remaining(entry.unlock_time, now),
                "withdrawal before unlock"
            );
            return Err(VaultError::AssetLocked {
                entry_id,
                unlock_time: entry.unlock_time,
                now,
            });
        }
        if timelock::is_expired(deadline, now) {
            return Err(VaultError::SignatureExpired { deadline, now });
        }

        let digest = self.domain.compute_digest(entry_id, recipient, deadline);
        if !self.domain.verify(&digest, signature, &entry.depositor) {
            warn!(
                entry_id,
                depositor = %entry.depositor.short(),
                relayer = %caller.short(),
                "withdrawal signature rejected"
            );
            return Err(VaultError::InvalidSignature);
        }

        guard.borrow_mut().set_withdrawn(entry_id, true);

        let asset = AssetRef::from(&entry);
        let pushed = adapter_for(entry.asset_kind).push_out(
            self.services.as_ref(),
            &asset,
            &self.config.address,
            recipient,
        );
        if let Err(err) = pushed {
            guard.borrow_mut().set_withdrawn(entry_id, false);
            warn!(entry_id, recipient = %recipient.short(), error = %err, "release failed, entry restored");
            return Err(err);
        }

        guard.borrow_mut().events.push(VaultEvent::AssetWithdrawn {
            entry_id,
            recipient: *recipient,
            relayer: *caller,
            withdrawn_at: now,
        });

        info!(
            entry_id,
            kind = %entry.asset_kind,
            recipient = %recipient.short(),
            relayer = %caller.short(),
            "vault entry withdrawn"
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Copy of one entry.
    pub fn entry(&self, entry_id: EntryId) -> Option<VaultEntry> {
        self.registry.lock().borrow().get(entry_id).cloned()
    }

    /// Copy of every entry, in id order.
    pub fn entries(&self) -> Vec<VaultEntry> {
        self.registry.lock().borrow().entries.clone()
    }

    /// Number of entries ever created.
    pub fn entry_count(&self) -> usize {
        self.registry.lock().borrow().entries.len()
    }

    /// Copy of the event log.
    pub fn events(&self) -> Vec<VaultEvent> {
        self.registry.lock().borrow().events.clone()
    }
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("config", &self.config)
            .field("entries", &self.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strongbox_protocol::clock::ManualClock;
    use strongbox_protocol::config::NETWORK_ID_DEVNET;
    use strongbox_protocol::crypto::Keypair;
    use strongbox_protocol::ledger::{FungibleToken, Ledgers, NativeCurrency};

    const T0: Timestamp = 1_700_000_000;

    struct Fixture {
        world: Arc<Ledgers>,
        clock: Arc<ManualClock>,
        vault: Vault,
        depositor: Keypair,
    }

    fn fixture() -> Fixture {
        let world = Arc::new(Ledgers::new());
        let clock = Arc::new(ManualClock::new(T0));
        let depositor = Keypair::generate();
        let config = VaultConfig::derived(&depositor.address(), NETWORK_ID_DEVNET);
        let vault = Vault::new(config, world.clone(), clock.clone());
        world.native_ledger().mint(&depositor.address(), 1_000).unwrap();
        Fixture {
            world,
            clock,
            vault,
            depositor,
        }
    }

    #[test]
    fn test_ids_are_sequential_from_zero() {
        let f = fixture();
        let who = f.depositor.address();
        for expected in 0..3u64 {
            let id = f.vault.create_vault(&who, CreateVault::native(10, T0), 10).unwrap();
            assert_eq!(id, expected);
        }
        assert_eq!(f.vault.entry_count(), 3);
        assert_eq!(f.vault.events().len(), 3);
    }

    #[test]
    fn test_unknown_kind_and_zero_amount() {
        let f = fixture();
        let who = f.depositor.address();
        let mut bad = CreateVault::native(10, T0);
        bad.asset_kind = 4;
        assert_eq!(f.vault.create_vault(&who, bad, 10), Err(VaultError::UnknownAssetKind(4)));
        assert_eq!(
            f.vault.create_vault(&who, CreateVault::native(0, T0), 0),
            Err(VaultError::ZeroAmount {
                kind: AssetKind::Native
            })
        );
        assert_eq!(f.vault.entry_count(), 0);
    }

    #[test]
    fn test_native_address_is_normalized_to_zero() {
        let f = fixture();
        let who = f.depositor.address();
        let mut req = CreateVault::native(10, T0);
        req.asset_address = Address::from_bytes([9; 32]);
        let id = f.vault.create_vault(&who, req, 10).unwrap();
        assert_eq!(f.vault.entry(id).unwrap().asset_address, Address::ZERO);
    }

    #[test]
    fn test_failed_pull_records_nothing() {
        let f = fixture();
        let who = f.depositor.address();
        let token = f.world.deploy_fungible(Address::from_bytes([0x10; 32]), "T", "T").unwrap();
        token.mint(&who, 5).unwrap();
        let err = f
            .vault
            .create_vault(&who, CreateVault::fungible(Address::from_bytes([0x10; 32]), 5, T0), 0)
            .unwrap_err();
        assert_eq!(err.code(), "TransferRejected()");
        assert_eq!(f.vault.entry_count(), 0);
        assert!(f.vault.events().is_empty());
        assert_eq!(token.balance_of(&who), 5);
    }

    #[test]
    fn test_withdraw_checks_in_order() {
        let f = fixture();
        let who = f.depositor.address();
        let to = Address::from_bytes([2; 32]);
        let id = f.vault.create_vault(&who, CreateVault::native(10, T0 + 100), 10).unwrap();

        // Locked wins over a bad signature.
        let garbage = Signature::from_bytes(vec![1; 64]);
        assert_eq!(
            f.vault.withdraw_asset(&who, id, &to, T0 + 50, &garbage).unwrap_err().code(),
            "AssetLocked()"
        );

        f.clock.advance_to(T0 + 100);
        // Expired wins over a bad signature.
        assert_eq!(
            f.vault.withdraw_asset(&who, id, &to, T0 + 50, &garbage).unwrap_err().code(),
            "SignatureExpired()"
        );
        assert_eq!(
            f.vault.withdraw_asset(&who, id, &to, T0 + 200, &garbage),
            Err(VaultError::InvalidSignature)
        );
        assert_eq!(
            f.vault.withdraw_asset(&who, 99, &to, T0 + 200, &garbage),
            Err(VaultError::UnknownEntry(99))
        );

        let sig = f.vault.domain().sign(&f.depositor, id, &to, T0 + 200);
        f.vault.withdraw_asset(&who, id, &to, T0 + 200, &sig).unwrap();
        assert_eq!(f.world.native().balance_of(&to), 10);
        assert!(f.vault.entry(id).unwrap().withdrawn);
        assert_eq!(
            f.vault.withdraw_asset(&who, id, &to, T0 + 200, &sig),
            Err(VaultError::AlreadyWithdrawn(id))
        );
    }

    #[test]
    fn test_withdraw_event_records_relayer() {
        let f = fixture();
        let who = f.depositor.address();
        let to = Address::from_bytes([2; 32]);
        let relayer = Address::from_bytes([3; 32]);
        let id = f.vault.create_vault(&who, CreateVault::native(10, T0), 10).unwrap();
        let sig = f.vault.domain().sign(&f.depositor, id, &to, T0);
        f.vault.withdraw_asset(&relayer, id, &to, T0, &sig).unwrap();

        assert_eq!(
            f.vault.events().last(),
            Some(&VaultEvent::AssetWithdrawn {
                entry_id: id,
                recipient: to,
                relayer,
                withdrawn_at: T0,
            })
        );
    }

    #[test]
    fn test_restore_rejects_gaps() {
        let f = fixture();
        let who = f.depositor.address();
        f.vault.create_vault(&who, CreateVault::native(10, T0), 10).unwrap();
        let mut entries = f.vault.entries();
        entries[0].id = 5;
        let err = Vault::restore(f.vault.config(), f.world.clone(), f.clock.clone(), entries, vec![]).unwrap_err();
        assert_eq!(err, VaultError::InconsistentRestore { position: 0, id: 5 });
    }

    #[test]
    fn test_message_hash_needs_no_entry() {
        let f = fixture();
        let to = Address::from_bytes([2; 32]);
        assert_eq!(
            f.vault.get_message_hash(42, &to, T0),
            f.vault.domain().compute_digest(42, &to, T0)
        );
    }
}
