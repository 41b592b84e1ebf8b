//! # Ledger Directory
//!
//! [`Ledgers`] is the in-memory world of asset contracts: one native
//! currency plus any number of fungible, unique and multi token contracts,
//! each at its own address. It implements [`AssetServices`] so a vault can
//! resolve the asset address recorded on an entry to the service that
//! moves it.
//!
//! All contracts share one [`HookRegistry`], so an address that refuses
//! native value also refuses unique and multi tokens.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::fungible::{FungibleLedger, FungibleState};
use super::hooks::HookRegistry;
use super::native::{NativeLedger, NativeState};
use super::non_fungible::{NonFungibleLedger, NonFungibleState};
use super::semi_fungible::{SemiFungibleLedger, SemiFungibleState};
use super::{
    AssetServices, FungibleToken, LedgerError, NativeCurrency, NonFungibleToken, SemiFungibleToken,
};
use crate::types::Address;

/// Everything needed to rebuild a [`Ledgers`]. Hooks are code, not state,
/// and are not part of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub native: NativeState,
    pub fungible: Vec<(Address, FungibleState)>,
    pub non_fungible: Vec<(Address, NonFungibleState)>,
    pub semi_fungible: Vec<(Address, SemiFungibleState)>,
}

/// In-memory asset contracts, addressable by [`Address`].
#[derive(Debug)]
pub struct Ledgers {
    hooks: Arc<HookRegistry>,
    native: NativeLedger,
    fungible: RwLock<BTreeMap<Address, Arc<FungibleLedger>>>,
    non_fungible: RwLock<BTreeMap<Address, Arc<NonFungibleLedger>>>,
    semi_fungible: RwLock<BTreeMap<Address, Arc<SemiFungibleLedger>>>,
}

impl Default for Ledgers {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledgers {
    /// A world with an empty native currency and no token contracts.
    pub fn new() -> Self {
        let hooks = Arc::new(HookRegistry::new());
        Self {
            native: NativeLedger::new(Arc::clone(&hooks)),
            hooks,
            fungible: RwLock::new(BTreeMap::new()),
            non_fungible: RwLock::new(BTreeMap::new()),
            semi_fungible: RwLock::new(BTreeMap::new()),
        }
    }

    /// Rebuilds the world from a snapshot.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        let hooks = Arc::new(HookRegistry::new());
        let fungible = snapshot
            .fungible
            .into_iter()
            .map(|(addr, state)| (addr, Arc::new(FungibleLedger::from_state(state))))
            .collect();
        let non_fungible = snapshot
            .non_fungible
            .into_iter()
            .map(|(addr, state)| {
                let ledger = NonFungibleLedger::from_state(addr, state, Arc::clone(&hooks));
                (addr, Arc::new(ledger))
            })
            .collect();
        let semi_fungible = snapshot
            .semi_fungible
            .into_iter()
            .map(|(addr, state)| {
                let ledger = SemiFungibleLedger::from_state(addr, state, Arc::clone(&hooks));
                (addr, Arc::new(ledger))
            })
            .collect();
        Self {
            native: NativeLedger::from_state(snapshot.native, Arc::clone(&hooks)),
            hooks,
            fungible: RwLock::new(fungible),
            non_fungible: RwLock::new(non_fungible),
            semi_fungible: RwLock::new(semi_fungible),
        }
    }

    /// Captures every contract's state.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            native: self.native.snapshot(),
            fungible: self
                .fungible
                .read()
                .iter()
                .map(|(addr, l)| (*addr, l.snapshot()))
                .collect(),
            non_fungible: self
                .non_fungible
                .read()
                .iter()
                .map(|(addr, l)| (*addr, l.snapshot()))
                .collect(),
            semi_fungible: self
                .semi_fungible
                .read()
                .iter()
                .map(|(addr, l)| (*addr, l.snapshot()))
                .collect(),
        }
    }

    /// The shared receive-hook table.
    pub fn hooks(&self) -> &Arc<HookRegistry> {
        &self.hooks
    }

    /// The concrete native ledger (for minting).
    pub fn native_ledger(&self) -> &NativeLedger {
        &self.native
    }

    fn is_taken(&self, address: &Address) -> bool {
        address.is_zero()
            || self.fungible.read().contains_key(address)
            || self.non_fungible.read().contains_key(address)
            || self.semi_fungible.read().contains_key(address)
    }

    /// Deploys a fungible token at `address`.
    pub fn deploy_fungible(
        &self,
        address: Address,
        name: &str,
        symbol: &str,
    ) -> Result<Arc<FungibleLedger>, LedgerError> {
        if self.is_taken(&address) {
            return Err(LedgerError::AssetExists(address));
        }
        let ledger = Arc::new(FungibleLedger::new(name, symbol));
        self.fungible.write().insert(address, Arc::clone(&ledger));
        info!(address = %address.short(), name, symbol, "fungible token deployed");
        Ok(ledger)
    }

    /// Deploys a unique token collection at `address`.
    pub fn deploy_non_fungible(
        &self,
        address: Address,
        name: &str,
        symbol: &str,
    ) -> Result<Arc<NonFungibleLedger>, LedgerError> {
        if self.is_taken(&address) {
            return Err(LedgerError::AssetExists(address));
        }
        let ledger = Arc::new(NonFungibleLedger::new(
            address,
            name,
            symbol,
            Arc::clone(&self.hooks),
        ));
        self.non_fungible.write().insert(address, Arc::clone(&ledger));
        info!(address = %address.short(), name, symbol, "unique token deployed");
        Ok(ledger)
    }

    /// Deploys a multi token at `address`.
    pub fn deploy_semi_fungible(
        &self,
        address: Address,
        name: &str,
    ) -> Result<Arc<SemiFungibleLedger>, LedgerError> {
        if self.is_taken(&address) {
            return Err(LedgerError::AssetExists(address));
        }
        let ledger = Arc::new(SemiFungibleLedger::new(
            address,
            name,
            Arc::clone(&self.hooks),
        ));
        self.semi_fungible.write().insert(address, Arc::clone(&ledger));
        info!(address = %address.short(), name, "multi token deployed");
        Ok(ledger)
    }

    /// The concrete fungible ledger at `address`.
    pub fn fungible_ledger(&self, address: &Address) -> Option<Arc<FungibleLedger>> {
        self.fungible.read().get(address).cloned()
    }

    /// The concrete unique token ledger at `address`.
    pub fn non_fungible_ledger(&self, address: &Address) -> Option<Arc<NonFungibleLedger>> {
        self.non_fungible.read().get(address).cloned()
    }

    /// The concrete multi token ledger at `address`.
    pub fn semi_fungible_ledger(&self, address: &Address) -> Option<Arc<SemiFungibleLedger>> {
        self.semi_fungible.read().get(address).cloned()
    }
}

impl AssetServices for Ledgers {
    fn native(&self) -> &dyn NativeCurrency {
        &self.native
    }

    fn fungible(&self, address: &Address) -> Option<Arc<dyn FungibleToken>> {
        self.fungible_ledger(address)
            .map(|l| l as Arc<dyn FungibleToken>)
    }

    fn non_fungible(&self, address: &Address) -> Option<Arc<dyn NonFungibleToken>> {
        self.non_fungible_ledger(address)
            .map(|l| l as Arc<dyn NonFungibleToken>)
    }

    fn semi_fungible(&self, address: &Address) -> Option<Arc<dyn SemiFungibleToken>> {
        self.semi_fungible_ledger(address)
            .map(|l| l as Arc<dyn SemiFungibleToken>)
    }
}
