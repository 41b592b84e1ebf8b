//! # Unique Token Ledger
//!
//! One owner per token id. A token moves when its owner, the address
//! approved for that single token, or an operator approved for all of the
//! owner's tokens asks. Per-token approval is cleared on every move.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::hooks::{HookRegistry, Incoming, Receipt};
use super::{LedgerError, NonFungibleToken};
use crate::types::{Address, TokenId};

/// Persistable state of a [`NonFungibleLedger`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonFungibleState {
    /// Human-readable name.
    pub name: String,
    /// Ticker.
    pub symbol: String,
    /// Owner per minted token.
    pub owners: BTreeMap<TokenId, Address>,
    /// Single-token approvals.
    pub token_approvals: BTreeMap<TokenId, Address>,
    /// `(owner, operator)` pairs with blanket approval.
    pub operators: BTreeSet<(Address, Address)>,
}

impl NonFungibleState {
    fn is_operator(&self, owner: &Address, operator: &Address) -> bool {
        self.operators.contains(&(*owner, *operator))
    }

    fn may_move(&self, operator: &Address, owner: &Address, token_id: TokenId) -> bool {
        operator == owner
            || self.token_approvals.get(&token_id) == Some(operator)
            || self.is_operator(owner, operator)
    }

    /// Ownership and authorization checks shared by the pre-check and the apply step.
    fn check_transfer(
        &self,
        operator: &Address,
        from: &Address,
        token_id: TokenId,
    ) -> Result<(), LedgerError> {
        let owner = self
            .owners
            .get(&token_id)
            .ok_or(LedgerError::UnknownToken(token_id))?;
        if owner != from {
            return Err(LedgerError::NotOwner {
                token_id,
                claimed: *from,
            });
        }
        if !self.may_move(operator, from, token_id) {
            return Err(LedgerError::NotApproved {
                operator: *operator,
                owner: *from,
            });
        }
        Ok(())
    }
}

/// In-memory unique token.
#[derive(Debug)]
pub struct NonFungibleLedger {
    address: Address,
    state: Mutex<NonFungibleState>,
    hooks: Arc<HookRegistry>,
}

impl NonFungibleLedger {
    /// An empty collection deployed at `address`.
    pub fn new(
        address: Address,
        name: impl Into<String>,
        symbol: impl Into<String>,
        hooks: Arc<HookRegistry>,
    ) -> Self {
        let state = NonFungibleState {
            name: name.into(),
            symbol: symbol.into(),
            ..NonFungibleState::default()
        };
        Self::from_state(address, state, hooks)
    }

    /// Rebuilds a ledger from a snapshot.
    pub fn from_state(address: Address, state: NonFungibleState, hooks: Arc<HookRegistry>) -> Self {
        Self {
            address,
            state: Mutex::new(state),
            hooks,
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> NonFungibleState {
        self.state.lock().clone()
    }

    /// Collection name.
    pub fn name(&self) -> String {
        self.state.lock().name.clone()
    }

    /// Mints `token_id` to `to`.
    pub fn mint(&self, to: &Address, token_id: TokenId) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        let mut state = self.state.lock();
        if state.owners.contains_key(&token_id) {
            return Err(LedgerError::TokenExists(token_id));
        }
        state.owners.insert(token_id, *to);
        Ok(())
    }
}

impl NonFungibleToken for NonFungibleLedger {
    fn owner_of(&self, token_id: TokenId) -> Option<Address> {
        self.state.lock().owners.get(&token_id).copied()
    }

    fn balance_of(&self, account: &Address) -> u64 {
        self.state
            .lock()
            .owners
            .values()
            .filter(|owner| *owner == account)
            .count() as u64
    }

    fn approve(&self, caller: &Address, spender: &Address, token_id: TokenId) -> Result<(), LedgerError> {
        let mut state = self.state.lock();
        let owner = *state
            .owners
            .get(&token_id)
            .ok_or(LedgerError::UnknownToken(token_id))?;
        if caller != &owner && !state.is_operator(&owner, caller) {
            return Err(LedgerError::NotApproved {
                operator: *caller,
                owner,
            });
        }
        state.token_approvals.insert(token_id, *spender);
        Ok(())
    }

    fn set_approval_for_all(&self, owner: &Address, operator: &Address, approved: bool) {
        let mut state = self.state.lock();
        if approved {
            state.operators.insert((*owner, *operator));
        } else {
            state.operators.remove(&(*owner, *operator));
        }
    }

    fn safe_transfer_from(
        &self,
        operator: &Address,
        from: &Address,
        to: &Address,
        token_id: TokenId,
    ) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        self.state.lock().check_transfer(operator, from, token_id)?;

        self.hooks.notify(&Receipt {
            operator: *operator,
            from: *from,
            to: *to,
            incoming: Incoming::NonFungible {
                asset: self.address,
                token_id,
            },
        })?;

        // The hook ran unlocked; re-check before applying.
        let mut state = self.state.lock();
        state.check_transfer(operator, from, token_id)?;
        state.owners.insert(token_id, *to);
        state.token_approvals.remove(&token_id);

        debug!(
            collection = %state.symbol,
            token_id,
            from = %from.short(),
            to = %to.short(),
            "unique token transfer"
        );
        Ok(())
    }
}
