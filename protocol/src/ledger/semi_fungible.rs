//! # Multi Token Ledger
//!
//! Fungible quantities keyed by token id. Only the owner or an operator
//! approved for all of the owner's balances may move them; there are no
//! per-amount allowances.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::hooks::{HookRegistry, Incoming, Receipt};
use super::{debit, LedgerError, SemiFungibleToken};
use crate::types::{Address, Amount, TokenId};

/// Persistable state of a [`SemiFungibleLedger`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemiFungibleState {
    /// Human-readable name.
    pub name: String,
    /// `(token_id, account) -> balance`.
    pub balances: BTreeMap<(TokenId, Address), Amount>,
    /// `(owner, operator)` pairs with blanket approval.
    pub operators: BTreeSet<(Address, Address)>,
}

impl SemiFungibleState {
    fn balance(&self, account: &Address, token_id: TokenId) -> Amount {
        self.balances
            .get(&(token_id, *account))
            .copied()
            .unwrap_or(0)
    }

    fn check_transfer(
        &self,
        operator: &Address,
        from: &Address,
        token_id: TokenId,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        if operator != from && !self.operators.contains(&(*from, *operator)) {
            return Err(LedgerError::NotApproved {
                operator: *operator,
                owner: *from,
            });
        }
        debit(from, self.balance(from, token_id), amount)
    }
}

/// In-memory multi token.
#[derive(Debug)]
pub struct SemiFungibleLedger {
    address: Address,
    state: Mutex<SemiFungibleState>,
    hooks: Arc<HookRegistry>,
}

impl SemiFungibleLedger {
    /// An empty multi token deployed at `address`.
    pub fn new(address: Address, name: impl Into<String>, hooks: Arc<HookRegistry>) -> Self {
        let state = SemiFungibleState {
            name: name.into(),
            ..SemiFungibleState::default()
        };
        Self::from_state(address, state, hooks)
    }

    /// Rebuilds a ledger from a snapshot.
    pub fn from_state(address: Address, state: SemiFungibleState, hooks: Arc<HookRegistry>) -> Self {
        Self {
            address,
            state: Mutex::new(state),
            hooks,
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> SemiFungibleState {
        self.state.lock().clone()
    }

    /// Token name.
    pub fn name(&self) -> String {
        self.state.lock().name.clone()
    }

    /// Mints `amount` of `token_id` to `to`.
    pub fn mint(&self, to: &Address, token_id: TokenId, amount: Amount) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        let mut state = self.state.lock();
        let balance = state.balances.entry((token_id, *to)).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }
}

impl SemiFungibleToken for SemiFungibleLedger {
    fn balance_of(&self, account: &Address, token_id: TokenId) -> Amount {
        self.state.lock().balance(account, token_id)
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
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        self.state
            .lock()
            .check_transfer(operator, from, token_id, amount)?;

        self.hooks.notify(&Receipt {
            operator: *operator,
            from: *from,
            to: *to,
            incoming: Incoming::SemiFungible {
                asset: self.address,
                token_id,
                amount,
            },
        })?;

        let mut state = self.state.lock();
        let new_from = state.check_transfer(operator, from, token_id, amount)?;
        if from == to {
            return Ok(());
        }
        let new_to = state
            .balance(to, token_id)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        state.balances.insert((token_id, *from), new_from);
        state.balances.insert((token_id, *to), new_to);

        debug!(
            token = %state.name,
            token_id,
            amount,
            from = %from.short(),
            to = %to.short(),
            "multi token transfer"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 32])
    }

    fn token() -> SemiFungibleLedger {
        let t = SemiFungibleLedger::new(addr(0xD0), "Test Multi", Arc::new(HookRegistry::new()));
        t.mint(&addr(1), 0, 10).unwrap();
        t
    }

    #[test]
    fn test_mint_and_balance() {
        let t = token();
        assert_eq!(t.balance_of(&addr(1), 0), 10);
        assert_eq!(t.balance_of(&addr(1), 1), 0);
    }

    #[test]
    fn test_owner_can_transfer() {
        let t = token();
        t.safe_transfer_from(&addr(1), &addr(1), &addr(2), 0, 4).unwrap();
        assert_eq!(t.balance_of(&addr(1), 0), 6);
        assert_eq!(t.balance_of(&addr(2), 0), 4);
    }

    #[test]
    fn test_operator_requires_approval() {
        let t = token();
        assert!(matches!(
            t.safe_transfer_from(&addr(9), &addr(1), &addr(9), 0, 1),
            Err(LedgerError::NotApproved { .. })
        ));
        t.set_approval_for_all(&addr(1), &addr(9), true);
        t.safe_transfer_from(&addr(9), &addr(1), &addr(9), 0, 10).unwrap();
        assert_eq!(t.balance_of(&addr(9), 0), 10);

        t.set_approval_for_all(&addr(1), &addr(9), false);
        t.mint(&addr(1), 0, 1).unwrap();
        assert!(t.safe_transfer_from(&addr(9), &addr(1), &addr(9), 0, 1).is_err());
    }

    #[test]
    fn test_insufficient_balance() {
        let t = token();
        assert!(matches!(
            t.safe_transfer_from(&addr(1), &addr(1), &addr(2), 0, 11),
            Err(LedgerError::InsufficientBalance { .. })
        ));
    }
}
