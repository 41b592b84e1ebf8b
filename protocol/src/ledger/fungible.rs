//! # Fungible Token Ledger
//!
//! Balances plus allowances, the classic two-step "approve, then let the
//! spender pull" model. The vault never receives tokens pushed at it: the
//! depositor approves the vault, and the vault pulls with
//! [`transfer_from`](FungibleToken::transfer_from).
//!
//! Fungible transfers never consult receive hooks.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{debit, FungibleToken, LedgerError};
use crate::types::{Address, Amount};

/// Persistable state of a [`FungibleLedger`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FungibleState {
    /// Human-readable name.
    pub name: String,
    /// Ticker.
    pub symbol: String,
    /// Sum of all balances.
    pub total_supply: Amount,
    /// Balance per account.
    pub balances: BTreeMap<Address, Amount>,
    /// `(owner, spender) -> remaining allowance`.
    pub allowances: BTreeMap<(Address, Address), Amount>,
}

/// In-memory fungible token.
#[derive(Debug)]
pub struct FungibleLedger {
    state: Mutex<FungibleState>,
}

impl FungibleLedger {
    /// A token with zero supply.
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self::from_state(FungibleState {
            name: name.into(),
            symbol: symbol.into(),
            ..FungibleState::default()
        })
    }

    /// Rebuilds a ledger from a snapshot.
    pub fn from_state(state: FungibleState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> FungibleState {
        self.state.lock().clone()
    }

    /// Token name.
    pub fn name(&self) -> String {
        self.state.lock().name.clone()
    }

    /// Token symbol.
    pub fn symbol(&self) -> String {
        self.state.lock().symbol.clone()
    }

    /// Total supply.
    pub fn total_supply(&self) -> Amount {
        self.state.lock().total_supply
    }

    /// Creates new supply for `to`.
    pub fn mint(&self, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        let mut state = self.state.lock();
        let supply = state
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let balance = state.balances.entry(*to).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
        state.total_supply = supply;
        Ok(())
    }
}

/// Moves `amount` inside an already-locked state.
fn move_balance(
    state: &mut FungibleState,
    from: &Address,
    to: &Address,
    amount: Amount,
) -> Result<(), LedgerError> {
    if to.is_zero() {
        return Err(LedgerError::ZeroAddress);
    }
    let from_balance = state.balances.get(from).copied().unwrap_or(0);
    let new_from = debit(from, from_balance, amount)?;
    if from == to {
        return Ok(());
    }
    let to_balance = state.balances.get(to).copied().unwrap_or(0);
    let new_to = to_balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
    state.balances.insert(*from, new_from);
    state.balances.insert(*to, new_to);
    Ok(())
}

impl FungibleToken for FungibleLedger {
    fn balance_of(&self, account: &Address) -> Amount {
        self.state.lock().balances.get(account).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.state
            .lock()
            .allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    fn approve(&self, owner: &Address, spender: &Address, amount: Amount) -> Result<(), LedgerError> {
        if spender.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        self.state
            .lock()
            .allowances
            .insert((*owner, *spender), amount);
        Ok(())
    }

    fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        let mut state = self.state.lock();
        move_balance(&mut state, from, to, amount)?;
        debug!(token = %state.symbol, from = %from.short(), to = %to.short(), amount, "fungible transfer");
        Ok(())
    }

    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.lock();
        let key = (*from, *spender);
        let allowance = state.allowances.get(&key).copied().unwrap_or(0);
        let remaining = allowance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientAllowance {
                owner: *from,
                spender: *spender,
                allowance,
                requested: amount,
            })?;
        move_balance(&mut state, from, to, amount)?;
        state.allowances.insert(key, remaining);
        debug!(
            token = %state.symbol,
            spender = %spender.short(),
            from = %from.short(),
            to = %to.short(),
            amount,
            "fungible transfer_from"
        );
        Ok(())
    }
}
