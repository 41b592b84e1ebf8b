//! Native currency balances.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::hooks::{HookRegistry, Incoming, Receipt};
use super::{debit, LedgerError, NativeCurrency};
use crate::types::{Address, Amount};

/// Persistable state of a [`NativeLedger`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeState {
    /// Balance per account. Zero balances may be absent.
    pub balances: BTreeMap<Address, Amount>,
    /// Sum of all balances.
    pub total_supply: Amount,
}

/// In-memory native currency.
#[derive(Debug)]
pub struct NativeLedger {
    state: Mutex<NativeState>,
    hooks: Arc<HookRegistry>,
}

impl NativeLedger {
    /// An empty ledger sharing `hooks`.
    pub fn new(hooks: Arc<HookRegistry>) -> Self {
        Self::from_state(NativeState::default(), hooks)
    }

    /// Rebuilds a ledger from a snapshot.
    pub fn from_state(state: NativeState, hooks: Arc<HookRegistry>) -> Self {
        Self {
            state: Mutex::new(state),
            hooks,
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> NativeState {
        self.state.lock().clone()
    }

    /// Creates `amount` out of thin air for `to`. Devnet faucet and tests only.
    pub fn mint(&self, to: &Address, amount: Amount) -> Result<(), LedgerError> {
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

    /// Total native supply.
    pub fn total_supply(&self) -> Amount {
        self.state.lock().total_supply
    }
}

impl NativeCurrency for NativeLedger {
    fn balance_of(&self, account: &Address) -> Amount {
        self.state.lock().balances.get(account).copied().unwrap_or(0)
    }

    fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        // Fail fast before bothering the recipient.
        debit(from, self.balance_of(from), amount)?;

        self.hooks.notify(&Receipt {
            operator: *from,
            from: *from,
            to: *to,
            incoming: Incoming::Native { amount },
        })?;

        let mut state = self.state.lock();
        let from_balance = state.balances.get(from).copied().unwrap_or(0);
        let new_from = debit(from, from_balance, amount)?;
        if from == to {
            return Ok(());
        }
        let to_balance = state.balances.get(to).copied().unwrap_or(0);
        let new_to = to_balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
        state.balances.insert(*from, new_from);
        state.balances.insert(*to, new_to);

        debug!(from = %from.short(), to = %to.short(), amount, "native transfer");
        Ok(())
    }
}
