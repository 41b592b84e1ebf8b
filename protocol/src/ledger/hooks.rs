//! # Receive Hooks
//!
//! Some recipients are programs, not people. A program registers a
//! [`ReceiveHook`] for its address and gets asked, before any native value,
//! unique token or multi token lands on it, whether it accepts. Refusing
//! aborts the transfer. Fungible tokens never ask.
//!
//! Hooks run with no ledger lock held, so a hook is free to call back into
//! whatever initiated the transfer. That is exactly the reentrancy the vault
//! has to survive.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::LedgerError;
use crate::types::{Address, Amount, TokenId};

/// What is arriving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// Native currency.
    Native { amount: Amount },
    /// A unique token.
    NonFungible { asset: Address, token_id: TokenId },
    /// A quantity of a multi token id.
    SemiFungible {
        asset: Address,
        token_id: TokenId,
        amount: Amount,
    },
}

/// The full description of an inbound transfer handed to a hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Who initiated the transfer.
    pub operator: Address,
    /// Current holder.
    pub from: Address,
    /// The hook's own address.
    pub to: Address,
    /// What is being moved.
    pub incoming: Incoming,
}

/// A recipient program's acceptance check.
pub trait ReceiveHook: Send + Sync {
    /// Return `Err(reason)` to refuse.
    fn on_receive(&self, receipt: &Receipt) -> Result<(), String>;
}

/// Address → hook table shared by every ledger in a [`super::Ledgers`].
#[derive(Default)]
pub struct HookRegistry {
    hooks: RwLock<HashMap<Address, Arc<dyn ReceiveHook>>>,
}

impl HookRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `hook` for `address`, replacing any previous one.
    pub fn register(&self, address: Address, hook: Arc<dyn ReceiveHook>) {
        self.hooks.write().insert(address, hook);
    }

    /// Removes the hook for `address`. Returns whether one was installed.
    pub fn unregister(&self, address: &Address) -> bool {
        self.hooks.write().remove(address).is_some()
    }

    /// Asks the recipient, if it has a hook. Addresses without one accept.
    pub fn notify(&self, receipt: &Receipt) -> Result<(), LedgerError> {
        // Clone the Arc out so the table lock is released before the hook runs.
        let hook = self.hooks.read().get(&receipt.to).cloned();
        let Some(hook) = hook else {
            return Ok(());
        };
        hook.on_receive(receipt).map_err(|reason| {
            debug!(recipient = %receipt.to.short(), %reason, "receive hook refused transfer");
            LedgerError::Refused {
                recipient: receipt.to,
                reason,
            }
        })
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hooks", &self.hooks.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RefuseAll;

    impl ReceiveHook for RefuseAll {
        fn on_receive(&self, _receipt: &Receipt) -> Result<(), String> {
            Err("no thanks".into())
        }
    }

    fn receipt(to: Address) -> Receipt {
        Receipt {
            operator: Address::from_bytes([1; 32]),
            from: Address::from_bytes([1; 32]),
            to,
            incoming: Incoming::Native { amount: 5 },
        }
    }

    #[test]
    fn test_no_hook_accepts() {
        let registry = HookRegistry::new();
        assert!(registry.notify(&receipt(Address::from_bytes([2; 32]))).is_ok());
    }

    #[test]
    fn test_refusing_hook() {
        let registry = HookRegistry::new();
        let to = Address::from_bytes([2; 32]);
        registry.register(to, Arc::new(RefuseAll));
        let err = registry.notify(&receipt(to)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::Refused {
                recipient: to,
                reason: "no thanks".into()
            }
        );
        assert!(registry.unregister(&to));
        assert!(registry.notify(&receipt(to)).is_ok());
    }
}
