//! # Asset Ledgers
//!
//! The external asset services a vault moves value through. From the vault's
//! point of view these are black boxes: it asks for a transfer and either
//! the transfer happens or it gets a [`LedgerError`] back.
//!
//! ## Architecture
//!
//! ```text
//! hooks.rs          — Receive hooks: recipients that accept or refuse incoming assets
//! native.rs         — Native currency balances
//! fungible.rs       — Fungible token: balances + allowances
//! non_fungible.rs   — Unique token: ownership + per-token and operator approvals
//! semi_fungible.rs  — Multi token: per-id balances + operator approvals
//! directory.rs      — `Ledgers`: resolves asset addresses to services, snapshots
//! ```
//!
//! ## Contract
//!
//! 1. **One call, one movement.** Every transfer either applies fully or
//!    returns an error with nothing changed.
//! 2. **Accept, then apply.** Recipients with a receive hook are asked
//!    before anything moves. The service holds no lock while the hook runs,
//!    so a hook may call back into whoever initiated the transfer.
//! 3. **Amounts are checked.** `checked_add`/`checked_sub` everywhere.

pub mod directory;
pub mod fungible;
pub mod hooks;
pub mod native;
pub mod non_fungible;
pub mod semi_fungible;

use std::sync::Arc;

use thiserror::Error;

use crate::types::{Address, Amount, TokenId};

pub use directory::{LedgerSnapshot, Ledgers};
pub use fungible::FungibleLedger;
pub use hooks::{HookRegistry, Incoming, ReceiveHook, Receipt};
pub use native::NativeLedger;
pub use non_fungible::NonFungibleLedger;
pub use semi_fungible::SemiFungibleLedger;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why an asset service refused a movement.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient balance for {account}: available {available}, requested {requested}")]
    InsufficientBalance {
        /// The account being debited.
        account: Address,
        /// Its current balance.
        available: Amount,
        /// The amount requested.
        requested: Amount,
    },

    #[error("insufficient allowance: {spender} may spend {allowance} of {owner}'s, requested {requested}")]
    InsufficientAllowance {
        /// Owner of the balance.
        owner: Address,
        /// The party trying to spend it.
        spender: Address,
        /// Remaining allowance.
        allowance: Amount,
        /// The amount requested.
        requested: Amount,
    },

    #[error("{claimed} does not own token {token_id}")]
    NotOwner {
        /// The token in question.
        token_id: TokenId,
        /// The account that claimed ownership.
        claimed: Address,
    },

    #[error("{operator} is not approved to move assets of {owner}")]
    NotApproved {
        /// The party attempting the move.
        operator: Address,
        /// The owner of the assets.
        owner: Address,
    },

    #[error("token {0} does not exist")]
    UnknownToken(TokenId),

    #[error("token {0} already exists")]
    TokenExists(TokenId),

    #[error("no asset contract of the requested kind at {0}")]
    UnknownAsset(Address),

    #[error("an asset contract is already deployed at {0}")]
    AssetExists(Address),

    #[error("transfers to the zero address are not allowed")]
    ZeroAddress,

    #[error("recipient {recipient} refused the transfer: {reason}")]
    Refused {
        /// The refusing recipient.
        recipient: Address,
        /// The reason the hook gave.
        reason: String,
    },

    #[error("amount overflow")]
    Overflow,
}

// ---------------------------------------------------------------------------
// Service interfaces
// ---------------------------------------------------------------------------

/// Native currency.
pub trait NativeCurrency: Send + Sync {
    /// Balance of `account`.
    fn balance_of(&self, account: &Address) -> Amount;

    /// Moves `amount` from `from` to `to`. The recipient's hook, if any, may refuse.
    fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError>;
}

/// Fungible token with balances and allowances.
pub trait FungibleToken: Send + Sync {
    /// Balance of `account`.
    fn balance_of(&self, account: &Address) -> Amount;

    /// How much `spender` may move out of `owner`'s balance.
    fn allowance(&self, owner: &Address, spender: &Address) -> Amount;

    /// Sets `spender`'s allowance over `owner`'s balance.
    fn approve(&self, owner: &Address, spender: &Address, amount: Amount) -> Result<(), LedgerError>;

    /// Moves `amount` from `from` (the caller) to `to`.
    fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError>;

    /// Moves `amount` from `from` to `to` on behalf of `spender`, consuming allowance.
    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError>;
}

/// Unique (non-fungible) token.
pub trait NonFungibleToken: Send + Sync {
    /// Current owner of `token_id`, if minted.
    fn owner_of(&self, token_id: TokenId) -> Option<Address>;

    /// Number of tokens owned by `account`.
    fn balance_of(&self, account: &Address) -> u64;

    /// Approves `spender` for a single token. `caller` must own it or be an operator.
    fn approve(&self, caller: &Address, spender: &Address, token_id: TokenId) -> Result<(), LedgerError>;

    /// Grants or revokes `operator` over every token of `owner`.
    fn set_approval_for_all(&self, owner: &Address, operator: &Address, approved: bool);

    /// Moves `token_id` from `from` to `to` on behalf of `operator`. The
    /// recipient's hook, if any, may refuse.
    fn safe_transfer_from(
        &self,
        operator: &Address,
        from: &Address,
        to: &Address,
        token_id: TokenId,
    ) -> Result<(), LedgerError>;
}

/// Semi-fungible (multi) token: fungible quantities per token id.
pub trait SemiFungibleToken: Send + Sync {
    /// Balance of `account` in `token_id`.
    fn balance_of(&self, account: &Address, token_id: TokenId) -> Amount;

    /// Grants or revokes `operator` over every balance of `owner`.
    fn set_approval_for_all(&self, owner: &Address, operator: &Address, approved: bool);

    /// Moves `amount` of `token_id` from `from` to `to` on behalf of
    /// `operator`. The recipient's hook, if any, may refuse.
    fn safe_transfer_from(
        &self,
        operator: &Address,
        from: &Address,
        to: &Address,
        token_id: TokenId,
        amount: Amount,
    ) -> Result<(), LedgerError>;
}

/// Resolves asset addresses to the service that manages them.
///
/// The vault is generic over this trait; [`Ledgers`] is the in-memory
/// implementation.
pub trait AssetServices: Send + Sync {
    /// The native currency.
    fn native(&self) -> &dyn NativeCurrency;

    /// The fungible token at `address`, if one is deployed there.
    fn fungible(&self, address: &Address) -> Option<Arc<dyn FungibleToken>>;

    /// The unique token at `address`, if one is deployed there.
    fn non_fungible(&self, address: &Address) -> Option<Arc<dyn NonFungibleToken>>;

    /// The multi token at `address`, if one is deployed there.
    fn semi_fungible(&self, address: &Address) -> Option<Arc<dyn SemiFungibleToken>>;
}

/// Subtracts with a balance error instead of wrapping.
pub(crate) fn debit(account: &Address, available: Amount, requested: Amount) -> Result<Amount, LedgerError> {
    available
        .checked_sub(requested)
        .ok_or(LedgerError::InsufficientBalance {
            account: *account,
            available,
            requested,
        })
}
