//! # Asset Adapters
//!
//! One uniform pair of operations over the four asset kinds: pull an asset
//! from a depositor into vault custody, and push it from custody to a
//! recipient. Each call moves exactly one asset unit, once. No retries.
//!
//! | Kind          | pull_in                                   | push_out                        |
//! |---------------|-------------------------------------------|---------------------------------|
//! | Native        | attached value moves depositor → vault    | `transfer(vault, to)`           |
//! | Fungible      | `transfer_from` with the vault as spender | `transfer(vault, to)`           |
//! | NonFungible   | `safe_transfer_from` vault as operator    | `safe_transfer_from(vault, to)` |
//! | SemiFungible  | `safe_transfer_from` vault as operator    | `safe_transfer_from(vault, to)` |
//!
//! Only native deposits carry attached value, and it must equal the amount.
//! Any refusal by the asset service, including "nothing deployed at that
//! address", becomes [`VaultError::TransferRejected`].

use strongbox_protocol::ledger::{AssetServices, LedgerError};
use strongbox_protocol::types::{Address, Amount, TokenId};

use super::entry::{AssetKind, VaultEntry};
use super::error::VaultError;

/// The asset half of an entry: what moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetRef {
    pub kind: AssetKind,
    pub address: Address,
    pub token_id: TokenId,
    pub amount: Amount,
}

impl From<&VaultEntry> for AssetRef {
    fn from(entry: &VaultEntry) -> Self {
        Self {
            kind: entry.asset_kind,
            address: entry.asset_address,
            token_id: entry.token_id,
            amount: entry.amount,
        }
    }
}

/// Moves one kind of asset in and out of vault custody.
pub trait AssetAdapter: Send + Sync {
    /// Moves `asset` from `from` into custody at `vault`.
    fn pull_in(
        &self,
        services: &dyn AssetServices,
        asset: &AssetRef,
        from: &Address,
        vault: &Address,
        attached_value: Amount,
    ) -> Result<(), VaultError>;

    /// Releases `asset` from custody at `vault` to `to`.
    fn push_out(
        &self,
        services: &dyn AssetServices,
        asset: &AssetRef,
        vault: &Address,
        to: &Address,
    ) -> Result<(), VaultError>;
}

/// The adapter for `kind`.
pub fn adapter_for(kind: AssetKind) -> &'static dyn AssetAdapter {
    match kind {
        AssetKind::Native => &NativeAdapter,
        AssetKind::Fungible => &FungibleAdapter,
        AssetKind::NonFungible => &NonFungibleAdapter,
        AssetKind::SemiFungible => &SemiFungibleAdapter,
    }
}

fn expect_no_value(attached_value: Amount) -> Result<(), VaultError> {
    if attached_value != 0 {
        return Err(VaultError::ValueMismatch {
            attached: attached_value,
            expected: 0,
        });
    }
    Ok(())
}

fn missing(asset: &AssetRef) -> VaultError {
    VaultError::rejected(asset.kind, LedgerError::UnknownAsset(asset.address))
}

// ---------------------------------------------------------------------------
// Adapters
// ---------------------------------------------------------------------------

/// Native currency.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeAdapter;

impl AssetAdapter for NativeAdapter {
    fn pull_in(
        &self,
        services: &dyn AssetServices,
        asset: &AssetRef,
        from: &Address,
        vault: &Address,
        attached_value: Amount,
    ) -> Result<(), VaultError> {
        if attached_value != asset.amount {
            return Err(VaultError::ValueMismatch {
                attached: attached_value,
                expected: asset.amount,
            });
        }
        services
            .native()
            .transfer(from, vault, attached_value)
            .map_err(|e| VaultError::rejected(asset.kind, e))
    }

    fn push_out(
        &self,
        services: &dyn AssetServices,
        asset: &AssetRef,
        vault: &Address,
        to: &Address,
    ) -> Result<(), VaultError> {
        services
            .native()
            .transfer(vault, to, asset.amount)
            .map_err(|e| VaultError::rejected(asset.kind, e))
    }
}

/// Fungible tokens, pulled through an allowance.
#[derive(Debug, Clone, Copy, Default)]
pub struct FungibleAdapter;

impl AssetAdapter for FungibleAdapter {
    fn pull_in(
        &self,
        services: &dyn AssetServices,
        asset: &AssetRef,
        from: &Address,
        vault: &Address,
        attached_value: Amount,
    ) -> Result<(), VaultError> {
        expect_no_value(attached_value)?;
        let token = services.fungible(&asset.address).ok_or_else(|| missing(asset))?;
        token
            .transfer_from(vault, from, vault, asset.amount)
            .map_err(|e| VaultError::rejected(asset.kind, e))
    }

    fn push_out(
        &self,
        services: &dyn AssetServices,
        asset: &AssetRef,
        vault: &Address,
        to: &Address,
    ) -> Result<(), VaultError> {
        let token = services.fungible(&asset.address).ok_or_else(|| missing(asset))?;
        token
            .transfer(vault, to, asset.amount)
            .map_err(|e| VaultError::rejected(asset.kind, e))
    }
}

/// Unique tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonFungibleAdapter;

impl AssetAdapter for NonFungibleAdapter {
    fn pull_in(
        &self,
        services: &dyn AssetServices,
        asset: &AssetRef,
        from: &Address,
        vault: &Address,
        attached_value: Amount,
    ) -> Result<(), VaultError> {
        expect_no_value(attached_value)?;
        let token = services
            .non_fungible(&asset.address)
            .ok_or_else(|| missing(asset))?;
        token
            .safe_transfer_from(vault, from, vault, asset.token_id)
            .map_err(|e| VaultError::rejected(asset.kind, e))
    }

    fn push_out(
        &self,
        services: &dyn AssetServices,
        asset: &AssetRef,
        vault: &Address,
        to: &Address,
    ) -> Result<(), VaultError> {
        let token = services
            .non_fungible(&asset.address)
            .ok_or_else(|| missing(asset))?;
        token
            .safe_transfer_from(vault, vault, to, asset.token_id)
            .map_err(|e| VaultError::rejected(asset.kind, e))
    }
}

/// Multi tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemiFungibleAdapter;

impl AssetAdapter for SemiFungibleAdapter {
    fn pull_in(
        &self,
        services: &dyn AssetServices,
        asset: &AssetRef,
        from: &Address,
        vault: &Address,
        attached_value: Amount,
    ) -> Result<(), VaultError> {
        expect_no_value(attached_value)?;
        let token = services
            .semi_fungible(&asset.address)
            .ok_or_else(|| missing(asset))?;
        token
            .safe_transfer_from(vault, from, vault, asset.token_id, asset.amount)
            .map_err(|e| VaultError::rejected(asset.kind, e))
    }

    fn push_out(
        &self,
        services: &dyn AssetServices,
        asset: &AssetRef,
        vault: &Address,
        to: &Address,
    ) -> Result<(), VaultError> {
        let token = services
            .semi_fungible(&asset.address)
            .ok_or_else(|| missing(asset))?;
        token
            .safe_transfer_from(vault, vault, to, asset.token_id, asset.amount)
            .map_err(|e| VaultError::rejected(asset.kind, e))
    }
}
