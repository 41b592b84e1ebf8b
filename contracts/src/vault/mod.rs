//! # Vault
//!
//! Time-locked custody with signature-gated release.
//!
//! ## Architecture
//!
//! ```text
//! entry.rs          — VaultEntry, AssetKind, EntryState
//! error.rs          — VaultError with stable codes
//! events.rs         — VaultEvent audit log
//! adapter.rs        — pull_in / push_out over the four asset kinds
//! authorization.rs  — canonical digest, signing envelope, verification
//! timelock.rs       — unlock and deadline checks
//! registry.rs       — Vault: the entry table and its two operations
//! store.rs          — loading and saving a vault with its ledgers
//! ```

pub mod adapter;
pub mod authorization;
pub mod entry;
pub mod error;
pub mod events;
pub mod registry;
pub mod store;
pub mod timelock;

pub use adapter::{adapter_for, AssetAdapter, AssetRef};
pub use authorization::AuthorizationDomain;
pub use entry::{AssetKind, EntryId, EntryState, ParseAssetKindError, VaultEntry};
pub use error::VaultError;
pub use events::VaultEvent;
pub use registry::{CreateVault, Vault, VaultConfig};
pub use store::{StoreError, VaultStore};
