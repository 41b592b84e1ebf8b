//! # Storage Module
//!
//! Persistent storage for a Strongbox deployment: vault entries, the vault
//! event log and the asset ledgers, all in one embedded sled database.
//!
//! ```text
//! db.rs — VaultDb: sled trees, atomic commits, bincode records
//! ```
//!
//! Bincode is the on-disk format. JSON is for the CLI and the address
//! book; bincode is for storage.

pub mod db;

pub use db::{Commit, DbError, DbResult, VaultDb};
