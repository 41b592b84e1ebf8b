//! # Strongbox Contracts
//!
//! The vault itself. A depositor locks one asset unit (native currency, a
//! fungible balance, a unique token or a multi token quantity) until an
//! unlock time, and it leaves only to a recipient the depositor named in a
//! signed authorization.
//!
//! ## Design Principles
//!
//! 1. All amounts are checked; the asset services refuse rather than wrap.
//! 2. Entry state is explicit and moves one way: `Active` to `Withdrawn`.
//! 3. The depositor's signature gates every release. Anyone may relay it.
//! 4. Every public type is serializable (serde) for persistence and tooling.

pub mod vault;
