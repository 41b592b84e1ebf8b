// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Strongbox Protocol — Core Library
//!
//! Everything a time-locked, signature-released vault needs that is not the
//! vault itself: identities and signatures, canonical digests, a clock, the
//! asset services the vault moves value through, and persistence.
//!
//! ## Architecture
//!
//! - **types** — Addresses, amounts, token ids, timestamps, unit parsing.
//! - **config** — Protocol constants: network ids, digest contexts, lengths.
//! - **crypto** — Ed25519 keys, BLAKE3 hashing, digest signing envelope.
//! - **clock** — Where "now" comes from. System time or a hand-cranked clock.
//! - **ledger** — In-memory native, fungible, unique and multi token services.
//! - **storage** — sled persistence for entries, events and ledgers.
//!
//! The vault registry lives in `strongbox-contracts` and depends only on
//! the traits exported here.

pub mod clock;
pub mod config;
pub mod crypto;
pub mod ledger;
pub mod storage;
pub mod types;
