//! # Cryptographic Primitives for Strongbox
//!
//! Everything security-related flows through here: account keys, digest
//! hashing and digest signatures.
//!
//! - **Ed25519** for account keys and signatures.
//! - **BLAKE3** for digests and derived addresses, always domain-separated
//!   when the output is bound to a purpose.
//!
//! Everything here is a thin, type-safe wrapper around audited
//! implementations. We don't roll our own.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{blake3_hash, domain_separated_hash, domain_separated_hash_multi, Digest};
pub use keys::{Keypair, Signature};
pub use signatures::{sign_digest, signed_message, verify_digest};
