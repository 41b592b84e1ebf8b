//! # Protocol Configuration & Constants
//!
//! Every magic number in Strongbox lives here. If you're hardcoding a
//! constant somewhere else, you're doing it wrong.
//!
//! Several of these values are baked into signatures that already exist in
//! the wild (the digest context and the signed-message prefix). Changing
//! them invalidates every outstanding withdrawal authorization, so treat
//! them as frozen once a network has live vaults.

// ---------------------------------------------------------------------------
// Network Identifiers
// ---------------------------------------------------------------------------

/// Mainnet. Mistakes here cost real money.
pub const NETWORK_ID_MAINNET: u32 = 0x5342_4F58; // "SBOX"

/// Testnet. Public, long-lived, worthless tokens.
pub const NETWORK_ID_TESTNET: u32 = 0x5342_5854; // "SBXT"

/// Devnet. Local state directory, reset whenever you feel like it.
pub const NETWORK_ID_DEVNET: u32 = 0x5342_5844; // "SBXD"

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Address length in bytes. Account addresses are Ed25519 public keys.
pub const ADDRESS_LENGTH: usize = 32;

/// Ed25519 secret key length in bytes.
pub const SIGNING_KEY_LENGTH: usize = 32;

/// Ed25519 signature length. Anything else fails verification.
pub const SIGNATURE_LENGTH: usize = 64;

/// Digest length in bytes (BLAKE3 default output).
pub const DIGEST_LENGTH: usize = 32;

/// BLAKE3 derive-key context for withdrawal authorization digests.
///
/// The context string is the outer domain tag. Network id and vault address
/// are mixed into the hashed data, so a digest for one vault never verifies
/// at another.
pub const AUTHORIZATION_CONTEXT: &str = "strongbox 2026-01 vault withdrawal authorization";

/// BLAKE3 derive-key context for deterministic contract addresses.
pub const CONTRACT_ADDRESS_CONTEXT: &str = "strongbox 2026-01 contract address";

/// Prefix prepended to a digest before it is signed.
///
/// Signers never sign a bare 32-byte digest. The prefix keeps a key that
/// also signs other 32-byte payloads from being tricked into producing a
/// withdrawal authorization.
pub const SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Strongbox Signed Message:\n32";

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// Decimal places used when parsing and printing amounts.
pub const DISPLAY_DECIMALS: u32 = 18;

/// One whole unit in smallest units.
pub const ONE_UNIT: u128 = 1_000_000_000_000_000_000;

/// Native balance granted to freshly initialized devnet accounts.
pub const DEVNET_FAUCET_AMOUNT: u128 = 1_000 * ONE_UNIT;

// ---------------------------------------------------------------------------
// Tooling
// ---------------------------------------------------------------------------

/// Default data directory for the CLI.
pub const DEFAULT_DATA_DIR: &str = ".strongbox";

/// File name of the address book inside the data directory.
pub const ADDRESS_BOOK_FILE: &str = "addresses.json";

/// Address book name under which the vault is recorded.
pub const VAULT_CONTRACT_NAME: &str = "Vault";

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// Returns a friendly name for a network ID, mainly for logging and as the
/// address book key. Unknown networks get a hex dump.
pub fn network_name(network_id: u32) -> String {
    match network_id {
        NETWORK_ID_MAINNET => "mainnet".to_string(),
        NETWORK_ID_TESTNET => "testnet".to_string(),
        NETWORK_ID_DEVNET => "devnet".to_string(),
        other => format!("unknown(0x{:08X})", other),
    }
}

/// Resolves a network name back to its ID. Case-insensitive.
pub fn network_id(name: &str) -> Option<u32> {
    match name.to_ascii_lowercase().as_str() {
        "mainnet" => Some(NETWORK_ID_MAINNET),
        "testnet" => Some(NETWORK_ID_TESTNET),
        "devnet" => Some(NETWORK_ID_DEVNET),
        _ => None,
    }
}
