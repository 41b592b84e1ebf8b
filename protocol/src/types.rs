//! # Core Value Types
//!
//! The handful of scalar types every other module speaks in: addresses,
//! amounts, token ids and timestamps. Kept deliberately small. If a type
//! is only meaningful to one module, it belongs in that module.
//!
//! ## Amounts
//!
//! Amounts are `u128` in the smallest unit. The display convention is 18
//! decimals (see [`crate::config::DISPLAY_DECIMALS`]), so `1.0` is
//! `1_000_000_000_000_000_000`. The protocol never divides; decimals exist
//! purely for parsing and printing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::config::ADDRESS_LENGTH;
use crate::crypto::hash::domain_separated_hash;

/// Quantity of an asset in its smallest unit.
pub type Amount = u128;

/// Sub-identifier inside a unique or multi token contract.
pub type TokenId = u64;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Errors produced when parsing the textual forms of these types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid address: expected {ADDRESS_LENGTH} hex-encoded bytes")]
    InvalidAddress,

    #[error("invalid amount '{0}'")]
    InvalidAmount(String),

    #[error("too many decimal places in '{input}': at most {decimals} allowed")]
    TooManyDecimals {
        /// The offending input.
        input: String,
        /// The number of decimals the unit supports.
        decimals: u32,
    },
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 32-byte account or contract identifier.
///
/// Accounts are Ed25519 public keys, so an account address doubles as the
/// key its signatures are checked against. Contracts (asset ledgers, the
/// vault itself) get derived addresses that are not valid keys, which is
/// fine: nothing ever signs as a contract.
///
/// Serialized as a lowercase hex string everywhere, including map keys.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// The all-zero address. Used as the asset address of native deposits.
    pub const ZERO: Address = Address([0u8; ADDRESS_LENGTH]);

    /// Wraps raw bytes.
    pub const fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Derives a contract address from a creator and a name.
    ///
    /// Deterministic: the same creator deploying the same name twice gets
    /// the same address, which is how the address book stays stable across
    /// devnet resets.
    pub fn derive(creator: &Address, name: &str) -> Self {
        let mut data = Vec::with_capacity(ADDRESS_LENGTH + name.len());
        data.extend_from_slice(creator.as_bytes());
        data.extend_from_slice(name.as_bytes());
        Self(domain_separated_hash(
            crate::config::CONTRACT_ADDRESS_CONTEXT,
            &data,
        ))
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Whether this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LENGTH]
    }

    /// Lowercase hex, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a hex address, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, ParseError> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed).map_err(|_| ParseError::InvalidAddress)?;
        let arr: [u8; ADDRESS_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| ParseError::InvalidAddress)?;
        Ok(Self(arr))
    }

    /// First eight hex characters, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.short())
    }
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Unit conversion
// ---------------------------------------------------------------------------

/// Parses a decimal string like `"1.5"` into smallest units.
///
/// `parse_units("1.0", 18)` is `10^18`. Rejects negative numbers, more
/// fractional digits than `decimals`, and anything that would overflow.
pub fn parse_units(input: &str, decimals: u32) -> Result<Amount, ParseError> {
    let invalid = || ParseError::InvalidAmount(input.to_string());
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let (whole, frac) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };
    if frac.len() > decimals as usize {
        return Err(ParseError::TooManyDecimals {
            input: input.to_string(),
            decimals,
        });
    }
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let scale = 10u128.checked_pow(decimals).ok_or_else(invalid)?;
    let whole_units = if whole.is_empty() {
        0
    } else {
        whole.parse::<u128>().map_err(|_| invalid())?
    };
    let frac_units = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = decimals as usize);
        padded.parse::<u128>().map_err(|_| invalid())?
    };

    whole_units
        .checked_mul(scale)
        .and_then(|w| w.checked_add(frac_units))
        .ok_or_else(invalid)
}

/// Formats smallest units as a decimal string, trimming trailing zeros.
///
/// `format_units(1_500_000_000_000_000_000, 18)` is `"1.5"`; whole numbers
/// keep a single `.0` so the output always reads as a decimal.
pub fn format_units(amount: Amount, decimals: u32) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let scale = 10u128.pow(decimals);
    let whole = amount / scale;
    let frac = amount % scale;
    let frac_str = format!("{:0width$}", frac, width = decimals as usize);
    let frac_trimmed = frac_str.trim_end_matches('0');
    if frac_trimmed.is_empty() {
        format!("{}.0", whole)
    } else {
        format!("{}.{}", whole, frac_trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: Amount = 1_000_000_000_000_000_000;

    #[test]
    fn address_hex_roundtrip() {
        let addr = Address::from_bytes([0xAB; ADDRESS_LENGTH]);
        let parsed: Address = addr.to_hex().parse().unwrap();
        assert_eq!(addr, parsed);
        assert_eq!(Address::from_hex(&format!("0x{}", addr)).unwrap(), addr);
    }

    #[test]
    fn address_rejects_wrong_length() {
        assert_eq!(Address::from_hex("abcd"), Err(ParseError::InvalidAddress));
        assert_eq!(Address::from_hex("zz"), Err(ParseError::InvalidAddress));
    }

    #[test]
    fn zero_address_is_zero() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::from_bytes([1; ADDRESS_LENGTH]).is_zero());
    }

    #[test]
    fn derived_addresses_depend_on_creator_and_name() {
        let a = Address::from_bytes([1; ADDRESS_LENGTH]);
        let b = Address::from_bytes([2; ADDRESS_LENGTH]);
        assert_eq!(Address::derive(&a, "Vault"), Address::derive(&a, "Vault"));
        assert_ne!(Address::derive(&a, "Vault"), Address::derive(&b, "Vault"));
        assert_ne!(Address::derive(&a, "Vault"), Address::derive(&a, "Token"));
    }

    #[test]
    fn address_serializes_as_hex_string() {
        let addr = Address::from_bytes([7; ADDRESS_LENGTH]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr.to_hex()));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn parse_units_handles_whole_and_fractional() {
        assert_eq!(parse_units("1.0", 18).unwrap(), ONE);
        assert_eq!(parse_units("1", 18).unwrap(), ONE);
        assert_eq!(parse_units("0.5", 18).unwrap(), ONE / 2);
        assert_eq!(parse_units(".25", 18).unwrap(), ONE / 4);
        assert_eq!(parse_units("0.0001", 18).unwrap(), 100_000_000_000_000);
        assert_eq!(parse_units("42", 0).unwrap(), 42);
    }

    #[test]
    fn parse_units_rejects_garbage() {
        assert!(parse_units("", 18).is_err());
        assert!(parse_units(".", 18).is_err());
        assert!(parse_units("-1", 18).is_err());
        assert!(parse_units("1.2.3", 18).is_err());
        assert!(parse_units("abc", 18).is_err());
        assert!(matches!(
            parse_units("0.1234", 2),
            Err(ParseError::TooManyDecimals { .. })
        ));
    }

    #[test]
    fn format_units_trims_trailing_zeros() {
        assert_eq!(format_units(ONE, 18), "1.0");
        assert_eq!(format_units(ONE + ONE / 2, 18), "1.5");
        assert_eq!(format_units(0, 18), "0.0");
        assert_eq!(format_units(1, 18), "0.000000000000000001");
        assert_eq!(format_units(7, 0), "7");
    }
}
