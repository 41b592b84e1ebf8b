//! Vault entries and the asset kinds they can hold.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use strongbox_protocol::types::{Address, Amount, Timestamp, TokenId};

use super::error::VaultError;

/// Identifier of a vault entry. Assigned from 0 upward, never reused.
pub type EntryId = u64;

/// What kind of asset an entry holds. The discriminants are the wire tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AssetKind {
    /// The chain's native currency, attached to the creating call.
    Native = 0,
    /// A fungible token balance, pulled with an allowance.
    Fungible = 1,
    /// A single unique token.
    NonFungible = 2,
    /// A quantity of one id of a multi token.
    SemiFungible = 3,
}

impl AssetKind {
    /// All kinds in tag order.
    pub const ALL: [AssetKind; 4] = [
        AssetKind::Native,
        AssetKind::Fungible,
        AssetKind::NonFungible,
        AssetKind::SemiFungible,
    ];

    /// The numeric tag.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Whether entries of this kind live at an asset contract address.
    pub fn has_contract(self) -> bool {
        self != AssetKind::Native
    }
}

impl TryFrom<u8> for AssetKind {
    type Error = VaultError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        AssetKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == tag)
            .ok_or(VaultError::UnknownAssetKind(tag))
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Native => write!(f, "native"),
            AssetKind::Fungible => write!(f, "fungible"),
            AssetKind::NonFungible => write!(f, "non-fungible"),
            AssetKind::SemiFungible => write!(f, "semi-fungible"),
        }
    }
}

/// An asset kind name that isn't one of the four.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown asset kind '{0}'")]
pub struct ParseAssetKindError(pub String);

/// Accepts the numeric tag, the display name, or the familiar token
/// standard names (`erc20`, `erc721`, `erc1155`).
impl FromStr for AssetKind {
    type Err = ParseAssetKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ParseAssetKindError(s.to_string());
        match s.trim().to_ascii_lowercase().as_str() {
            "native" | "eth" => Ok(AssetKind::Native),
            "fungible" | "erc20" => Ok(AssetKind::Fungible),
            "non-fungible" | "nft" | "erc721" => Ok(AssetKind::NonFungible),
            "semi-fungible" | "multi" | "erc1155" => Ok(AssetKind::SemiFungible),
            other => other
                .parse::<u8>()
                .ok()
                .and_then(|tag| AssetKind::try_from(tag).ok())
                .ok_or_else(unknown),
        }
    }
}

/// Lifecycle of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryState {
    /// Holding the asset.
    Active,
    /// Released. Terminal.
    Withdrawn,
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryState::Active => write!(f, "Active"),
            EntryState::Withdrawn => write!(f, "Withdrawn"),
        }
    }
}

/// One custody record.
///
/// Every field except `withdrawn` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultEntry {
    /// External handle; equal to the entry's position in the registry.
    pub id: EntryId,
    /// What is held.
    pub asset_kind: AssetKind,
    /// Asset contract. Zero for native entries.
    pub asset_address: Address,
    /// Token id for unique and multi tokens; zero otherwise.
    pub token_id: TokenId,
    /// Quantity held. Always 1 for unique tokens.
    pub amount: Amount,
    /// Creator, and the only key that can authorize release.
    pub depositor: Address,
    /// Earliest time a withdrawal is allowed.
    pub unlock_time: Timestamp,
    /// Set once, on successful withdrawal.
    pub withdrawn: bool,
}

impl VaultEntry {
    /// Current lifecycle state.
    pub fn state(&self) -> EntryState {
        if self.withdrawn {
            EntryState::Withdrawn
        } else {
            EntryState::Active
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_roundtrip() {
        for kind in AssetKind::ALL {
            assert_eq!(AssetKind::try_from(kind.tag()).unwrap(), kind);
        }
        assert_eq!(AssetKind::Native.tag(), 0);
        assert_eq!(AssetKind::SemiFungible.tag(), 3);
    }

    #[test]
    fn test_unknown_tag_rejected() {
        assert_eq!(AssetKind::try_from(4), Err(VaultError::UnknownAssetKind(4)));
        assert_eq!(AssetKind::try_from(255), Err(VaultError::UnknownAssetKind(255)));
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("erc20".parse::<AssetKind>().unwrap(), AssetKind::Fungible);
        assert_eq!("ERC721".parse::<AssetKind>().unwrap(), AssetKind::NonFungible);
        assert_eq!("semi-fungible".parse::<AssetKind>().unwrap(), AssetKind::SemiFungible);
        assert_eq!("0".parse::<AssetKind>().unwrap(), AssetKind::Native);
        assert!("7".parse::<AssetKind>().is_err());
        assert!("gold".parse::<AssetKind>().is_err());
    }

    #[test]
    fn test_state_follows_flag() {
        let mut entry = VaultEntry {
            id: 0,
            asset_kind: AssetKind::Native,
            asset_address: Address::ZERO,
            token_id: 0,
            amount: 1,
            depositor: Address::from_bytes([1; 32]),
            unlock_time: 0,
            withdrawn: false,
        };
        assert_eq!(entry.state(), EntryState::Active);
        entry.withdrawn = true;
        assert_eq!(entry.state(), EntryState::Withdrawn);
    }
}
