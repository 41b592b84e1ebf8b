//! # Address Book
//!
//! Human-readable names for addresses, per network, in one JSON file:
//!
//! ```json
//! { "devnet": { "Vault": "9f2c…", "ERC20_Token": "41aa…", "deployer": "07be…" } }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use strongbox_protocol::types::Address;

/// Name → address, per network.
#[derive(Debug, Default)]
pub struct AddressBook {
    path: PathBuf,
    networks: BTreeMap<String, BTreeMap<String, Address>>,
}

impl AddressBook {
    /// Reads the book at `path`; a missing file is an empty book.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let networks = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read address book {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("malformed address book {}", path.display()))?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, networks })
    }

    /// Writes the book back as pretty JSON.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.networks)?;
        fs::write(&self.path, json + "\n")
            .with_context(|| format!("failed to write address book {}", self.path.display()))
    }

    /// Where the book lives.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Looks up `name` on `network`.
    pub fn get(&self, network: &str, name: &str) -> Option<Address> {
        self.networks.get(network)?.get(name).copied()
    }

    /// Records `name` on `network`, replacing any previous address.
    pub fn set(&mut self, network: &str, name: &str, address: Address) {
        self.networks
            .entry(network.to_string())
            .or_default()
            .insert(name.to_string(), address);
    }

    /// Every name on `network`.
    pub fn names(&self, network: &str) -> Vec<(String, Address)> {
        self.networks
            .get(network)
            .map(|names| names.iter().map(|(n, a)| (n.clone(), *a)).collect())
            .unwrap_or_default()
    }

    /// A name from the book, or a literal hex address.
    pub fn resolve(&self, network: &str, name_or_address: &str) -> Result<Address> {
        if let Some(address) = self.get(network, name_or_address) {
            return Ok(address);
        }
        Address::from_hex(name_or_address).with_context(|| {
            format!("'{name_or_address}' is neither a name in the {network} address book nor an address")
        })
    }

    /// The name recorded for `address` on `network`, if any.
    pub fn name_of(&self, network: &str, address: &Address) -> Option<&str> {
        self.networks
            .get(network)?
            .iter()
            .find(|(_, a)| *a == address)
            .map(|(n, _)| n.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 32])
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let book = AddressBook::load(dir.path().join("addresses.json")).unwrap();
        assert!(book.get("devnet", "Vault").is_none());
        assert!(book.names("devnet").is_empty());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("addresses.json");
        let mut book = AddressBook::load(&path).unwrap();
        book.set("devnet", "Vault", addr(1));
        book.set("testnet", "Vault", addr(2));
        book.save().unwrap();

        let book = AddressBook::load(&path).unwrap();
        assert_eq!(book.get("devnet", "Vault"), Some(addr(1)));
        assert_eq!(book.get("testnet", "Vault"), Some(addr(2)));
        assert_eq!(book.name_of("devnet", &addr(1)), Some("Vault"));

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["devnet"]["Vault"], serde_json::Value::String(addr(1).to_hex()));
    }

    #[test]
    fn test_resolve_name_or_hex() {
        let dir = tempfile::tempdir().unwrap();
        let mut book = AddressBook::load(dir.path().join("a.json")).unwrap();
        book.set("devnet", "alice", addr(7));
        assert_eq!(book.resolve("devnet", "alice").unwrap(), addr(7));
        assert_eq!(book.resolve("devnet", &addr(8).to_hex()).unwrap(), addr(8));
        assert!(book.resolve("devnet", "bob").is_err());
        // Names are per network.
        assert!(book.resolve("testnet", "alice").is_err());
    }

    #[test]
    fn test_malformed_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("addresses.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(AddressBook::load(&path).is_err());
    }
}
