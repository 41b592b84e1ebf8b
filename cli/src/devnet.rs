//! # Local Devnet
//!
//! The state a `strongbox` invocation runs against: named keys, the address
//! book, and one sled database per network holding the vault and the test
//! asset contracts. Each command opens it, does one thing, and saves.
//!
//! ```text
//! <data-dir>/
//!   addresses.json        name → address, per network
//!   keys/<name>.key       hex Ed25519 secret keys
//!   db/<network>/         sled: entries, events, ledgers, metadata
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use strongbox_contracts::vault::{AssetKind, CreateVault, EntryId, Vault, VaultConfig, VaultError, VaultStore};
use strongbox_protocol::clock::{Clock, SystemClock};
use strongbox_protocol::config::{self, ADDRESS_BOOK_FILE, DEVNET_FAUCET_AMOUNT, DISPLAY_DECIMALS, NETWORK_ID_DEVNET, VAULT_CONTRACT_NAME};
use strongbox_protocol::crypto::{sign_digest, Keypair, Signature};
use strongbox_protocol::ledger::{
    FungibleLedger, FungibleToken, Ledgers, NonFungibleLedger, NonFungibleToken, SemiFungibleLedger,
    SemiFungibleToken,
};
use strongbox_protocol::storage::VaultDb;
use strongbox_protocol::types::{parse_units, Address, Amount, Timestamp, TokenId};
use tracing::info;

use crate::address_book::AddressBook;
use crate::keystore::Keystore;

/// Name of the key `init` creates and most commands act as by default.
pub const DEPLOYER: &str = "deployer";

/// Turns a vault error into an anyhow error that leads with its stable code.
pub fn reverted(err: VaultError) -> anyhow::Error {
    let code = err.code();
    anyhow::Error::new(err).context(format!("vault call reverted with {code}"))
}

/// Parses a user-supplied quantity for `kind`: display units for native and
/// fungible, whole counts for multi tokens, always 1 for unique tokens.
pub fn parse_quantity(kind: AssetKind, input: &str) -> Result<Amount> {
    let amount = match kind {
        AssetKind::Native | AssetKind::Fungible => parse_units(input, DISPLAY_DECIMALS)?,
        AssetKind::SemiFungible => parse_units(input, 0)?,
        AssetKind::NonFungible => 1,
    };
    Ok(amount)
}

/// An opened state directory.
pub struct Devnet {
    network: String,
    keys: Keystore,
    book: AddressBook,
    store: VaultStore,
    ledgers: Arc<Ledgers>,
    vault: Vault,
}

impl Devnet {
    fn db_path(data_dir: &Path, network: &str) -> PathBuf {
        data_dir.join("db").join(network)
    }

    fn network_id(network: &str) -> Result<u32> {
        config::network_id(network).ok_or_else(|| anyhow!("unknown network '{network}'"))
    }

    /// Creates the deployer key (if missing) and a fresh vault.
    pub fn init(data_dir: &Path, network: &str, force: bool, clock: Arc<dyn Clock>) -> Result<Self> {
        let network_id = Self::network_id(network)?;
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let keys = Keystore::new(data_dir);
        let deployer = if keys.contains(DEPLOYER) {
            keys.load(DEPLOYER)?
        } else {
            let kp = Keypair::generate();
            let path = keys.save(DEPLOYER, &kp)?;
            info!(address = %kp.address(), path = %path.display(), "deployer key generated");
            kp
        };

        let db_path = Self::db_path(data_dir, network);
        if db_path.exists() {
            if !force {
                bail!(
                    "{network} is already initialized in {} (pass --force to start over)",
                    data_dir.display()
                );
            }
            std::fs::remove_dir_all(&db_path)
                .with_context(|| format!("failed to remove {}", db_path.display()))?;
        }
        let db = VaultDb::open(&db_path)
            .with_context(|| format!("failed to open database at {}", db_path.display()))?;

        let ledgers = Arc::new(Ledgers::new());
        if network_id == NETWORK_ID_DEVNET {
            ledgers
                .native_ledger()
                .mint(&deployer.address(), DEVNET_FAUCET_AMOUNT)?;
        }
        let vault_config = VaultConfig::derived(&deployer.address(), network_id);
        let vault = Vault::new(vault_config, ledgers.clone(), clock);

        let mut book = AddressBook::load(data_dir.join(ADDRESS_BOOK_FILE))?;
        book.set(network, VAULT_CONTRACT_NAME, vault.address());
        book.set(network, DEPLOYER, deployer.address());

        let devnet = Self {
            network: network.to_string(),
            keys,
            book,
            store: VaultStore::new(db),
            ledgers,
            vault,
        };
        devnet.save()?;
        info!(network, vault = %devnet.vault.address(), "vault deployed");
        Ok(devnet)
    }

    /// Opens an initialized state directory.
    pub fn open(data_dir: &Path, network: &str, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::network_id(network)?;
        let db_path = Self::db_path(data_dir, network);
        if !db_path.exists() {
            bail!(
                "{network} is not initialized in {} (run `strongbox init` first)",
                data_dir.display()
            );
        }
        let store = VaultStore::new(
            VaultDb::open(&db_path)
                .with_context(|| format!("failed to open database at {}", db_path.display()))?,
        );
        let ledgers = Arc::new(store.load_ledgers()?);
        let vault = store.load_vault(ledgers.clone(), clock)?;
        Ok(Self {
            network: network.to_string(),
            keys: Keystore::new(data_dir),
            book: AddressBook::load(data_dir.join(ADDRESS_BOOK_FILE))?,
            store,
            ledgers,
            vault,
        })
    }

    /// Opens with the system clock.
    pub fn open_system(data_dir: &Path, network: &str) -> Result<Self> {
        Self::open(data_dir, network, Arc::new(SystemClock))
    }

    /// Persists the vault, the ledgers and the address book.
    pub fn save(&self) -> Result<()> {
        self.store
            .save(&self.vault, &self.ledgers)
            .context("failed to save vault state")?;
        self.book.save()
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    pub fn ledgers(&self) -> &Ledgers {
        &self.ledgers
    }

    pub fn book(&self) -> &AddressBook {
        &self.book
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    /// The key named `name`.
    pub fn account(&self, name: &str) -> Result<Keypair> {
        self.keys.load(name)
    }

    /// A name from the address book or a literal address.
    pub fn resolve(&self, name_or_address: &str) -> Result<Address> {
        self.book.resolve(&self.network, name_or_address)
    }

    // -----------------------------------------------------------------------
    // Test asset contracts
    // -----------------------------------------------------------------------

    /// Deploys a test token owned by the deployer and records it by name.
    pub fn deploy_token(
        &mut self,
        kind: AssetKind,
        name: &str,
        symbol: Option<&str>,
        supply: Option<&str>,
        token_id: TokenId,
    ) -> Result<Address> {
        let deployer = self.account(DEPLOYER)?.address();
        let address = Address::derive(&deployer, name);
        let symbol = symbol.map(str::to_string).unwrap_or_else(|| name.to_uppercase());

        match kind {
            AssetKind::Native => bail!("the native currency is not a deployable contract"),
            AssetKind::Fungible => {
                let token = self.ledgers.deploy_fungible(address, name, &symbol)?;
                if let Some(supply) = supply {
                    token.mint(&deployer, parse_quantity(kind, supply)?)?;
                }
            }
            AssetKind::NonFungible => {
                if supply.is_some() {
                    bail!("unique tokens are minted one id at a time; use `strongbox mint`");
                }
                self.ledgers.deploy_non_fungible(address, name, &symbol)?;
            }
            AssetKind::SemiFungible => {
                let token = self.ledgers.deploy_semi_fungible(address, name)?;
                if let Some(supply) = supply {
                    token.mint(&deployer, token_id, parse_quantity(kind, supply)?)?;
                }
            }
        }
        self.book.set(&self.network, name, address);
        self.save()?;
        Ok(address)
    }

    /// The kind of contract deployed at `address`.
    pub fn kind_at(&self, address: &Address) -> Option<AssetKind> {
        if self.ledgers.fungible_ledger(address).is_some() {
            Some(AssetKind::Fungible)
        } else if self.ledgers.non_fungible_ledger(address).is_some() {
            Some(AssetKind::NonFungible)
        } else if self.ledgers.semi_fungible_ledger(address).is_some() {
            Some(AssetKind::SemiFungible)
        } else {
            None
        }
    }

    /// Mints test units of `asset` (a name, an address, or `native`) to `to`.
    pub fn mint(&mut self, asset: &str, to: &Address, amount: &str, token_id: TokenId) -> Result<()> {
        if asset.eq_ignore_ascii_case("native") {
            let amount = parse_quantity(AssetKind::Native, amount)?;
            self.ledgers.native_ledger().mint(to, amount)?;
        } else {
            let address = self.resolve(asset)?;
            match self.kind_at(&address) {
                Some(AssetKind::Fungible) => {
                    let amount = parse_quantity(AssetKind::Fungible, amount)?;
                    self.fungible(&address)?.mint(to, amount)?;
                }
                Some(AssetKind::NonFungible) => {
                    self.non_fungible(&address)?.mint(to, token_id)?;
                }
                Some(AssetKind::SemiFungible) => {
                    let amount = parse_quantity(AssetKind::SemiFungible, amount)?;
                    self.semi_fungible(&address)?.mint(to, token_id, amount)?;
                }
                _ => bail!("no asset contract at {address}"),
            }
        }
        self.save()
    }

    fn fungible(&self, address: &Address) -> Result<Arc<FungibleLedger>> {
        self.ledgers
            .fungible_ledger(address)
            .ok_or_else(|| anyhow!("no fungible token at {address}"))
    }

    fn non_fungible(&self, address: &Address) -> Result<Arc<NonFungibleLedger>> {
        self.ledgers
            .non_fungible_ledger(address)
            .ok_or_else(|| anyhow!("no unique token at {address}"))
    }

    fn semi_fungible(&self, address: &Address) -> Result<Arc<SemiFungibleLedger>> {
        self.ledgers
            .semi_fungible_ledger(address)
            .ok_or_else(|| anyhow!("no multi token at {address}"))
    }

    // -----------------------------------------------------------------------
    // Vault calls
    // -----------------------------------------------------------------------

    /// Approves the vault for the asset, then locks it.
    ///
    /// `value` defaults to the amount for native deposits and zero otherwise.
    #[allow(clippy::too_many_arguments)]
    pub fn create_vault(
        &mut self,
        from: &str,
        kind: AssetKind,
        asset: Option<&str>,
        token_id: TokenId,
        amount: &str,
        unlock_time: Timestamp,
        value: Option<&str>,
    ) -> Result<EntryId> {
        let depositor = self.account(from)?.address();
        let vault = self.vault.address();
        let amount = parse_quantity(kind, amount)?;

        let asset_address = match (kind, asset) {
            (AssetKind::Native, _) => Address::ZERO,
            (_, Some(name)) => self.resolve(name)?,
            (_, None) => bail!("a {kind} vault needs an asset (ASSET_NAME or --asset)"),
        };
        // A missing contract is left for the vault to reject.
        match kind {
            AssetKind::Native => {}
            AssetKind::Fungible => {
                if let Some(token) = self.ledgers.fungible_ledger(&asset_address) {
                    token.approve(&depositor, &vault, amount)?;
                }
            }
            AssetKind::NonFungible => {
                if let Some(token) = self.ledgers.non_fungible_ledger(&asset_address) {
                    token.approve(&depositor, &vault, token_id)?;
                }
            }
            AssetKind::SemiFungible => {
                if let Some(token) = self.ledgers.semi_fungible_ledger(&asset_address) {
                    token.set_approval_for_all(&depositor, &vault, true);
                }
            }
        }

        let attached = match value {
            Some(v) => parse_quantity(AssetKind::Native, v)?,
            None if kind == AssetKind::Native => amount,
            None => 0,
        };
        let request = CreateVault {
            asset_kind: kind.tag(),
            asset_address,
            token_id,
            amount,
            unlock_time,
        };
        let entry_id = self
            .vault
            .create_vault(&depositor, request, attached)
            .map_err(reverted)?;
        self.save()?;
        Ok(entry_id)
    }

    /// Signs the authorization for `entry_id` with the key named `signer`.
    pub fn authorize(&self, signer: &str, entry_id: EntryId, to: &Address, deadline: Timestamp) -> Result<Signature> {
        let key = self.account(signer)?;
        Ok(sign_digest(&key, &self.vault.get_message_hash(entry_id, to, deadline)))
    }

    /// Submits a withdrawal as `relayer`.
    pub fn withdraw(
        &mut self,
        relayer: &Address,
        entry_id: EntryId,
        to: &Address,
        deadline: Timestamp,
        signature: &Signature,
    ) -> Result<()> {
        self.vault
            .withdraw_asset(relayer, entry_id, to, deadline, signature)
            .map_err(reverted)?;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strongbox_protocol::clock::ManualClock;
    use strongbox_protocol::config::ONE_UNIT;
    use strongbox_protocol::ledger::{AssetServices, NativeCurrency};

    const T0: Timestamp = 1_700_000_000;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(T0))
    }

    fn new_account(dir: &Path, name: &str) -> Address {
        let kp = Keypair::generate();
        Keystore::new(dir).save(name, &kp).unwrap();
        kp.address()
    }

    #[test]
    fn test_init_funds_deployer_and_records_vault() {
        let dir = tempfile::tempdir().unwrap();
        let devnet = Devnet::init(dir.path(), "devnet", false, clock()).unwrap();
        let deployer = devnet.account(DEPLOYER).unwrap().address();

        assert_eq!(devnet.ledgers().native().balance_of(&deployer), DEVNET_FAUCET_AMOUNT);
        assert_eq!(devnet.resolve(VAULT_CONTRACT_NAME).unwrap(), devnet.vault().address());
        assert_eq!(devnet.vault().network_id(), NETWORK_ID_DEVNET);
    }

    #[test]
    fn test_init_twice_needs_force() {
        let dir = tempfile::tempdir().unwrap();
        let first = Devnet::init(dir.path(), "devnet", false, clock()).unwrap();
        let vault = first.vault().address();
        drop(first);

        assert!(Devnet::init(dir.path(), "devnet", false, clock()).is_err());
        let again = Devnet::init(dir.path(), "devnet", true, clock()).unwrap();
        // Same deployer key, so the same vault address.
        assert_eq!(again.vault().address(), vault);
        assert_eq!(again.vault().entry_count(), 0);
    }

    #[test]
    fn test_open_requires_init() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Devnet::open(dir.path(), "devnet", clock()).is_err());
        assert!(Devnet::init(dir.path(), "moonnet", false, clock()).is_err());
    }

    #[test]
    fn test_fungible_vault_across_invocations() {
        let dir = tempfile::tempdir().unwrap();
        let recipient = new_account(dir.path(), "alice");
        {
            let mut devnet = Devnet::init(dir.path(), "devnet", false, clock()).unwrap();
            devnet
                .deploy_token(AssetKind::Fungible, "ERC20_Token", Some("E20"), Some("1000"), 0)
                .unwrap();
            let id = devnet
                .create_vault(DEPLOYER, AssetKind::Fungible, Some("ERC20_Token"), 0, "1.0", T0 + 3_600, None)
                .unwrap();
            assert_eq!(id, 0);
        }

        // Later invocation, still locked.
        let mut devnet = Devnet::open(dir.path(), "devnet", clock()).unwrap();
        let sig = devnet.authorize(DEPLOYER, 0, &recipient, T0 + 7_200).unwrap();
        let deployer = devnet.account(DEPLOYER).unwrap().address();
        let err = devnet.withdraw(&deployer, 0, &recipient, T0 + 7_200, &sig).unwrap_err();
        assert!(format!("{err:#}").contains("AssetLocked()"));
        drop(devnet);

        // After the unlock time.
        let later = Arc::new(ManualClock::new(T0 + 7_200));
        let mut devnet = Devnet::open(dir.path(), "devnet", later).unwrap();
        devnet.withdraw(&deployer, 0, &recipient, T0 + 7_200, &sig).unwrap();
        drop(devnet);

        let devnet = Devnet::open(dir.path(), "devnet", clock()).unwrap();
        let token = devnet.resolve("ERC20_Token").unwrap();
        let balance = devnet.ledgers().fungible(&token).unwrap().balance_of(&recipient);
        assert_eq!(balance, ONE_UNIT);
        assert!(devnet.vault().entry(0).unwrap().withdrawn);
    }

    #[test]
    fn test_native_and_multi_vaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut devnet = Devnet::init(dir.path(), "devnet", false, clock()).unwrap();
        devnet
            .deploy_token(AssetKind::SemiFungible, "ERC1155_Token", None, Some("10"), 0)
            .unwrap();

        let native = devnet
            .create_vault(DEPLOYER, AssetKind::Native, None, 0, "0.5", T0, None)
            .unwrap();
        let multi = devnet
            .create_vault(DEPLOYER, AssetKind::SemiFungible, Some("ERC1155_Token"), 0, "4", T0, None)
            .unwrap();
        assert_eq!((native, multi), (0, 1));
        assert_eq!(
            devnet.ledgers().native().balance_of(&devnet.vault().address()),
            ONE_UNIT / 2
        );

        let mismatch = devnet
            .create_vault(DEPLOYER, AssetKind::Native, None, 0, "1", T0, Some("0.9"))
            .unwrap_err();
        assert!(format!("{mismatch:#}").contains("ValueMismatch()"));
    }

    #[test]
    fn test_nft_deploy_mint_and_lock() {
        let dir = tempfile::tempdir().unwrap();
        let mut devnet = Devnet::init(dir.path(), "devnet", false, clock()).unwrap();
        let deployer = devnet.account(DEPLOYER).unwrap().address();
        let nft = devnet
            .deploy_token(AssetKind::NonFungible, "ERC721_Token", None, None, 0)
            .unwrap();
        assert!(devnet
            .deploy_token(AssetKind::NonFungible, "Other", None, Some("3"), 0)
            .is_err());
        devnet.mint("ERC721_Token", &deployer, "1", 1).unwrap();

        devnet
            .create_vault(DEPLOYER, AssetKind::NonFungible, Some("ERC721_Token"), 1, "0", T0, None)
            .unwrap();
        let owner = devnet.ledgers().non_fungible(&nft).unwrap().owner_of(1);
        assert_eq!(owner, Some(devnet.vault().address()));
    }

    #[test]
    fn test_create_vault_needs_asset_for_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let mut devnet = Devnet::init(dir.path(), "devnet", false, clock()).unwrap();
        assert!(devnet
            .create_vault(DEPLOYER, AssetKind::Fungible, None, 0, "1", T0, None)
            .is_err());
        let err = devnet
            .create_vault(DEPLOYER, AssetKind::Fungible, Some(Address::from_bytes([9; 32]).to_hex().as_str()), 0, "1", T0, None)
            .unwrap_err();
        assert!(format!("{err:#}").contains("TransferRejected()"));
    }
}
