//! # CLI Interface
//!
//! Command-line structure for `strongbox`, via `clap` derive. The vault
//! commands also read their inputs from the environment (`ASSET_TYPE`,
//! `TOKEN_ID`, `ASSET_AMOUNT`, `UNLOCK_TIME`, `ASSET_ID`,
//! `SIGNATURE_DEADLINE`), with flags taking precedence.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use strongbox_contracts::vault::AssetKind;
use strongbox_protocol::config::DEFAULT_DATA_DIR;

use crate::logging::LogFormat;

/// Strongbox: time-locked, signature-released asset vault.
///
/// Runs against a local state directory holding keys, the vault, the test
/// asset contracts and an address book.
#[derive(Parser, Debug)]
#[command(name = "strongbox", about = "Time-locked, signature-released asset vault", version, propagate_version = true)]
pub struct StrongboxCli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// State directory: keys, database and address book.
    #[arg(long, short = 'd', global = true, env = "STRONGBOX_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Network name: mainnet, testnet or devnet.
    #[arg(long, short = 'n', global = true, env = "STRONGBOX_NETWORK", default_value = "devnet")]
    pub network: String,

    /// Log output format.
    #[arg(long, global = true, env = "STRONGBOX_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the state directory, the deployer key and the vault.
    Init(InitArgs),
    /// Generate a named account key.
    Keygen(KeygenArgs),
    /// Deploy a test asset contract and record it in the address book.
    DeployToken(DeployTokenArgs),
    /// Mint test units of an asset.
    Mint(MintArgs),
    /// Lock an asset in the vault.
    CreateVault(CreateVaultArgs),
    /// Print the digest a depositor signs to authorize a withdrawal.
    MessageHash(MessageHashArgs),
    /// Sign a message hash with a named key.
    Sign(SignArgs),
    /// Withdraw an entry with the depositor's signed authorization.
    Withdraw(WithdrawArgs),
    /// List vault entries.
    Entries(EntriesArgs),
    /// Show an account's balance of an asset.
    Balance(BalanceArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing state directory's vault.
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Account name, used as the key file name and address book entry.
    #[arg(long)]
    pub name: String,
}

#[derive(Args, Debug)]
pub struct DeployTokenArgs {
    /// Asset kind: fungible (erc20), non-fungible (erc721) or semi-fungible (erc1155).
    #[arg(long)]
    pub kind: AssetKind,

    /// Contract name; also its address book entry.
    #[arg(long)]
    pub name: String,

    /// Ticker. Defaults to the upper-cased name.
    #[arg(long)]
    pub symbol: Option<String>,

    /// Initial supply minted to the deployer (fungible in display units,
    /// semi-fungible as a whole count of `--token-id`).
    #[arg(long)]
    pub supply: Option<String>,

    /// Token id for the initial semi-fungible supply.
    #[arg(long, default_value_t = 0)]
    pub token_id: u64,
}

#[derive(Args, Debug)]
pub struct MintArgs {
    /// Asset name from the address book, or `native`.
    #[arg(long)]
    pub asset: String,

    /// Amount (display units for native and fungible, whole count for
    /// semi-fungible; ignored for unique tokens).
    #[arg(long, default_value = "1")]
    pub amount: String,

    /// Token id for unique and multi tokens.
    #[arg(long, default_value_t = 0)]
    pub token_id: u64,

    /// Recipient name or address. Defaults to the deployer.
    #[arg(long)]
    pub to: Option<String>,
}

#[derive(Args, Debug)]
pub struct CreateVaultArgs {
    /// Asset kind: native, fungible, non-fungible, semi-fungible, or the tag 0-3.
    #[arg(long, env = "ASSET_TYPE")]
    pub asset_type: String,

    /// Asset contract name or address. Not needed for native.
    #[arg(long, env = "ASSET_NAME")]
    pub asset: Option<String>,

    /// Token id for unique and multi tokens.
    #[arg(long, env = "TOKEN_ID", default_value_t = 0)]
    pub token_id: u64,

    /// Amount to lock (display units for native and fungible, whole count
    /// for semi-fungible).
    #[arg(long, env = "ASSET_AMOUNT", default_value = "0")]
    pub amount: String,

    /// Unix time (seconds) before which withdrawal is refused.
    #[arg(long, env = "UNLOCK_TIME")]
    pub unlock_time: u64,

    /// Native value attached to the call, in display units. Defaults to the
    /// amount for native deposits and zero otherwise.
    #[arg(long)]
    pub value: Option<String>,

    /// Depositing account.
    #[arg(long, default_value = "deployer")]
    pub from: String,
}

#[derive(Args, Debug)]
pub struct MessageHashArgs {
    /// Vault entry id.
    #[arg(long, env = "ASSET_ID")]
    pub asset_id: u64,

    /// Recipient name or address.
    #[arg(long)]
    pub to: String,

    /// Unix time (seconds) after which the authorization is void.
    #[arg(long, env = "SIGNATURE_DEADLINE")]
    pub deadline: u64,
}

#[derive(Args, Debug)]
pub struct SignArgs {
    /// Hex digest printed by `message-hash`.
    #[arg(long)]
    pub hash: String,

    /// Signing account.
    #[arg(long, default_value = "deployer")]
    pub from: String,
}

#[derive(Args, Debug)]
pub struct WithdrawArgs {
    /// Vault entry id.
    #[arg(long, env = "ASSET_ID")]
    pub asset_id: u64,

    /// Recipient name or address.
    #[arg(long)]
    pub to: String,

    /// Unix time (seconds) after which the authorization is void.
    #[arg(long, env = "SIGNATURE_DEADLINE")]
    pub deadline: u64,

    /// Hex signature. When omitted, `--signer` signs on the spot.
    #[arg(long)]
    pub signature: Option<String>,

    /// Account that signs when no `--signature` is given.
    #[arg(long, default_value = "deployer")]
    pub signer: String,

    /// Account submitting the withdrawal.
    #[arg(long, default_value = "deployer")]
    pub relayer: String,
}

#[derive(Args, Debug)]
pub struct EntriesArgs {
    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,

    /// Also print the event log.
    #[arg(long)]
    pub events: bool,
}

#[derive(Args, Debug)]
pub struct BalanceArgs {
    /// Account name or address.
    #[arg(long, default_value = "deployer")]
    pub account: String,

    /// Asset name from the address book, or `native`.
    #[arg(long, default_value = "native")]
    pub asset: String,

    /// Token id for unique and multi tokens.
    #[arg(long, default_value_t = 0)]
    pub token_id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        StrongboxCli::command().debug_assert();
    }

    #[test]
    fn parses_withdraw_flags() {
        let cli = StrongboxCli::try_parse_from([
            "strongbox",
            "withdraw",
            "--asset-id",
            "3",
            "--to",
            "alice",
            "--deadline",
            "1700007200",
            "--relayer",
            "bob",
        ])
        .unwrap();
        match cli.command {
            Commands::Withdraw(args) => {
                assert_eq!(args.asset_id, 3);
                assert_eq!(args.to, "alice");
                assert_eq!(args.deadline, 1_700_007_200);
                assert_eq!(args.signer, "deployer");
                assert_eq!(args.relayer, "bob");
                assert!(args.signature.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_deploy_kind() {
        let cli = StrongboxCli::try_parse_from([
            "strongbox",
            "--network",
            "devnet",
            "deploy-token",
            "--kind",
            "erc721",
            "--name",
            "ERC721_Token",
        ])
        .unwrap();
        match cli.command {
            Commands::DeployToken(args) => assert_eq!(args.kind, AssetKind::NonFungible),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
