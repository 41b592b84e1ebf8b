// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Strongbox CLI
//!
//! Entry point for the `strongbox` binary. Parses CLI arguments, initializes
//! logging, opens the local state directory and runs one vault operation.
//!
//! A typical session:
//!
//! - `init`          create the deployer key and the vault
//! - `deploy-token`  deploy a test asset contract
//! - `create-vault`  approve and lock an asset
//! - `message-hash`  print the digest the depositor signs
//! - `sign`          sign it with a named key
//! - `withdraw`      release the asset with the signature
//!
//! Command output goes to stdout; logs go to stderr.

mod address_book;
mod cli;
mod devnet;
mod keystore;
mod logging;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use strongbox_contracts::vault::{timelock, AssetKind, EntryState};
use strongbox_protocol::clock::{format_timestamp, Clock, SystemClock};
use strongbox_protocol::config::{self, DISPLAY_DECIMALS};
use strongbox_protocol::crypto::{sign_digest, Digest, Keypair, Signature};
use strongbox_protocol::ledger::{AssetServices, FungibleToken, NativeCurrency, NonFungibleToken, SemiFungibleToken};
use strongbox_protocol::types::format_units;

use cli::{Commands, GlobalArgs, StrongboxCli};
use devnet::{Devnet, DEPLOYER};
use keystore::Keystore;

fn main() -> Result<()> {
    let cli = StrongboxCli::parse();
    logging::init_logging(logging::DEFAULT_FILTER, cli.global.log_format);

    let global = cli.global;
    match cli.command {
        Commands::Init(args) => init(&global, args),
        Commands::Keygen(args) => keygen(&global, args),
        Commands::DeployToken(args) => deploy_token(&global, args),
        Commands::Mint(args) => mint(&global, args),
        Commands::CreateVault(args) => create_vault(&global, args),
        Commands::MessageHash(args) => message_hash(&global, args),
        Commands::Sign(args) => sign(&global, args),
        Commands::Withdraw(args) => withdraw(&global, args),
        Commands::Entries(args) => entries(&global, args),
        Commands::Balance(args) => balance(&global, args),
    }
}

fn open(global: &GlobalArgs) -> Result<Devnet> {
    Devnet::open_system(&global.data_dir, &global.network)
}

/// Creates the state directory, the deployer key and a fresh vault.
fn init(global: &GlobalArgs, args: cli::InitArgs) -> Result<()> {
    let devnet = Devnet::init(&global.data_dir, &global.network, args.force, Arc::new(SystemClock))?;
    let deployer = devnet.account(DEPLOYER)?.address();

    println!("network:  {} ({})", devnet.network(), config::network_name(devnet.vault().network_id()));
    println!("vault:    {}", devnet.vault().address());
    println!("deployer: {deployer}");
    Ok(())
}

/// Generates a named key and records its address for every network it is
/// used on.
fn keygen(global: &GlobalArgs, args: cli::KeygenArgs) -> Result<()> {
    let keys = Keystore::new(&global.data_dir);
    let keypair = Keypair::generate();
    let path = keys.save(&args.name, &keypair)?;

    let mut book = address_book::AddressBook::load(global.data_dir.join(config::ADDRESS_BOOK_FILE))?;
    book.set(&global.network, &args.name, keypair.address());
    book.save()?;

    tracing::info!(name = %args.name, path = %path.display(), "key generated");
    println!("{}", keypair.address());
    Ok(())
}

fn deploy_token(global: &GlobalArgs, args: cli::DeployTokenArgs) -> Result<()> {
    let mut devnet = open(global)?;
    let address = devnet.deploy_token(
        args.kind,
        &args.name,
        args.symbol.as_deref(),
        args.supply.as_deref(),
        args.token_id,
    )?;
    println!("{}: {address}", args.name);
    Ok(())
}

fn mint(global: &GlobalArgs, args: cli::MintArgs) -> Result<()> {
    let mut devnet = open(global)?;
    let to = devnet.resolve(args.to.as_deref().unwrap_or(DEPLOYER))?;
    devnet.mint(&args.asset, &to, &args.amount, args.token_id)?;
    tracing::info!(asset = %args.asset, to = %to.short(), amount = %args.amount, token_id = args.token_id, "minted");
    Ok(())
}

/// Approves the vault and locks the asset. Prints the new entry id.
fn create_vault(global: &GlobalArgs, args: cli::CreateVaultArgs) -> Result<()> {
    let kind: AssetKind = args
        .asset_type
        .parse()
        .with_context(|| format!("bad ASSET_TYPE '{}'", args.asset_type))?;
    let mut devnet = open(global)?;
    let entry_id = devnet.create_vault(
        &args.from,
        kind,
        args.asset.as_deref(),
        args.token_id,
        &args.amount,
        args.unlock_time,
        args.value.as_deref(),
    )?;

    let now = SystemClock.now();
    if !timelock::is_unlocked(args.unlock_time, now) {
        tracing::info!(
            entry_id,
            unlocks_in_secs = timelock::remaining(args.unlock_time, now),
            "asset locked"
        );
    }
    println!("{entry_id}");
    Ok(())
}

fn message_hash(global: &GlobalArgs, args: cli::MessageHashArgs) -> Result<()> {
    let devnet = open(global)?;
    let to = devnet.resolve(&args.to)?;
    println!("{}", devnet.vault().get_message_hash(args.asset_id, &to, args.deadline));
    Ok(())
}

/// Signs a digest printed by `message-hash`. Needs no vault state.
fn sign(global: &GlobalArgs, args: cli::SignArgs) -> Result<()> {
    let digest = Digest::from_hex(&args.hash).ok_or_else(|| anyhow!("hash must be 32 hex-encoded bytes"))?;
    let keypair = Keystore::new(&global.data_dir).load(&args.from)?;
    println!("0x{}", sign_digest(&keypair, &digest).to_hex());
    Ok(())
}

fn withdraw(global: &GlobalArgs, args: cli::WithdrawArgs) -> Result<()> {
    let mut devnet = open(global)?;
    let to = devnet.resolve(&args.to)?;
    let relayer = devnet.resolve(&args.relayer)?;
    let signature = match args.signature.as_deref() {
        Some(hex) => Signature::from_hex(hex).context("signature is not valid hex")?,
        None => devnet.authorize(&args.signer, args.asset_id, &to, args.deadline)?,
    };
    devnet.withdraw(&relayer, args.asset_id, &to, args.deadline, &signature)?;
    println!("entry {} released to {to}", args.asset_id);
    Ok(())
}

/// Lists entries as a table or JSON, optionally followed by the event log.
fn entries(global: &GlobalArgs, args: cli::EntriesArgs) -> Result<()> {
    let devnet = open(global)?;
    let entries = devnet.vault().entries();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        if args.events {
            println!("{}", serde_json::to_string_pretty(&devnet.vault().events())?);
        }
        return Ok(());
    }

    let now = SystemClock.now();
    println!(
        "{:>4}  {:<13}  {:<16}  {:>8}  {:>24}  {:<16}  {:<20}  STATE",
        "ID", "KIND", "ASSET", "TOKEN", "AMOUNT", "DEPOSITOR", "UNLOCK"
    );
    for entry in &entries {
        let asset = match entry.asset_kind {
            AssetKind::Native => "native".to_string(),
            _ => devnet
                .book()
                .name_of(devnet.network(), &entry.asset_address)
                .map(str::to_string)
                .unwrap_or_else(|| entry.asset_address.short()),
        };
        let amount = match entry.asset_kind {
            AssetKind::Native | AssetKind::Fungible => format_units(entry.amount, DISPLAY_DECIMALS),
            _ => entry.amount.to_string(),
        };
        let state = match entry.state() {
            EntryState::Withdrawn => "withdrawn".to_string(),
            EntryState::Active if timelock::is_unlocked(entry.unlock_time, now) => "unlocked".to_string(),
            EntryState::Active => format!("locked ({}s)", timelock::remaining(entry.unlock_time, now)),
        };
        println!(
            "{:>4}  {:<13}  {:<16}  {:>8}  {:>24}  {:<16}  {:<20}  {}",
            entry.id,
            entry.asset_kind.to_string(),
            asset,
            entry.token_id,
            amount,
            entry.depositor.short(),
            format_timestamp(entry.unlock_time),
            state
        );
    }

    if args.events {
        println!();
        for event in devnet.vault().events() {
            println!("{event:?}");
        }
    }
    Ok(())
}

/// Prints an account's balance: display units for native and fungible,
/// a count for multi tokens, and owned-token count plus owner of
/// `--token-id` for unique tokens.
fn balance(global: &GlobalArgs, args: cli::BalanceArgs) -> Result<()> {
    let devnet = open(global)?;
    let account = devnet.resolve(&args.account)?;
    let ledgers = devnet.ledgers();

    if args.asset.eq_ignore_ascii_case("native") {
        println!("{}", format_units(ledgers.native().balance_of(&account), DISPLAY_DECIMALS));
        return Ok(());
    }
    let asset = devnet.resolve(&args.asset)?;
    match devnet.kind_at(&asset) {
        Some(AssetKind::Fungible) => {
            let token = ledgers.fungible(&asset).ok_or_else(|| anyhow!("no fungible token at {asset}"))?;
            println!("{}", format_units(token.balance_of(&account), DISPLAY_DECIMALS));
        }
        Some(AssetKind::NonFungible) => {
            let token = ledgers.non_fungible(&asset).ok_or_else(|| anyhow!("no unique token at {asset}"))?;
            let owner = token
                .owner_of(args.token_id)
                .map(|o| o.to_string())
                .unwrap_or_else(|| "unminted".to_string());
            println!("{} owned; token {} owner: {owner}", token.balance_of(&account), args.token_id);
        }
        Some(AssetKind::SemiFungible) => {
            let token = ledgers.semi_fungible(&asset).ok_or_else(|| anyhow!("no multi token at {asset}"))?;
            println!("{}", token.balance_of(&account, args.token_id));
        }
        _ => return Err(anyhow!("no asset contract at {asset}")),
    }
    Ok(())
}
