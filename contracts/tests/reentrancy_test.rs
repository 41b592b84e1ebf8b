//! Recipient programs that refuse assets or call back into the vault
//! mid-release, and threads racing for the same entry.

use std::sync::{Arc, OnceLock, Weak};
use std::thread;

use parking_lot::Mutex;
use strongbox_contracts::vault::{CreateVault, EntryState, Vault, VaultConfig, VaultError};
use strongbox_protocol::clock::ManualClock;
use strongbox_protocol::config::NETWORK_ID_DEVNET;
use strongbox_protocol::crypto::{sign_digest, Keypair, Signature};
use strongbox_protocol::ledger::{
    AssetServices, LedgerError, Ledgers, NativeCurrency, NonFungibleToken, ReceiveHook, Receipt,
};
use strongbox_protocol::types::{Address, Timestamp};

const T0: Timestamp = 1_700_000_000;
const AMOUNT: u128 = 500;
const COLLECTION: Address = Address::from_bytes([0x20; 32]);
/// A program account that receives the released asset.
const PROGRAM: Address = Address::from_bytes([0xCC; 32]);

struct Setup {
    ledgers: Arc<Ledgers>,
    vault: Arc<Vault>,
    depositor: Keypair,
}

fn setup() -> Setup {
    let ledgers = Arc::new(Ledgers::new());
    let depositor = Keypair::generate();
    let config = VaultConfig::derived(&depositor.address(), NETWORK_ID_DEVNET);
    let vault = Arc::new(Vault::new(config, ledgers.clone(), Arc::new(ManualClock::new(T0))));
    ledgers.native_ledger().mint(&depositor.address(), 10 * AMOUNT).unwrap();
    Setup {
        ledgers,
        vault,
        depositor,
    }
}

fn lock_native(s: &Setup) -> (u64, Signature) {
    let id = s
        .vault
        .create_vault(&s.depositor.address(), CreateVault::native(AMOUNT, T0), AMOUNT)
        .unwrap();
    let sig = sign_digest(&s.depositor, &s.vault.get_message_hash(id, &PROGRAM, T0));
    (id, sig)
}

/// Refuses everything.
struct Refuse;

impl ReceiveHook for Refuse {
    fn on_receive(&self, _receipt: &Receipt) -> Result<(), String> {
        Err("program does not accept deposits".into())
    }
}

/// Tries to withdraw the same entry again from inside the receive hook.
struct Reenter {
    vault: OnceLock<Weak<Vault>>,
    authorization: (u64, Signature),
    refuse_after: bool,
    observed: Mutex<Vec<Result<(), VaultError>>>,
}

impl ReceiveHook for Reenter {
    fn on_receive(&self, receipt: &Receipt) -> Result<(), String> {
        if let Some(vault) = self.vault.get().and_then(Weak::upgrade) {
            let (id, sig) = &self.authorization;
            let result = vault.withdraw_asset(&receipt.to, *id, &PROGRAM, T0, sig);
            self.observed.lock().push(result);
        }
        if self.refuse_after {
            Err("changed my mind".into())
        } else {
            Ok(())
        }
    }
}

fn install_reentrant(s: &Setup, authorization: (u64, Signature), refuse_after: bool) -> Arc<Reenter> {
    let hook = Arc::new(Reenter {
        vault: OnceLock::new(),
        authorization,
        refuse_after,
        observed: Mutex::new(Vec::new()),
    });
    let _ = hook.vault.set(Arc::downgrade(&s.vault));
    s.ledgers.hooks().register(PROGRAM, hook.clone());
    hook
}

#[test]
fn refusing_recipient_rolls_back() {
    let s = setup();
    let (id, sig) = lock_native(&s);
    s.ledgers.hooks().register(PROGRAM, Arc::new(Refuse));

    let err = s
        .vault
        .withdraw_asset(&s.depositor.address(), id, &PROGRAM, T0, &sig)
        .unwrap_err();
    assert!(matches!(
        err,
        VaultError::TransferRejected {
            source: LedgerError::Refused { .. },
            ..
        }
    ));
    assert_eq!(s.vault.entry(id).unwrap().state(), EntryState::Active);
    assert_eq!(s.ledgers.native().balance_of(&s.vault.address()), AMOUNT);
    assert_eq!(s.vault.events().len(), 1);

    // Once the program accepts, the same authorization still works.
    assert!(s.ledgers.hooks().unregister(&PROGRAM));
    s.vault
        .withdraw_asset(&s.depositor.address(), id, &PROGRAM, T0, &sig)
        .unwrap();
    assert_eq!(s.ledgers.native().balance_of(&PROGRAM), AMOUNT);
}

#[test]
fn refusing_nft_recipient_keeps_token_in_vault() {
    let s = setup();
    let nft = s.ledgers.deploy_non_fungible(COLLECTION, "Test NFT", "TNFT").unwrap();
    nft.mint(&s.depositor.address(), 1).unwrap();
    nft.set_approval_for_all(&s.depositor.address(), &s.vault.address(), true);
    let id = s
        .vault
        .create_vault(&s.depositor.address(), CreateVault::non_fungible(COLLECTION, 1, T0), 0)
        .unwrap();
    s.ledgers.hooks().register(PROGRAM, Arc::new(Refuse));

    let sig = sign_digest(&s.depositor, &s.vault.get_message_hash(id, &PROGRAM, T0));
    let err = s.vault.withdraw_asset(&PROGRAM, id, &PROGRAM, T0, &sig).unwrap_err();
    assert_eq!(err.code(), "TransferRejected()");
    assert_eq!(nft.owner_of(1), Some(s.vault.address()));
    assert!(!s.vault.entry(id).unwrap().withdrawn);
}

#[test]
fn reentrant_withdrawal_sees_withdrawn() {
    let s = setup();
    let (id, sig) = lock_native(&s);
    let hook = install_reentrant(&s, (id, sig.clone()), false);

    s.vault
        .withdraw_asset(&s.depositor.address(), id, &PROGRAM, T0, &sig)
        .unwrap();

    assert_eq!(*hook.observed.lock(), vec![Err(VaultError::AlreadyWithdrawn(id))]);
    // Paid exactly once.
    assert_eq!(s.ledgers.native().balance_of(&PROGRAM), AMOUNT);
    assert_eq!(s.ledgers.native().balance_of(&s.vault.address()), 0);
    assert_eq!(s.vault.events().len(), 2);
}

#[test]
fn reentry_then_refusal_restores_entry() {
    let s = setup();
    let (id, sig) = lock_native(&s);
    let hook = install_reentrant(&s, (id, sig.clone()), true);

    let err = s
        .vault
        .withdraw_asset(&s.depositor.address(), id, &PROGRAM, T0, &sig)
        .unwrap_err();
    assert_eq!(err.code(), "TransferRejected()");
    assert_eq!(*hook.observed.lock(), vec![Err(VaultError::AlreadyWithdrawn(id))]);
    assert_eq!(s.vault.entry(id).unwrap().state(), EntryState::Active);
    assert_eq!(s.ledgers.native().balance_of(&s.vault.address()), AMOUNT);
}

#[test]
fn racing_threads_release_once() {
    let s = setup();
    let (id, sig) = lock_native(&s);

    let results: Vec<Result<(), VaultError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| s.vault.withdraw_asset(&PROGRAM, id, &PROGRAM, T0, &sig)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| *e == VaultError::AlreadyWithdrawn(id)));
    assert_eq!(s.ledgers.native().balance_of(&PROGRAM), AMOUNT);
}
