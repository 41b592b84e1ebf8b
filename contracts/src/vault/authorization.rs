//! # Withdrawal Authorization
//!
//! A withdrawal is authorized by the depositor signing a digest of
//! `(entry_id, recipient, deadline)`. The digest is bound to one vault on
//! one network:
//!
//! ```text
//! digest = BLAKE3-derive-key(AUTHORIZATION_CONTEXT,
//!            network_id   u32 BE
//!         || vault        32 bytes
//!         || entry_id     u64 BE
//!         || recipient    32 bytes
//!         || deadline     u64 BE)
//! ```
//!
//! Every field is fixed width, so the concatenation is canonical. The signer
//! signs `SIGNED_MESSAGE_PREFIX || digest`, never the bare digest.
//!
//! Verification fails closed. Bad lengths, keys off the curve and honest
//! mismatches are all just `false`.

use serde::{Deserialize, Serialize};
use strongbox_protocol::config::AUTHORIZATION_CONTEXT;
use strongbox_protocol::crypto::{domain_separated_hash_multi, sign_digest, verify_digest, Digest, Keypair, Signature};
use strongbox_protocol::types::{Address, Timestamp};

use super::entry::EntryId;

/// The implicit domain every digest of one vault is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationDomain {
    /// Network the vault is deployed on.
    pub network_id: u32,
    /// The vault's own address.
    pub vault: Address,
}

impl AuthorizationDomain {
    pub fn new(network_id: u32, vault: Address) -> Self {
        Self { network_id, vault }
    }

    /// The canonical digest for releasing `entry_id` to `recipient` until `deadline`.
    ///
    /// Pure. Does not care whether the entry exists.
    pub fn compute_digest(&self, entry_id: EntryId, recipient: &Address, deadline: Timestamp) -> Digest {
        domain_separated_hash_multi(
            AUTHORIZATION_CONTEXT,
            &[
                &self.network_id.to_be_bytes(),
                self.vault.as_bytes(),
                &entry_id.to_be_bytes(),
                recipient.as_bytes(),
                &deadline.to_be_bytes(),
            ],
        )
    }

    /// Whether `signature` is `claimed_signer`'s over `digest`.
    pub fn verify(&self, digest: &Digest, signature: &Signature, claimed_signer: &Address) -> bool {
        verify_digest(digest, signature, claimed_signer)
    }

    /// Produces the depositor's authorization. What a wallet does off-line.
    pub fn sign(
        &self,
        depositor: &Keypair,
        entry_id: EntryId,
        recipient: &Address,
        deadline: Timestamp,
    ) -> Signature {
        sign_digest(depositor, &self.compute_digest(entry_id, recipient, deadline))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strongbox_protocol::config::{NETWORK_ID_DEVNET, NETWORK_ID_TESTNET};

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 32])
    }

    fn domain() -> AuthorizationDomain {
        AuthorizationDomain::new(NETWORK_ID_DEVNET, addr(0xAA))
    }

    #[test]
    fn test_digest_is_deterministic() {
        let d = domain();
        assert_eq!(d.compute_digest(1, &addr(2), 3), d.compute_digest(1, &addr(2), 3));
    }

    #[test]
    fn test_digest_sensitive_to_every_input() {
        let d = domain();
        let base = d.compute_digest(1, &addr(2), 3);
        assert_ne!(base, d.compute_digest(2, &addr(2), 3));
        assert_ne!(base, d.compute_digest(1, &addr(3), 3));
        assert_ne!(base, d.compute_digest(1, &addr(2), 4));

        let other_vault = AuthorizationDomain::new(NETWORK_ID_DEVNET, addr(0xAB));
        assert_ne!(base, other_vault.compute_digest(1, &addr(2), 3));
        let other_network = AuthorizationDomain::new(NETWORK_ID_TESTNET, addr(0xAA));
        assert_ne!(base, other_network.compute_digest(1, &addr(2), 3));
    }

    #[test]
    fn test_sign_and_verify() {
        let d = domain();
        let depositor = Keypair::generate();
        let sig = d.sign(&depositor, 0, &addr(2), 100);
        let digest = d.compute_digest(0, &addr(2), 100);
        assert!(d.verify(&digest, &sig, &depositor.address()));
    }

    #[test]
    fn test_verify_fails_closed() {
        let d = domain();
        let depositor = Keypair::generate();
        let stranger = Keypair::generate();
        let digest = d.compute_digest(0, &addr(2), 100);
        let sig = d.sign(&depositor, 0, &addr(2), 100);

        assert!(!d.verify(&digest, &sig, &stranger.address()));
        assert!(!d.verify(&d.compute_digest(0, &addr(3), 100), &sig, &depositor.address()));
        assert!(!d.verify(&digest, &Signature::from_bytes(vec![0u8; 10]), &depositor.address()));
        assert!(!d.verify(&digest, &sig, &Address::ZERO));
    }

    #[test]
    fn test_bare_digest_signature_rejected() {
        let d = domain();
        let depositor = Keypair::generate();
        let digest = d.compute_digest(0, &addr(2), 100);
        let bare = depositor.sign(digest.as_bytes());
        assert!(!d.verify(&digest, &bare, &depositor.address()));
    }
}
