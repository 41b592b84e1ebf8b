//! # Digest Signatures
//!
//! Signing and verifying 32-byte digests inside the signed-message envelope.
//!
//! Nothing in Strongbox signs a bare digest. The envelope is
//! `SIGNED_MESSAGE_PREFIX || digest`, so a signature produced here can only
//! ever be replayed as a Strongbox digest signature, and a signature a key
//! produced for some other 32-byte payload never verifies here.
//!
//! ## Failure mode
//!
//! [`verify_digest`] returns a plain `bool`. A malformed signature, a key
//! that isn't a curve point and an honest mismatch all come back `false`.
//! There is no error path a caller could mistake for success.

use crate::config::SIGNED_MESSAGE_PREFIX;
use crate::crypto::hash::Digest;
use crate::crypto::keys::{verify_with_address, Keypair, Signature};
use crate::types::Address;

/// Builds the exact bytes a signer signs for `digest`.
pub fn signed_message(digest: &Digest) -> Vec<u8> {
    let mut message = Vec::with_capacity(SIGNED_MESSAGE_PREFIX.len() + digest.as_bytes().len());
    message.extend_from_slice(SIGNED_MESSAGE_PREFIX);
    message.extend_from_slice(digest.as_bytes());
    message
}

/// Sign a digest inside the envelope.
///
/// # Example
///
/// ```
/// use strongbox_protocol::crypto::{blake3_hash, sign_digest, verify_digest, Digest, Keypair};
///
/// let kp = Keypair::generate();
/// let digest = Digest::from_bytes(blake3_hash(b"payload"));
/// let sig = sign_digest(&kp, &digest);
/// assert!(verify_digest(&digest, &sig, &kp.address()));
/// ```
pub fn sign_digest(keypair: &Keypair, digest: &Digest) -> Signature {
    keypair.sign(&signed_message(digest))
}

/// Check that `signature` was produced by `signer` over `digest`.
pub fn verify_digest(digest: &Digest, signature: &Signature, signer: &Address) -> bool {
    verify_with_address(signer, &signed_message(digest), signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::blake3_hash;

    fn digest(data: &[u8]) -> Digest {
        Digest::from_bytes(blake3_hash(data))
    }

    #[test]
    fn test_sign_and_verify_digest() {
        let kp = Keypair::generate();
        let d = digest(b"entry 0");
        let sig = sign_digest(&kp, &d);
        assert!(verify_digest(&d, &sig, &kp.address()));
    }

    #[test]
    fn test_other_signer_rejected() {
        let kp = Keypair::generate();
        let other = Keypair::generate();
        let d = digest(b"entry 0");
        let sig = sign_digest(&other, &d);
        assert!(!verify_digest(&d, &sig, &kp.address()));
    }

    #[test]
    fn test_other_digest_rejected() {
        let kp = Keypair::generate();
        let sig = sign_digest(&kp, &digest(b"entry 0"));
        assert!(!verify_digest(&digest(b"entry 1"), &sig, &kp.address()));
    }

    #[test]
    fn test_bare_digest_signature_rejected() {
        // A key that signed the raw 32 bytes must not pass: the envelope is
        // part of what is signed.
        let kp = Keypair::generate();
        let d = digest(b"entry 0");
        let bare = kp.sign(d.as_bytes());
        assert!(!verify_digest(&d, &bare, &kp.address()));
    }

    #[test]
    fn test_envelope_layout() {
        let d = digest(b"x");
        let msg = signed_message(&d);
        assert!(msg.starts_with(SIGNED_MESSAGE_PREFIX));
        assert_eq!(&msg[SIGNED_MESSAGE_PREFIX.len()..], d.as_bytes());
    }

    #[test]
    fn test_garbage_signature_fails_closed() {
        let kp = Keypair::generate();
        let d = digest(b"entry 0");
        for bytes in [vec![], vec![0u8; 63], vec![0xFFu8; 64], vec![1u8; 200]] {
            assert!(!verify_digest(&d, &Signature::from_bytes(bytes), &kp.address()));
        }
    }
}
