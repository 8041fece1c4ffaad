//! # Digital Signatures
//!
//! Ed25519 signing and verification helpers.
//!
//! The only signature that matters to a vault is the designated signer's
//! authorization over a deposit digest, but the same primitives also sign
//! node identity material, so they live here rather than inside the
//! authorizer.
//!
//! ## Why not just use ed25519-dalek directly?
//!
//! We could, and in some internal code we do. But wrapping the operations
//! gives us:
//!
//! 1. A single place to audit all signing operations.
//! 2. Consistent error types across the codebase.
//! 3. Type safety — you can't accidentally pass a hash where a message
//!    goes.

use ed25519_dalek::{Signature as DalekSignature, Verifier, VerifyingKey};
use thiserror::Error;

use super::keys::{CovaultKeypair, CovaultPublicKey, CovaultSignature};

/// Errors during signature operations.
///
/// Intentionally vague — we don't tell attackers why verification failed.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("signature verification failed")]
    VerificationFailed,

    #[error("invalid signature bytes: expected 64 bytes")]
    InvalidSignatureBytes,

    #[error("invalid public key")]
    InvalidPublicKey,
}

/// Sign a message using a Covault keypair.
///
/// Produces a 64-byte Ed25519 signature over the given message bytes.
/// Deterministic per RFC 8032 — no nonce reuse bugs possible.
pub fn sign(keypair: &CovaultKeypair, message: &[u8]) -> CovaultSignature {
    keypair.sign(message)
}

/// Verify an Ed25519 signature against a public key and message.
///
/// Returns `true` if the signature is valid, `false` otherwise. We
/// intentionally don't distinguish between "invalid signature" and
/// "wrong public key" — both are just "nope."
pub fn verify(public_key: &CovaultPublicKey, message: &[u8], signature: &CovaultSignature) -> bool {
    public_key.verify(message, signature)
}

/// Verify a signature using raw byte components.
///
/// This is the "I got these bytes off the wire and need to check them"
/// variant — it parses the public key and signature bytes, then verifies.
/// Used when deserializing authorization payloads where everything
/// arrives as byte slices rather than typed structs.
pub fn verify_raw(
    public_key_bytes: &[u8; 32],
    message: &[u8],
    signature_bytes: &[u8; 64],
) -> Result<(), SignatureError> {
    let verifying_key =
        VerifyingKey::from_bytes(public_key_bytes).map_err(|_| SignatureError::InvalidPublicKey)?;

    let signature = DalekSignature::from_bytes(signature_bytes);

    verifying_key
        .verify(message, &signature)
        .map_err(|_| SignatureError::VerificationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify() {
        let kp = CovaultKeypair::generate();
        let msg = b"hello, vault";
        let sig = sign(&kp, msg);
        assert!(verify(&kp.public_key(), msg, &sig));
    }

    #[test]
    fn tampered_message_fails() {
        let kp = CovaultKeypair::generate();
        let sig = sign(&kp, b"original");
        assert!(!verify(&kp.public_key(), b"tampered", &sig));
    }

    #[test]
    fn verify_raw_roundtrip() {
        let kp = CovaultKeypair::generate();
        let msg = b"raw bytes path";
        let sig = sign(&kp, msg);

        let mut sig_arr = [0u8; 64];
        sig_arr.copy_from_slice(sig.as_bytes());
        assert!(verify_raw(&kp.public_key_bytes(), msg, &sig_arr).is_ok());
    }

    #[test]
    fn verify_raw_rejects_invalid_pubkey() {
        // All zeros is the identity point — a small-order point that
        // strict parsing rejects.
        let bad_pk = [0u8; 32];
        assert!(verify_raw(&bad_pk, b"doesn't matter", &[0u8; 64]).is_err());
    }
}
