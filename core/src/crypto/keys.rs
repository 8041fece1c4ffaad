//! # Key Management
//!
//! Ed25519 keypair generation and serialization for Covault identities.
//!
//! Three kinds of identity touch a vault: the admin who closes rounds, the
//! designated signer who authorizes relayer-submitted deposits, and node
//! operators. All of them are Ed25519 keypairs; investors are addressed by
//! hex-encoded public keys and never need to sign anything inside the core.
//!
//! ## Why Ed25519?
//!
//! - Deterministic signatures (no k-value footguns like ECDSA).
//! - 128-bit security level in 32+32 bytes. Compact and sufficient.
//! - Fast verification — the authorizer checks a signature on every
//!   relayer deposit, so this is a hot path.
//!
//! ## Security considerations
//!
//! - Private keys are zeroized on drop (thanks, ed25519-dalek).
//! - Key generation uses the OS RNG. If your OS RNG is broken, you have
//!   bigger problems than a crowdfunding vault.
//! - Key bytes are never logged. If you add logging to this module,
//!   you will be asked to leave.

use ed25519_dalek::{
    Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Errors that can occur during key operations.
///
/// Intentionally vague about *why* something failed — leaking details
/// about key material through error messages is a classic footgun.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or not a valid scalar")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,
}

/// A Covault identity keypair wrapping an Ed25519 signing key.
///
/// The signing key is the crown jewel. For a vault's designated signer it
/// is literally the key to the fiat rail — anyone holding it can mint
/// valid deposit authorizations.
///
/// ## Serialization
///
/// `CovaultKeypair` intentionally does NOT implement `Serialize` /
/// `Deserialize`. Serializing private keys should be a deliberate,
/// conscious act, not something that happens because someone shoved a
/// keypair into a JSON response. Use `secret_key_bytes()` /
/// `from_bytes()` explicitly.
///
/// # Examples
///
/// ```
/// use covault_core::crypto::keys::CovaultKeypair;
///
/// let signer = CovaultKeypair::generate();
/// let sig = signer.sign(b"authorize deposit #42");
/// assert!(signer.verify(b"authorize deposit #42", &sig));
/// ```
pub struct CovaultKeypair {
    signing_key: SigningKey,
}

/// The public half of a Covault identity, safe to share with the world.
///
/// A vault stores its designated signer as one of these; investors appear
/// in ledgers as the hex encoding of theirs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CovaultPublicKey {
    bytes: [u8; 32],
}

/// An Ed25519 signature over a message. 64 bytes, deterministic for a
/// given (key, message) pair.
///
/// Stored as `Vec<u8>` for serde compatibility, but always exactly 64
/// bytes. If someone hands you a signature that isn't, verification will
/// simply fail — no panics, no undefined behavior, just `false`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CovaultSignature {
    bytes: Vec<u8>,
}

impl CovaultKeypair {
    /// Generate a fresh keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Constructs a keypair deterministically from a 32-byte seed.
    ///
    /// In Ed25519 the 32-byte secret key *is* the seed. Useful for test
    /// fixtures and for deriving keys from a KDF.
    ///
    /// **Warning**: a weak seed makes a weak key. Use a proper CSPRNG or
    /// KDF to produce the seed bytes.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Reconstruct a keypair from raw 32-byte secret key material.
    pub fn from_bytes(secret_key_bytes: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self::from_seed(secret_key_bytes)
    }

    /// Reconstruct a keypair from a hex-encoded secret key.
    ///
    /// Convenience for loading signer keys from key files. Please don't
    /// put raw hex keys in config files in production. But for devnet,
    /// we're not going to pretend you won't do it anyway.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidSecretKey)?;
        if bytes.len() != SECRET_KEY_LENGTH {
            return Err(KeyError::InvalidSecretKey);
        }
        let mut arr = [0u8; SECRET_KEY_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(Self::from_bytes(&arr))
    }

    /// Returns the public key associated with this keypair.
    pub fn public_key(&self) -> CovaultPublicKey {
        CovaultPublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Get the raw public key bytes (32 bytes). Safe to share, log,
    /// tattoo on your arm, etc.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Get the public key as a hex string — the canonical address form
    /// used throughout the contract layer.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key_bytes())
    }

    /// Get the public key as a base58 string. More compact than hex; what
    /// users see when a key is displayed rather than stored.
    pub fn public_key_base58(&self) -> String {
        bs58::encode(self.public_key_bytes()).into_string()
    }

    /// Sign a message.
    ///
    /// Ed25519 signatures are deterministic — the same (key, message)
    /// pair always produces the same signature. No nonce management, no
    /// RNG needed at signing time, no PlayStation-3-style key leaks.
    pub fn sign(&self, message: &[u8]) -> CovaultSignature {
        let sig = self.signing_key.sign(message);
        CovaultSignature {
            bytes: sig.to_bytes().to_vec(),
        }
    }

    /// Verify a signature against this keypair's public key.
    pub fn verify(&self, message: &[u8], signature: &CovaultSignature) -> bool {
        self.public_key().verify(message, signature)
    }

    /// Exports the raw 32-byte secret key material.
    ///
    /// **Handle with extreme care.** For a designated signer this is the
    /// only secret standing between an attacker and unlimited deposit
    /// authorizations. Don't log it. Don't send it over the network in
    /// plaintext.
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl Clone for CovaultKeypair {
    /// Cloning a keypair is allowed but should make you uncomfortable.
    /// Every copy of a private key is another thing to protect.
    fn clone(&self) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()),
        }
    }
}

impl fmt::Debug for CovaultKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret key material in debug output. Not even
        // "partially" — a partial leak is still a leak.
        write!(f, "CovaultKeypair(pub={})", self.public_key().to_hex())
    }
}

impl PartialEq for CovaultKeypair {
    /// Two keypairs are equal if their public keys match. Comparing
    /// secret material in a non-constant-time way is a bad habit, and
    /// for identity purposes the public key is what matters.
    fn eq(&self, other: &Self) -> bool {
        self.public_key_bytes() == other.public_key_bytes()
    }
}

impl Eq for CovaultKeypair {}

// ---------------------------------------------------------------------------
// CovaultPublicKey
// ---------------------------------------------------------------------------

impl CovaultPublicKey {
    /// Create a public key from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Try to create a public key from a byte slice.
    ///
    /// Validates the length and that the bytes represent a valid Ed25519
    /// point. We don't just accept any 32 bytes — low-order points and
    /// other degenerate cases are rejected here.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        if slice.len() != 32 {
            return Err(KeyError::InvalidPublicKey);
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(slice);

        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;

        Ok(Self { bytes })
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Verify a signature against this public key.
    ///
    /// Returns a boolean rather than a `Result` because the vast majority
    /// of callers just want a yes/no answer and don't care about the
    /// specific failure mode. Giving attackers a detailed error oracle is
    /// a bad idea anyway.
    pub fn verify(&self, message: &[u8], signature: &CovaultSignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let sig_bytes: [u8; 64] = match signature.bytes.as_slice().try_into() {
            Ok(b) => b,
            Err(_) => return false,
        };
        let dalek_sig = DalekSignature::from_bytes(&sig_bytes);
        verifying_key.verify(message, &dalek_sig).is_ok()
    }

    /// Hex-encoded representation. 64 characters for 32 bytes. This is
    /// the address format the contract layer keys its ledgers by.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse a hex-encoded public key string.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidPublicKey)?;
        if bytes.len() != 32 {
            return Err(KeyError::InvalidPublicKey);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self { bytes: arr })
    }

    /// Base58-encoded representation, for display.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.bytes).into_string()
    }
}

impl Hash for CovaultPublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl fmt::Display for CovaultPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for CovaultPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CovaultPublicKey({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// CovaultSignature
// ---------------------------------------------------------------------------

impl CovaultSignature {
    /// Create a signature from its raw 64-byte representation.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Returns the raw signature bytes (always 64 for valid signatures).
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hex-encoded signature string. 128 characters for a valid sig —
    /// this is the form carried in deposit-authorization payloads.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Parse a hex-encoded signature.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 64 {
            return Err(hex::FromHexError::OddLength);
        }
        Ok(Self { bytes })
    }
}

impl fmt::Display for CovaultSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for CovaultSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        if hex_str.len() >= 128 {
            write!(f, "CovaultSignature({}...{})", &hex_str[..8], &hex_str[120..])
        } else {
            write!(f, "CovaultSignature({})", hex_str)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_valid_keypair() {
        let kp = CovaultKeypair::generate();
        assert_eq!(kp.public_key_bytes().len(), 32);
        assert_eq!(kp.secret_key_bytes().len(), 32);
    }

    #[test]
    fn sign_verify_roundtrip() {
        let kp = CovaultKeypair::generate();
        let msg = b"deposit 100 units for beneficiary";
        let sig = kp.sign(msg);
        assert!(kp.verify(msg, &sig));
    }

    #[test]
    fn wrong_message_fails_verification() {
        let kp = CovaultKeypair::generate();
        let sig = kp.sign(b"correct message");
        assert!(!kp.verify(b"wrong message", &sig));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let kp1 = CovaultKeypair::generate();
        let kp2 = CovaultKeypair::generate();
        let sig = kp1.sign(b"message");
        assert!(!kp2.verify(b"message", &sig));
    }

    #[test]
    fn secret_key_roundtrip() {
        let kp = CovaultKeypair::generate();
        let restored = CovaultKeypair::from_bytes(&kp.secret_key_bytes());
        assert_eq!(kp.public_key_bytes(), restored.public_key_bytes());
    }

    #[test]
    fn hex_roundtrip() {
        let kp = CovaultKeypair::generate();
        let hex_str = hex::encode(kp.secret_key_bytes());
        let restored = CovaultKeypair::from_hex(&hex_str).unwrap();
        assert_eq!(kp.public_key_bytes(), restored.public_key_bytes());
    }

    #[test]
    fn invalid_hex_rejected() {
        // Too short
        assert!(CovaultKeypair::from_hex("deadbeef").is_err());
        // Not hex at all
        assert!(CovaultKeypair::from_hex("not-hex-at-all").is_err());
    }

    #[test]
    fn deterministic_from_seed() {
        let seed = [42u8; 32];
        let kp1 = CovaultKeypair::from_seed(&seed);
        let kp2 = CovaultKeypair::from_seed(&seed);
        assert_eq!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn deterministic_signatures() {
        // Ed25519 is deterministic — same key + same message = same
        // signature. This is a feature, not a bug.
        let kp = CovaultKeypair::generate();
        let sig1 = kp.sign(b"determinism is underrated");
        let sig2 = kp.sign(b"determinism is underrated");
        assert_eq!(sig1.as_bytes(), sig2.as_bytes());
    }

    #[test]
    fn two_generated_keypairs_are_different() {
        // If this fails, your RNG is broken and you should panic (the
        // emotion, not the macro). Well, actually, both.
        let kp1 = CovaultKeypair::generate();
        let kp2 = CovaultKeypair::generate();
        assert_ne!(kp1.public_key_bytes(), kp2.public_key_bytes());
    }

    #[test]
    fn public_key_hex_roundtrip() {
        let kp = CovaultKeypair::generate();
        let pk = kp.public_key();
        let recovered = CovaultPublicKey::from_hex(&pk.to_hex()).unwrap();
        assert_eq!(pk, recovered);
    }

    #[test]
    fn public_key_rejects_wrong_length() {
        assert!(CovaultPublicKey::try_from_slice(&[0u8; 16]).is_err());
        assert!(CovaultPublicKey::from_hex("abcd").is_err());
    }

    #[test]
    fn public_key_encoding_formats() {
        let kp = CovaultKeypair::generate();
        // Hex is 64 characters (32 bytes * 2); base58 lands around 43-44.
        assert_eq!(kp.public_key_hex().len(), 64);
        let b58 = kp.public_key_base58();
        assert!(b58.len() >= 42 && b58.len() <= 46);
    }

    #[test]
    fn signature_hex_roundtrip() {
        let kp = CovaultKeypair::generate();
        let sig = kp.sign(b"test");
        let recovered = CovaultSignature::from_hex(&sig.to_hex()).unwrap();
        assert_eq!(sig, recovered);
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = CovaultKeypair::generate();
        let debug_str = format!("{:?}", kp);
        assert!(debug_str.starts_with("CovaultKeypair(pub="));
        assert!(!debug_str.contains("signing_key"));
    }

    #[test]
    fn empty_message_signing() {
        // Valid in Ed25519; the signature is still deterministic.
        let kp = CovaultKeypair::generate();
        let sig = kp.sign(b"");
        assert!(kp.verify(b"", &sig));
    }
}
