//! # Hashing Utilities
//!
//! Two hash functions, two jobs, and we refuse to support more without a
//! very good reason:
//!
//! - **SHA-256** — authorization digests. A relayer backend (Node, Go,
//!   whatever the fiat partner runs) must be able to reproduce the exact
//!   digest the vault verifies, and every language on earth ships SHA-256.
//! - **BLAKE3** — content-derived identifiers (vault config fingerprints,
//!   snapshot ids). Faster than SHA-256 on every platform that matters,
//!   and interop doesn't apply to internal ids.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data.
///
/// Returns a 32-byte digest as a `Vec<u8>`. Why `Vec<u8>` and not
/// `[u8; 32]`? Because half the callers immediately pass it to functions
/// that want `&[u8]`. The heap allocation is noise compared to the cost
/// of the hash itself.
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Compute the SHA-256 hash and return a fixed-size array.
///
/// Same as [`sha256`] but returns `[u8; 32]` for callers that want a
/// fixed-size type without the heap allocation — the authorizer signs and
/// verifies over this form.
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute the BLAKE3 hash of the input data.
///
/// Returns a 32-byte digest. The workhorse for internal identifiers;
/// automatically uses SIMD where the platform supports it.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// BLAKE3 digest rendered as a hex string, for ids that travel in JSON.
pub fn blake3_hex(data: &[u8]) -> String {
    hex::encode(blake3_hash(data))
}
