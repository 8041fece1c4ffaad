//! # Cryptographic Primitives for Covault
//!
//! Everything security-related in the platform flows through this module:
//! the designated signer's authorization signatures, vault content ids,
//! and the digests that bind an off-chain deposit authorization to one
//! vault on one chain.
//!
//! We deliberately chose boring, well-audited cryptography:
//!
//! - **Ed25519** for signatures — fast, deterministic, and nobody has
//!   broken it.
//! - **SHA-256** for authorization digests — verifiable from any language
//!   a relayer backend might be written in.
//! - **BLAKE3** for content-derived identifiers — because we live in the
//!   future.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. Everything here is a thin, type-safe wrapper around audited
//! implementations. If you're tempted to optimize these functions, please
//! reconsider. Then reconsider again. Then go read about timing attacks
//! and come back when you've lost the urge.

pub mod hash;
pub mod keys;
pub mod signatures;

// Re-export the things people actually need so they don't have to memorize
// our module hierarchy.
pub use hash::{blake3_hash, sha256, sha256_array};
pub use keys::{CovaultKeypair, CovaultPublicKey, CovaultSignature};
pub use signatures::{sign, verify, verify_raw};
