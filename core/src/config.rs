//! # Protocol Configuration & Constants
//!
//! Every magic number in Covault lives here. If you're hardcoding a
//! constant somewhere else, you're doing it wrong and you owe the team
//! coffee.
//!
//! Changing any of these after vaults have been deployed against them is
//! somewhere between "difficult" and "career-ending", so choose wisely
//! while everything is still on devnet.

// ---------------------------------------------------------------------------
// Chain Identifiers
// ---------------------------------------------------------------------------

/// Mainnet — the real deal. Mistakes here cost real money.
pub const CHAIN_ID_MAINNET: u32 = 0x43564C54; // "CVLT" in ASCII hex. Yes, we're that cute.

/// Testnet — where we break things on purpose and call it "testing."
pub const CHAIN_ID_TESTNET: u32 = 0x43565454; // "CVTT"

/// Devnet — the wild west. Reset weekly, no promises, no survivors.
pub const CHAIN_ID_DEVNET: u32 = 0x43564454; // "CVDT"

/// Resolves a human-readable chain name to its identifier.
///
/// Unknown names map to devnet — the only network where a typo is harmless.
pub fn chain_id_for(name: &str) -> u32 {
    match name.to_lowercase().as_str() {
        "mainnet" => CHAIN_ID_MAINNET,
        "testnet" => CHAIN_ID_TESTNET,
        _ => CHAIN_ID_DEVNET,
    }
}

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The full version string, assembled at compile time so we don't allocate
/// for something this trivial at runtime.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Monetary Units
// ---------------------------------------------------------------------------

/// Number of decimal places in the smallest-unit denomination.
///
/// Every amount in the system — contributions, caps, prices, shares — is a
/// `u64` scaled by `10^AMOUNT_DECIMALS`. The decimals exist for display
/// only; the protocol never divides a whole unit.
pub const AMOUNT_DECIMALS: u8 = 8;

/// `10^AMOUNT_DECIMALS`. One whole unit in smallest-unit denomination.
///
/// Also the scaling factor in the share-pricing formula: a deposit of
/// `amount` at `token_price` (asset units per whole share) issues
/// `amount * AMOUNT_SCALE / token_price` share units, truncated.
pub const AMOUNT_SCALE: u64 = 100_000_000;

/// Denominator for parts-per-thousand rates (capital appreciation).
///
/// Permille, not basis points: the appreciation rate in a vault config is
/// `N / 1000`. 500 = 50.0%. Coarser than bps, but it matches how the
/// payout terms are quoted to investors.
pub const PERMILLE_BASE: u64 = 1_000;

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Ed25519 — deterministic signatures, no k-value footguns, fast
/// verification. The only sane choice.
pub const SIGNING_ALGORITHM: &str = "Ed25519";

/// Ed25519 secret keys are 32 bytes.
pub const SIGNING_KEY_LENGTH: usize = 32;

/// Public (verifying) key length in bytes.
pub const VERIFYING_KEY_LENGTH: usize = 32;

/// Ed25519 signature length. Always 64 bytes. If yours isn't, something
/// has gone terribly wrong.
pub const SIGNATURE_LENGTH: usize = 64;

/// Domain-separation tag prefixed to every deposit-authorization digest.
///
/// Versioned so a future digest-layout change cannot collide with
/// signatures produced under the current one.
pub const AUTHORIZATION_DOMAIN_TAG: &[u8] = b"COVAULT/deposit-authorization/v1";
