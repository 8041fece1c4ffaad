//! # Signature Authorizer
//!
//! The relayer rail. An investor who cannot (or will not) submit their
//! own transaction — fiat on-ramp purchases, custodial flows — gets a
//! deposit authorization signed off-chain by the vault's designated
//! signer. A relayer then submits the deposit on their behalf, and the
//! vault verifies the authorization instead of trusting the submitter.
//!
//! ## What the signature binds
//!
//! The signed digest covers `(vault id, beneficiary, asset, amount, fee,
//! chain id, nonce, deadline)` under a versioned domain tag. The vault
//! id, asset, and chain id are taken from the verifying vault's own
//! configuration — never from the relayer's payload — so an authorization
//! produced for another vault or another chain simply fails signature
//! verification here. Same acceptance predicate as recover-and-compare,
//! without needing a recoverable signature scheme.
//!
//! ## Replay protection
//!
//! Each authorization carries a one-time nonce. The consumed-nonce set is
//! append-only and write-once: entries are created on first successful
//! use and never mutated or removed. Consumption is a separate step from
//! validation — the vault commits it only together with the ledger
//! update, so a deposit rejected downstream (cap hit, window closed)
//! does not burn the nonce.

use chrono::{DateTime, Utc};
use covault_core::config::AUTHORIZATION_DOMAIN_TAG;
use covault_core::crypto::hash::sha256_array;
use covault_core::crypto::keys::{CovaultKeypair, CovaultPublicKey, CovaultSignature};
use covault_core::crypto::signatures;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can reject a signed deposit authorization.
#[derive(Debug, Error)]
pub enum AuthorizationError {
    /// The declared fee is larger than the deposit it is taken from.
    #[error("fee exceeds amount: amount {amount}, fee {fee}")]
    FeeExceedsAmount {
        /// The authorized deposit amount.
        amount: u64,
        /// The declared fee.
        fee: u64,
    },

    /// The signature does not verify under the vault's designated signer.
    ///
    /// Also the failure mode for cross-vault and cross-chain replays:
    /// the digest is recomputed with this vault's own binding fields, so
    /// a signature produced for a different vault cannot verify.
    #[error("unauthorized signer: signature does not verify under the designated signer")]
    UnauthorizedSigner,

    /// The authorization's deadline has passed.
    #[error("authorization expired: deadline {deadline}, now {now}")]
    AuthorizationExpired {
        /// The signed deadline.
        deadline: DateTime<Utc>,
        /// The rejected call's timestamp.
        now: DateTime<Utc>,
    },

    /// The nonce was already consumed by an earlier deposit.
    #[error("nonce replayed: {nonce} was already consumed")]
    NonceReplayed {
        /// The replayed nonce.
        nonce: u64,
    },
}

// ---------------------------------------------------------------------------
// Digest
// ---------------------------------------------------------------------------

/// Computes the digest a deposit authorization is signed over.
///
/// Canonical encoding: the domain tag, then each field in fixed order —
/// strings length-prefixed (u32 LE) to keep the encoding injective,
/// integers as little-endian, the deadline as unix seconds. Both the
/// signer tooling and the verifying vault call this; there is exactly
/// one implementation on purpose.
#[allow(clippy::too_many_arguments)]
pub fn authorization_digest(
    vault_id: &str,
    beneficiary: &str,
    asset: &str,
    amount: u64,
    fee: u64,
    chain_id: u32,
    nonce: u64,
    deadline: DateTime<Utc>,
) -> [u8; 32] {
    let mut preimage = Vec::with_capacity(
        AUTHORIZATION_DOMAIN_TAG.len() + vault_id.len() + beneficiary.len() + asset.len() + 48,
    );
    preimage.extend_from_slice(AUTHORIZATION_DOMAIN_TAG);
    for field in [vault_id, beneficiary, asset] {
        preimage.extend_from_slice(&(field.len() as u32).to_le_bytes());
        preimage.extend_from_slice(field.as_bytes());
    }
    preimage.extend_from_slice(&amount.to_le_bytes());
    preimage.extend_from_slice(&fee.to_le_bytes());
    preimage.extend_from_slice(&chain_id.to_le_bytes());
    preimage.extend_from_slice(&nonce.to_le_bytes());
    preimage.extend_from_slice(&deadline.timestamp().to_le_bytes());

    sha256_array(&preimage)
}

// ---------------------------------------------------------------------------
// DepositAuthorization
// ---------------------------------------------------------------------------

/// A relayer-submitted deposit authorization.
///
/// Carries only the fields the relayer may choose; the binding fields
/// (vault id, asset, chain id) are supplied by the verifying vault from
/// its own configuration when the digest is recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositAuthorization {
    /// Investor the deposit is credited to.
    pub beneficiary: String,
    /// Gross deposit amount, in smallest units.
    pub amount: u64,
    /// Relayer fee deducted before crediting, in smallest units.
    pub fee: u64,
    /// One-time-use replay-protection nonce.
    pub nonce: u64,
    /// Latest instant at which this authorization is valid.
    pub deadline: DateTime<Utc>,
    /// The designated signer's Ed25519 signature over the digest.
    pub signature: CovaultSignature,
}

impl DepositAuthorization {
    /// Signs a fresh authorization with the designated signer's keypair.
    ///
    /// This is the signer-tooling side of the rail; the vault only ever
    /// verifies. The binding fields must match the target vault exactly
    /// or verification there will fail.
    #[allow(clippy::too_many_arguments)]
    pub fn sign(
        signer: &CovaultKeypair,
        vault_id: &str,
        asset: &str,
        chain_id: u32,
        beneficiary: &str,
        amount: u64,
        fee: u64,
        nonce: u64,
        deadline: DateTime<Utc>,
    ) -> Self {
        let digest = authorization_digest(
            vault_id, beneficiary, asset, amount, fee, chain_id, nonce, deadline,
        );
        Self {
            beneficiary: beneficiary.to_string(),
            amount,
            fee,
            nonce,
            deadline,
            signature: signer.sign(&digest),
        }
    }

    /// Net amount credited to the ledger after the fee is deducted.
    pub fn net_amount(&self) -> Option<u64> {
        self.amount.checked_sub(self.fee)
    }
}

// ---------------------------------------------------------------------------
// ValidatedDeposit
// ---------------------------------------------------------------------------

/// The outcome of a successful validation: the amounts the vault may act
/// on, with the fee already split out.
#[derive(Debug, Clone)]
pub struct ValidatedDeposit {
    /// Investor to credit.
    pub beneficiary: String,
    /// Gross amount to pull from the beneficiary.
    pub amount: u64,
    /// Fee retained by the vault's fee account.
    pub fee: u64,
    /// Amount credited to the funding ledger (`amount - fee`).
    pub net_amount: u64,
    /// Nonce to consume once the deposit commits.
    pub nonce: u64,
}

// ---------------------------------------------------------------------------
// SignatureAuthorizer
// ---------------------------------------------------------------------------

/// Validates deposit authorizations against one vault's binding and
/// tracks consumed nonces.
///
/// Exclusively owned by its vault. The consumed set is the only
/// concurrency-sensitive structure in the system; the vault's `&mut`
/// exclusivity is what makes check-then-consume atomic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureAuthorizer {
    /// The designated signer whose authorizations this vault accepts.
    signer: CovaultPublicKey,
    /// Binding: the vault this authorizer belongs to.
    vault_id: String,
    /// Binding: the asset the vault raises.
    asset: String,
    /// Binding: the chain the vault is deployed on.
    chain_id: u32,
    /// Consumed nonces and when each was used. Append-only, write-once.
    consumed: HashMap<u64, DateTime<Utc>>,
}

impl SignatureAuthorizer {
    /// Creates an authorizer bound to one vault, asset, and chain.
    pub fn new(signer: CovaultPublicKey, vault_id: &str, asset: &str, chain_id: u32) -> Self {
        Self {
            signer,
            vault_id: vault_id.to_string(),
            asset: asset.to_string(),
            chain_id,
            consumed: HashMap::new(),
        }
    }

    /// Returns the designated signer's public key.
    pub fn signer(&self) -> &CovaultPublicKey {
        &self.signer
    }

    /// Validates an authorization without consuming its nonce.
    ///
    /// Checks run cheapest-first, each with its own error kind:
    ///
    /// 1. Fee sanity — `fee <= amount`.
    /// 2. Signature — digest recomputed from this vault's own binding
    ///    plus the relayer's fields, verified under the designated
    ///    signer.
    /// 3. Deadline — `now <= deadline`.
    /// 4. Replay — nonce not yet consumed.
    ///
    /// The caller commits [`consume`](Self::consume) only after the rest
    /// of the deposit has succeeded.
    pub fn validate(
        &self,
        auth: &DepositAuthorization,
        now: DateTime<Utc>,
    ) -> Result<ValidatedDeposit, AuthorizationError> {
        let net_amount = auth
            .net_amount()
            .ok_or(AuthorizationError::FeeExceedsAmount {
                amount: auth.amount,
                fee: auth.fee,
            })?;

        let digest = authorization_digest(
            &self.vault_id,
            &auth.beneficiary,
            &self.asset,
            auth.amount,
            auth.fee,
            self.chain_id,
            auth.nonce,
            auth.deadline,
        );
        if !signatures::verify(&self.signer, &digest, &auth.signature) {
            return Err(AuthorizationError::UnauthorizedSigner);
        }

        if now > auth.deadline {
            return Err(AuthorizationError::AuthorizationExpired {
                deadline: auth.deadline,
                now,
            });
        }

        if self.consumed.contains_key(&auth.nonce) {
            return Err(AuthorizationError::NonceReplayed { nonce: auth.nonce });
        }

        Ok(ValidatedDeposit {
            beneficiary: auth.beneficiary.clone(),
            amount: auth.amount,
            fee: auth.fee,
            net_amount,
            nonce: auth.nonce,
        })
    }

    /// Marks a nonce consumed. Irreversible.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationError::NonceReplayed`] if the nonce is
    /// already in the set — validation should have caught this, but a
    /// write-once set does not rely on its callers.
    pub fn consume(&mut self, nonce: u64, now: DateTime<Utc>) -> Result<(), AuthorizationError> {
        if self.consumed.contains_key(&nonce) {
            return Err(AuthorizationError::NonceReplayed { nonce });
        }
        self.consumed.insert(nonce, now);
        Ok(())
    }

    /// Returns `true` if `nonce` has been consumed.
    pub fn is_consumed(&self, nonce: u64) -> bool {
        self.consumed.contains_key(&nonce)
    }

    /// Number of nonces consumed so far.
    pub fn consumed_count(&self) -> usize {
        self.consumed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use covault_core::config::CHAIN_ID_DEVNET;

    const VAULT: &str = "vault-7f3a";
    const ASSET: &str = "BUSD";

    fn authorizer(signer: &CovaultKeypair) -> SignatureAuthorizer {
        SignatureAuthorizer::new(signer.public_key(), VAULT, ASSET, CHAIN_ID_DEVNET)
    }

    fn signed_auth(signer: &CovaultKeypair, nonce: u64) -> DepositAuthorization {
        DepositAuthorization::sign(
            signer,
            VAULT,
            ASSET,
            CHAIN_ID_DEVNET,
            "beneficiary-pk",
            1_000_000_000,
            25_000_000,
            nonce,
            Utc::now() + Duration::hours(1),
        )
    }

    #[test]
    fn valid_authorization_passes_and_splits_fee() {
        let signer = CovaultKeypair::generate();
        let auth = signed_auth(&signer, 1);
        let validated = authorizer(&signer).validate(&auth, Utc::now()).unwrap();

        assert_eq!(validated.beneficiary, "beneficiary-pk");
        assert_eq!(validated.amount, 1_000_000_000);
        assert_eq!(validated.fee, 25_000_000);
        // 25/1000 fee on 10 units nets 9.75.
        assert_eq!(validated.net_amount, 975_000_000);
    }

    #[test]
    fn wrong_signer_rejected() {
        let signer = CovaultKeypair::generate();
        let impostor = CovaultKeypair::generate();
        // Valid nonce, valid deadline — wrong key.
        let auth = signed_auth(&impostor, 1);

        let result = authorizer(&signer).validate(&auth, Utc::now());
        assert!(matches!(result, Err(AuthorizationError::UnauthorizedSigner)));
    }

    #[test]
    fn tampered_amount_rejected() {
        let signer = CovaultKeypair::generate();
        let mut auth = signed_auth(&signer, 1);
        auth.amount += 1;

        let result = authorizer(&signer).validate(&auth, Utc::now());
        assert!(matches!(result, Err(AuthorizationError::UnauthorizedSigner)));
    }

    #[test]
    fn cross_vault_replay_rejected() {
        let signer = CovaultKeypair::generate();
        let auth = signed_auth(&signer, 1);

        // Same signer, different vault binding: the digest differs, so
        // the signature cannot verify.
        let other_vault =
            SignatureAuthorizer::new(signer.public_key(), "vault-other", ASSET, CHAIN_ID_DEVNET);
        let result = other_vault.validate(&auth, Utc::now());
        assert!(matches!(result, Err(AuthorizationError::UnauthorizedSigner)));
    }

    #[test]
    fn cross_chain_replay_rejected() {
        let signer = CovaultKeypair::generate();
        let auth = signed_auth(&signer, 1);

        let other_chain = SignatureAuthorizer::new(
            signer.public_key(),
            VAULT,
            ASSET,
            covault_core::config::CHAIN_ID_MAINNET,
        );
        let result = other_chain.validate(&auth, Utc::now());
        assert!(matches!(result, Err(AuthorizationError::UnauthorizedSigner)));
    }

    #[test]
    fn expired_authorization_rejected() {
        let signer = CovaultKeypair::generate();
        let auth = DepositAuthorization::sign(
            &signer,
            VAULT,
            ASSET,
            CHAIN_ID_DEVNET,
            "beneficiary-pk",
            1_000_000_000,
            0,
            1,
            Utc::now() - Duration::seconds(5),
        );

        let result = authorizer(&signer).validate(&auth, Utc::now());
        assert!(matches!(
            result,
            Err(AuthorizationError::AuthorizationExpired { .. })
        ));
    }

    #[test]
    fn deadline_is_inclusive() {
        let signer = CovaultKeypair::generate();
        let deadline = Utc::now() + Duration::hours(1);
        let auth = DepositAuthorization::sign(
            &signer,
            VAULT,
            ASSET,
            CHAIN_ID_DEVNET,
            "beneficiary-pk",
            1_000_000_000,
            0,
            1,
            deadline,
        );

        // Exactly at the deadline is still valid.
        assert!(authorizer(&signer).validate(&auth, deadline).is_ok());
    }

    #[test]
    fn fee_exceeding_amount_rejected() {
        let signer = CovaultKeypair::generate();
        let auth = DepositAuthorization::sign(
            &signer,
            VAULT,
            ASSET,
            CHAIN_ID_DEVNET,
            "beneficiary-pk",
            100,
            101,
            1,
            Utc::now() + Duration::hours(1),
        );

        let result = authorizer(&signer).validate(&auth, Utc::now());
        assert!(matches!(
            result,
            Err(AuthorizationError::FeeExceedsAmount { amount: 100, fee: 101 })
        ));
    }

    #[test]
    fn consumed_nonce_rejected_on_second_use() {
        let signer = CovaultKeypair::generate();
        let mut authorizer = authorizer(&signer);
        let auth = signed_auth(&signer, 42);
        let now = Utc::now();

        authorizer.validate(&auth, now).unwrap();
        authorizer.consume(42, now).unwrap();

        let result = authorizer.validate(&auth, now);
        assert!(matches!(
            result,
            Err(AuthorizationError::NonceReplayed { nonce: 42 })
        ));
    }

    #[test]
    fn validation_does_not_consume() {
        let signer = CovaultKeypair::generate();
        let mut authorizer = authorizer(&signer);
        let auth = signed_auth(&signer, 7);
        let now = Utc::now();

        // Validate twice — the nonce stays free until consume().
        authorizer.validate(&auth, now).unwrap();
        authorizer.validate(&auth, now).unwrap();
        assert!(!authorizer.is_consumed(7));

        authorizer.consume(7, now).unwrap();
        assert!(authorizer.is_consumed(7));
        assert_eq!(authorizer.consumed_count(), 1);
    }

    #[test]
    fn double_consume_rejected() {
        let signer = CovaultKeypair::generate();
        let mut authorizer = authorizer(&signer);
        let now = Utc::now();

        authorizer.consume(9, now).unwrap();
        let result = authorizer.consume(9, now);
        assert!(matches!(
            result,
            Err(AuthorizationError::NonceReplayed { nonce: 9 })
        ));
    }

    #[test]
    fn digest_is_field_order_sensitive() {
        // Swapping amount and fee must change the digest — the encoding
        // is injective, not just a concatenation of digits.
        let a = authorization_digest(VAULT, "ben", ASSET, 100, 25, 1, 1, Utc::now());
        let b = authorization_digest(VAULT, "ben", ASSET, 25, 100, 1, 1, Utc::now());
        assert_ne!(a, b);
    }

    #[test]
    fn digest_length_prefix_prevents_sliding() {
        // "ab" + "c" and "a" + "bc" must not collide.
        let deadline = Utc::now();
        let a = authorization_digest("ab", "c", ASSET, 1, 0, 1, 1, deadline);
        let b = authorization_digest("a", "bc", ASSET, 1, 0, 1, 1, deadline);
        assert_ne!(a, b);
    }

    #[test]
    fn authorizer_serialization_roundtrip() {
        let signer = CovaultKeypair::generate();
        let mut authorizer = authorizer(&signer);
        authorizer.consume(3, Utc::now()).unwrap();

        let json = serde_json::to_string(&authorizer).expect("serialize");
        let restored: SignatureAuthorizer = serde_json::from_str(&json).expect("deserialize");

        assert!(restored.is_consumed(3));
        assert_eq!(restored.signer(), &signer.public_key());
    }
}
