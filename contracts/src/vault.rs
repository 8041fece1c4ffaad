//! # Campaign Vault
//!
//! The orchestrator and the only surface external callers touch. A
//! campaign vault composes the funding ledger, the signature authorizer,
//! and the payout scheduler, owns every piece of mutable state, and
//! drives the lifecycle:
//!
//! ```text
//!              cap reached OR admin close        now >= maturity
//!    ┌────────┐ ──────────────────────────► ┌────────┐ ───────────► ┌─────────┐
//!    │  Open  │                             │ Closed │              │ Matured │
//!    └────────┘                             └────────┘              └─────────┘
//!      deposits                               waiting                 claims
//! ```
//!
//! Nothing leaves `Matured`. Deposits are accepted only in `Open`;
//! claims only in `Matured` (the Closed → Matured transition is lazy —
//! the first post-maturity call performs it).
//!
//! ## All-or-nothing calls
//!
//! Every operation validates all of its preconditions before mutating
//! anything, and interleaves the asset transfer between validation and
//! commitment. A rejected deposit leaves the ledger, the nonce set, the
//! fee account, and the depositor's allowance exactly as they were.
//!
//! ## Delivery model
//!
//! The vault is constructed as an uninitialized shell — the slot an
//! upgrade proxy points at — and configured exactly once via
//! [`initialize`](CampaignVault::initialize). Configuration is immutable
//! afterwards; all mutable state is serde-serializable so a newer logic
//! version can resume it.

use chrono::{DateTime, Utc};
use covault_core::asset::AssetToken;
use covault_core::crypto::keys::CovaultPublicKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::authorizer::{AuthorizationError, DepositAuthorization, SignatureAuthorizer};
use crate::funding::{FundingError, FundingLedger, FundingTerms};
use crate::payout::{PayoutError, PayoutScheduler, PayoutTerms};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A malformed vault configuration, rejected at initialization.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The three lifecycle instants must be strictly ordered.
    #[error("invalid timeline: require start {start} < end {end} < maturity {maturity}")]
    InvalidTimeline {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        maturity: DateTime<Utc>,
    },

    /// The per-investor bounds are inverted.
    #[error("invalid limits: minimum {min} exceeds maximum {max}")]
    InvalidLimits { min: u64, max: u64 },

    /// A goal of zero means the vault could never accept a deposit.
    #[error("funding goal must be positive")]
    ZeroGoal,

    /// A price of zero makes share issuance undefined.
    #[error("token price must be positive")]
    ZeroPrice,
}

/// Errors surfaced by vault operations.
///
/// Component errors pass through unchanged so callers can match on the
/// exact rejection kind regardless of which layer raised it.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The vault has not been initialized yet.
    #[error("vault is not initialized")]
    NotInitialized,

    /// `initialize` was called on an already-configured vault.
    #[error("vault is already initialized")]
    AlreadyInitialized,

    /// The operation requires the vault to be in `Open`.
    #[error("vault is not open: current phase {phase}")]
    VaultNotOpen {
        /// The vault's current phase.
        phase: VaultPhase,
    },

    /// The caller is not the vault admin.
    #[error("unauthorized: {caller} is not the vault admin")]
    Unauthorized {
        /// Address that attempted the operation.
        caller: String,
    },

    /// The submitted amount does not match the authorized amount.
    #[error("amount mismatch: authorization covers {authorized}, submitted {submitted}")]
    AmountMismatch { authorized: u64, submitted: u64 },

    /// The configuration failed validation.
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),

    /// A funding-ledger rejection.
    #[error(transparent)]
    Funding(#[from] FundingError),

    /// An authorization rejection.
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    /// A payout rejection.
    #[error(transparent)]
    Payout(#[from] PayoutError),

    /// An asset-collaborator rejection, surfaced untouched.
    #[error("asset error: {0}")]
    Asset(#[from] covault_core::asset::AssetError),
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Lifecycle phase of a campaign vault.
///
/// Transitions are one-way: `Open → Closed → Matured`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultPhase {
    /// Accepting deposits (subject to the contribution window).
    Open,
    /// The round is over — cap hit or admin-closed. Waiting on maturity.
    Closed,
    /// Matured. Claims are live; nothing else ever happens.
    Matured,
}

impl std::fmt::Display for VaultPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VaultPhase::Open => write!(f, "Open"),
            VaultPhase::Closed => write!(f, "Closed"),
            VaultPhase::Matured => write!(f, "Matured"),
        }
    }
}

// ---------------------------------------------------------------------------
// VaultConfig
// ---------------------------------------------------------------------------

/// Immutable campaign parameters, set exactly once at initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Address allowed to close the round early and fund distributions.
    pub admin: String,
    /// Public key whose deposit authorizations the relayer rail accepts.
    pub signer: CovaultPublicKey,
    /// Display name of the vault's share token.
    pub share_name: String,
    /// Ticker symbol of the vault's share token.
    pub share_symbol: String,
    /// Symbol of the underlying asset being raised.
    pub asset_symbol: String,
    /// Chain the vault is deployed on; bound into authorization digests.
    pub chain_id: u32,
    /// Funding-side terms: cap, limits, window, price.
    pub funding: FundingTerms,
    /// Payout-side terms: mode, maturity, rates.
    pub payout: PayoutTerms,
}

impl VaultConfig {
    /// Validates the cross-field invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let f = &self.funding;
        if f.start_time >= f.end_time || f.end_time >= self.payout.maturity_time {
            return Err(ConfigError::InvalidTimeline {
                start: f.start_time,
                end: f.end_time,
                maturity: self.payout.maturity_time,
            });
        }
        if f.min_investment > f.max_investment {
            return Err(ConfigError::InvalidLimits {
                min: f.min_investment,
                max: f.max_investment,
            });
        }
        if f.goal == 0 {
            return Err(ConfigError::ZeroGoal);
        }
        if f.token_price == 0 {
            return Err(ConfigError::ZeroPrice);
        }
        Ok(())
    }

    /// Content fingerprint of this configuration: BLAKE3 over the JSON
    /// encoding.
    ///
    /// Logged at creation and exposed through the API so a deployed
    /// vault's parameters can be checked against the ones that were
    /// intended, without comparing fifteen fields by eye.
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(self).expect("config serializes");
        covault_core::crypto::hash::blake3_hex(&bytes)
    }
}

// ---------------------------------------------------------------------------
// VaultState
// ---------------------------------------------------------------------------

/// Everything mutable about an initialized vault, in one record.
///
/// Serializable as a whole so persistence and logic upgrades operate on
/// the same shape the vault runs on.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VaultState {
    config: VaultConfig,
    phase: VaultPhase,
    ledger: FundingLedger,
    authorizer: SignatureAuthorizer,
    payouts: PayoutScheduler,
    /// Fees retained from signed deposits, in smallest units.
    fees_accrued: u64,
    closed_at: Option<DateTime<Utc>>,
    matured_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// CampaignVault
// ---------------------------------------------------------------------------

/// A crowdfunding campaign vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignVault {
    /// Stable identity; also the address the asset ledger knows the
    /// vault by, and part of every authorization digest.
    vault_id: String,
    created_at: DateTime<Utc>,
    /// `None` until `initialize` runs.
    state: Option<VaultState>,
}

impl CampaignVault {
    /// Creates an uninitialized vault shell with the given identity.
    ///
    /// Every operation except [`initialize`](Self::initialize) fails with
    /// [`VaultError::NotInitialized`] until the shell is configured.
    pub fn new(vault_id: &str) -> Self {
        Self {
            vault_id: vault_id.to_string(),
            created_at: Utc::now(),
            state: None,
        }
    }

    /// Configures the vault. Callable exactly once per instance.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::AlreadyInitialized`] on reuse and a
    /// [`ConfigError`] when the configuration violates its invariants.
    pub fn initialize(&mut self, config: VaultConfig) -> Result<(), VaultError> {
        if self.state.is_some() {
            return Err(VaultError::AlreadyInitialized);
        }
        config.validate()?;

        let authorizer = SignatureAuthorizer::new(
            config.signer.clone(),
            &self.vault_id,
            &config.asset_symbol,
            config.chain_id,
        );
        self.state = Some(VaultState {
            config,
            phase: VaultPhase::Open,
            ledger: FundingLedger::new(),
            authorizer,
            payouts: PayoutScheduler::new(),
            fees_accrued: 0,
            closed_at: None,
            matured_at: None,
        });
        Ok(())
    }

    /// Returns the vault's identity string.
    pub fn vault_id(&self) -> &str {
        &self.vault_id
    }

    /// Returns when the shell was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns `true` once `initialize` has run.
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// The immutable configuration.
    pub fn config(&self) -> Result<&VaultConfig, VaultError> {
        Ok(&self.state()?.config)
    }

    /// The current lifecycle phase.
    pub fn phase(&self) -> Result<VaultPhase, VaultError> {
        Ok(self.state()?.phase)
    }

    // -----------------------------------------------------------------------
    // Deposits
    // -----------------------------------------------------------------------

    /// Accepts a direct deposit from `investor` and returns the shares
    /// issued.
    ///
    /// Order of operations: phase gate, ledger validation, asset
    /// `transfer_from` (the investor must have approved the vault), then
    /// commitment. Hitting the cap exactly closes the round in the same
    /// call.
    ///
    /// # Errors
    ///
    /// [`VaultError::VaultNotOpen`] outside `Open`; any [`FundingError`];
    /// asset rejections pass through with no vault state touched.
    pub fn deposit(
        &mut self,
        asset: &mut dyn AssetToken,
        investor: &str,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Result<u64, VaultError> {
        let state = self.state.as_mut().ok_or(VaultError::NotInitialized)?;
        if state.phase != VaultPhase::Open {
            return Err(VaultError::VaultNotOpen { phase: state.phase });
        }

        let plan = state
            .ledger
            .validate_deposit(&state.config.funding, investor, amount, now)?;

        asset.transfer_from(&self.vault_id, investor, &self.vault_id, amount)?;

        state.ledger.apply_deposit(&plan, now);
        if state.ledger.cap_reached(&state.config.funding) {
            state.phase = VaultPhase::Closed;
            state.closed_at = Some(now);
        }

        Ok(plan.shares)
    }

    /// Accepts a relayer-submitted deposit under a signed authorization
    /// and returns the shares issued to the beneficiary.
    ///
    /// The submitted `amount` must equal the authorized amount; the fee
    /// is deducted before the ledger is credited and accrues to the
    /// vault's fee account. The nonce is consumed only here, after the
    /// ledger has committed — an authorization rejected downstream (cap,
    /// window, allowance) stays replayable with the same nonce.
    pub fn deposit_with_authorization(
        &mut self,
        asset: &mut dyn AssetToken,
        auth: &DepositAuthorization,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Result<u64, VaultError> {
        let state = self.state.as_mut().ok_or(VaultError::NotInitialized)?;
        if state.phase != VaultPhase::Open {
            return Err(VaultError::VaultNotOpen { phase: state.phase });
        }
        if amount != auth.amount {
            return Err(VaultError::AmountMismatch {
                authorized: auth.amount,
                submitted: amount,
            });
        }

        let validated = state.authorizer.validate(auth, now)?;
        let plan = state.ledger.validate_deposit(
            &state.config.funding,
            &validated.beneficiary,
            validated.net_amount,
            now,
        )?;
        let fees_after = state
            .fees_accrued
            .checked_add(validated.fee)
            .ok_or(FundingError::AmountOverflow)?;

        // The gross amount is pulled from the beneficiary; the fee stays
        // in the vault rather than converting to shares.
        asset.transfer_from(&self.vault_id, &validated.beneficiary, &self.vault_id, amount)?;

        state.ledger.apply_deposit(&plan, now);
        state.fees_accrued = fees_after;
        state.authorizer.consume(validated.nonce, now)?;
        if state.ledger.cap_reached(&state.config.funding) {
            state.phase = VaultPhase::Closed;
            state.closed_at = Some(now);
        }

        Ok(plan.shares)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Closes the round early. Admin only; valid only from `Open`.
    pub fn close(&mut self, caller: &str, now: DateTime<Utc>) -> Result<(), VaultError> {
        let state = self.state.as_mut().ok_or(VaultError::NotInitialized)?;
        if caller != state.config.admin {
            return Err(VaultError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        if state.phase != VaultPhase::Open {
            return Err(VaultError::VaultNotOpen { phase: state.phase });
        }
        state.phase = VaultPhase::Closed;
        state.closed_at = Some(now);
        Ok(())
    }

    /// Transitions to `Matured` once `now` is at or past maturity.
    ///
    /// Callable by anyone; idempotent when already matured. A vault still
    /// `Open` at maturity is closed and matured in the same call — its
    /// contribution window is necessarily long over.
    ///
    /// # Errors
    ///
    /// [`PayoutError::NotYetMatured`] before the maturity instant.
    pub fn finalize_maturity(&mut self, now: DateTime<Utc>) -> Result<(), VaultError> {
        self.ensure_matured(now)
    }

    /// Pays out everything currently claimable by `investor`.
    ///
    /// Performs the lazy Closed → Matured transition if the maturity
    /// instant has passed. The payout is transferred from the vault's
    /// asset balance; an underfunded vault surfaces the asset
    /// collaborator's rejection with no claim recorded.
    pub fn claim(
        &mut self,
        asset: &mut dyn AssetToken,
        investor: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, VaultError> {
        self.ensure_matured(now)?;
        let state = self.state.as_mut().ok_or(VaultError::NotInitialized)?;

        let contributed = state.ledger.contributed(investor);
        let total_raised = state.ledger.total_raised();
        let due = state.payouts.claimable(
            &state.config.payout,
            investor,
            contributed,
            total_raised,
            now,
        )?;
        if due == 0 {
            return Err(PayoutError::NothingClaimable.into());
        }

        asset.transfer(&self.vault_id, investor, due)?;

        let paid = state.payouts.claim(
            &state.config.payout,
            investor,
            contributed,
            total_raised,
            now,
        )?;
        debug_assert_eq!(paid, due);

        Ok(due)
    }

    /// Records a dividend distribution, pulling the pool from the admin.
    ///
    /// Admin only. The admin must have approved the vault for at least
    /// `amount` on the asset ledger.
    pub fn record_distribution(
        &mut self,
        asset: &mut dyn AssetToken,
        caller: &str,
        amount: u64,
    ) -> Result<(), VaultError> {
        let state = self.state.as_mut().ok_or(VaultError::NotInitialized)?;
        if caller != state.config.admin {
            return Err(VaultError::Unauthorized {
                caller: caller.to_string(),
            });
        }

        state
            .payouts
            .validate_distribution(&state.config.payout, amount)?;

        asset.transfer_from(&self.vault_id, caller, &self.vault_id, amount)?;

        state
            .payouts
            .record_distribution(&state.config.payout, amount)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    /// Total accepted across all investors.
    pub fn total_raised(&self) -> Result<u64, VaultError> {
        Ok(self.state()?.ledger.total_raised())
    }

    /// Total shares issued.
    pub fn total_shares(&self) -> Result<u64, VaultError> {
        Ok(self.state()?.ledger.total_shares())
    }

    /// Shares held by `investor`.
    pub fn shares_of(&self, investor: &str) -> Result<u64, VaultError> {
        Ok(self.state()?.ledger.shares_of(investor))
    }

    /// Cumulative contribution of `investor`.
    pub fn contributed_of(&self, investor: &str) -> Result<u64, VaultError> {
        Ok(self.state()?.ledger.contributed(investor))
    }

    /// Capacity left before the funding cap.
    pub fn remaining_capacity(&self) -> Result<u64, VaultError> {
        let state = self.state()?;
        Ok(state.ledger.remaining_capacity(&state.config.funding))
    }

    /// Fees retained from signed deposits so far.
    pub fn fees_accrued(&self) -> Result<u64, VaultError> {
        Ok(self.state()?.fees_accrued)
    }

    /// Number of distinct investors.
    pub fn investor_count(&self) -> Result<usize, VaultError> {
        Ok(self.state()?.ledger.investor_count())
    }

    /// What `investor` could claim at `now`, without claiming.
    pub fn claimable(&self, investor: &str, now: DateTime<Utc>) -> Result<u64, VaultError> {
        let state = self.state()?;
        let due = state.payouts.claimable(
            &state.config.payout,
            investor,
            state.ledger.contributed(investor),
            state.ledger.total_raised(),
            now,
        )?;
        Ok(due)
    }

    /// Total recorded across dividend distributions.
    pub fn total_distributed(&self) -> Result<u64, VaultError> {
        Ok(self.state()?.payouts.total_distributed())
    }

    /// Distribution events recorded so far.
    pub fn distribution_count(&self) -> Result<u32, VaultError> {
        Ok(self.state()?.payouts.distribution_count())
    }

    /// Whether an authorization nonce has been consumed.
    pub fn nonce_consumed(&self, nonce: u64) -> Result<bool, VaultError> {
        Ok(self.state()?.authorizer.is_consumed(nonce))
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn state(&self) -> Result<&VaultState, VaultError> {
        self.state.as_ref().ok_or(VaultError::NotInitialized)
    }

    /// Lazily performs the transition to `Matured`. Idempotent.
    fn ensure_matured(&mut self, now: DateTime<Utc>) -> Result<(), VaultError> {
        let state = self.state.as_mut().ok_or(VaultError::NotInitialized)?;
        if state.phase == VaultPhase::Matured {
            return Ok(());
        }
        if !state.config.payout.is_matured(now) {
            return Err(PayoutError::NotYetMatured {
                matures_at: state.config.payout.maturity_time,
                now,
            }
            .into());
        }
        if state.phase == VaultPhase::Open {
            state.closed_at = Some(now);
        }
        state.phase = VaultPhase::Matured;
        state.matured_at = Some(now);
        Ok(())
    }
}
