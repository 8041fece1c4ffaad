//! # Payout Scheduler
//!
//! Post-maturity bookkeeping for a campaign vault. Before maturity the
//! vault only accrues; at or after `maturity_time` shareholders may claim
//! under the configured mode:
//!
//! - **Capital appreciation** — a one-shot payment of
//!   `contributed * appreciation_permille / 1000` per investor.
//! - **Dividends** — admin-recorded distribution events (bounded by a
//!   configured count); each investor's entitlement is their share of
//!   the raise applied to the distributed pool, claimable incrementally.
//! - **Both** — the two schedules run independently and sum.
//!
//! Maturity is never "triggered": there are no timers in this system.
//! Every call takes the caller's `now` and compares it against the
//! configured maturity instant — the Accruing → Matured transition is a
//! predicate, not an event.
//!
//! All rate math widens to u128 before multiplying and truncates on
//! division, the same policy as share pricing.

use chrono::{DateTime, Utc};
use covault_core::config::PERMILLE_BASE;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can reject a claim or a distribution event.
#[derive(Debug, Error)]
pub enum PayoutError {
    /// A claim arrived before the vault matured.
    #[error("not yet matured: matures at {matures_at}, now {now}")]
    NotYetMatured {
        /// The configured maturity instant.
        matures_at: DateTime<Utc>,
        /// The rejected call's timestamp.
        now: DateTime<Utc>,
    },

    /// The configured number of dividend distributions is exhausted.
    #[error("distribution limit reached: {limit} distributions already recorded")]
    DistributionLimitReached {
        /// The configured maximum.
        limit: u32,
    },

    /// The payout mode does not include dividends.
    #[error("distributions not enabled under {mode:?} payout")]
    DistributionsNotEnabled {
        /// The vault's configured mode.
        mode: PayoutMode,
    },

    /// The investor has nothing to claim right now.
    #[error("nothing claimable for this investor")]
    NothingClaimable,

    /// Payout arithmetic would overflow.
    #[error("amount overflow: payout would exceed representable limits")]
    AmountOverflow,
}

// ---------------------------------------------------------------------------
// PayoutMode
// ---------------------------------------------------------------------------

/// The formula governing post-maturity distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayoutMode {
    /// One-shot appreciation payment at maturity.
    CapitalAppreciation,
    /// Periodic admin-recorded distributions, claimed pro rata.
    Dividends,
    /// Both schedules, independently, summed.
    Both,
}

impl PayoutMode {
    /// Decodes the wire/config representation: 0, 1, or 2.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(PayoutMode::CapitalAppreciation),
            1 => Some(PayoutMode::Dividends),
            2 => Some(PayoutMode::Both),
            _ => None,
        }
    }

    /// The wire/config representation.
    pub fn code(&self) -> u8 {
        match self {
            PayoutMode::CapitalAppreciation => 0,
            PayoutMode::Dividends => 1,
            PayoutMode::Both => 2,
        }
    }

    /// Returns `true` if the appreciation schedule applies.
    pub fn includes_appreciation(&self) -> bool {
        matches!(self, PayoutMode::CapitalAppreciation | PayoutMode::Both)
    }

    /// Returns `true` if the dividend schedule applies.
    pub fn includes_dividends(&self) -> bool {
        matches!(self, PayoutMode::Dividends | PayoutMode::Both)
    }
}

impl std::fmt::Display for PayoutMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayoutMode::CapitalAppreciation => write!(f, "CapitalAppreciation"),
            PayoutMode::Dividends => write!(f, "Dividends"),
            PayoutMode::Both => write!(f, "Both"),
        }
    }
}

// ---------------------------------------------------------------------------
// Terms
// ---------------------------------------------------------------------------

/// The payout-side parameters of a campaign, fixed at initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutTerms {
    /// Which schedules apply.
    pub mode: PayoutMode,
    /// Instant after which claims become available.
    pub maturity_time: DateTime<Utc>,
    /// Appreciation rate in parts per thousand. 500 = 50.0%.
    pub appreciation_permille: u32,
    /// Maximum number of dividend distribution events.
    pub max_distributions: u32,
}

impl PayoutTerms {
    /// Returns `true` once `now` is at or past maturity.
    pub fn is_matured(&self, now: DateTime<Utc>) -> bool {
        now >= self.maturity_time
    }
}

// ---------------------------------------------------------------------------
// PayoutScheduler
// ---------------------------------------------------------------------------

/// Tracks distributed amounts and per-investor claim state for one vault.
///
/// The scheduler never sees the funding book — the vault hands it each
/// investor's contribution and the raise total at call time, which keeps
/// ownership of the investor mapping in exactly one place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayoutScheduler {
    /// Total amount recorded across all distribution events.
    total_distributed: u64,
    /// Number of distribution events recorded.
    distribution_count: u32,
    /// Appreciation already paid, keyed by investor. Presence = claimed;
    /// the appreciation schedule pays exactly once.
    appreciation_paid: HashMap<String, u64>,
    /// Dividends already claimed, keyed by investor.
    dividends_claimed: HashMap<String, u64>,
}

impl PayoutScheduler {
    /// Creates a scheduler with no distributions and no claims.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a dividend distribution event.
    ///
    /// # Errors
    ///
    /// Returns [`PayoutError::DistributionsNotEnabled`] when the mode has
    /// no dividend schedule, [`PayoutError::DistributionLimitReached`]
    /// when the configured event count is exhausted, and
    /// [`PayoutError::AmountOverflow`] if the pool would overflow.
    pub fn record_distribution(
        &mut self,
        terms: &PayoutTerms,
        amount: u64,
    ) -> Result<(), PayoutError> {
        self.validate_distribution(terms, amount)?;

        // Proven by validation just above.
        self.total_distributed += amount;
        self.distribution_count += 1;
        Ok(())
    }

    /// Checks distribution preconditions without recording anything.
    ///
    /// The vault runs this before pulling the pool from the admin so a
    /// failed transfer cannot leave a phantom distribution event behind.
    pub fn validate_distribution(
        &self,
        terms: &PayoutTerms,
        amount: u64,
    ) -> Result<(), PayoutError> {
        if !terms.mode.includes_dividends() {
            return Err(PayoutError::DistributionsNotEnabled { mode: terms.mode });
        }
        if self.distribution_count >= terms.max_distributions {
            return Err(PayoutError::DistributionLimitReached {
                limit: terms.max_distributions,
            });
        }
        self.total_distributed
            .checked_add(amount)
            .ok_or(PayoutError::AmountOverflow)?;
        Ok(())
    }

    /// Computes what `investor` may claim right now, without claiming.
    ///
    /// `contributed` and `total_raised` come from the funding ledger; the
    /// scheduler only knows its own claim history.
    ///
    /// # Errors
    ///
    /// Returns [`PayoutError::NotYetMatured`] before maturity.
    pub fn claimable(
        &self,
        terms: &PayoutTerms,
        investor: &str,
        contributed: u64,
        total_raised: u64,
        now: DateTime<Utc>,
    ) -> Result<u64, PayoutError> {
        let (appreciation, dividends) = self.due_parts(terms, investor, contributed, total_raised, now)?;
        appreciation
            .checked_add(dividends)
            .ok_or(PayoutError::AmountOverflow)
    }

    /// Claims everything currently due to `investor` and records it.
    ///
    /// Returns the total paid out. Repeat claims pay only dividends that
    /// accrued since the last claim — the appreciation schedule pays once.
    ///
    /// # Errors
    ///
    /// [`PayoutError::NotYetMatured`] before maturity;
    /// [`PayoutError::NothingClaimable`] when the due amount is zero.
    pub fn claim(
        &mut self,
        terms: &PayoutTerms,
        investor: &str,
        contributed: u64,
        total_raised: u64,
        now: DateTime<Utc>,
    ) -> Result<u64, PayoutError> {
        let (appreciation, dividends) = self.due_parts(terms, investor, contributed, total_raised, now)?;
        let total = appreciation
            .checked_add(dividends)
            .ok_or(PayoutError::AmountOverflow)?;
        if total == 0 {
            return Err(PayoutError::NothingClaimable);
        }

        if terms.mode.includes_appreciation() && !self.appreciation_paid.contains_key(investor) {
            self.appreciation_paid
                .insert(investor.to_string(), appreciation);
        }
        if dividends > 0 {
            let claimed = self
                .dividends_claimed
                .entry(investor.to_string())
                .or_insert(0);
            *claimed += dividends;
        }

        Ok(total)
    }

    /// The two due components: (appreciation, dividends).
    fn due_parts(
        &self,
        terms: &PayoutTerms,
        investor: &str,
        contributed: u64,
        total_raised: u64,
        now: DateTime<Utc>,
    ) -> Result<(u64, u64), PayoutError> {
        if !terms.is_matured(now) {
            return Err(PayoutError::NotYetMatured {
                matures_at: terms.maturity_time,
                now,
            });
        }

        let appreciation = if terms.mode.includes_appreciation()
            && !self.appreciation_paid.contains_key(investor)
        {
            let scaled = contributed as u128 * terms.appreciation_permille as u128;
            u64::try_from(scaled / PERMILLE_BASE as u128)
                .map_err(|_| PayoutError::AmountOverflow)?
        } else {
            0
        };

        let dividends = if terms.mode.includes_dividends() && total_raised > 0 {
            let entitled = self.total_distributed as u128 * contributed as u128
                / total_raised as u128;
            let entitled = u64::try_from(entitled).map_err(|_| PayoutError::AmountOverflow)?;
            let already = self
                .dividends_claimed
                .get(investor)
                .copied()
                .unwrap_or(0);
            entitled.saturating_sub(already)
        } else {
            0
        };

        Ok((appreciation, dividends))
    }

    /// Total recorded across all distribution events.
    pub fn total_distributed(&self) -> u64 {
        self.total_distributed
    }

    /// Number of distribution events recorded so far.
    pub fn distribution_count(&self) -> u32 {
        self.distribution_count
    }

    /// Distribution events still available under the terms.
    pub fn distributions_remaining(&self, terms: &PayoutTerms) -> u32 {
        terms.max_distributions.saturating_sub(self.distribution_count)
    }

    /// Appreciation already paid to `investor`, if any.
    pub fn appreciation_paid_to(&self, investor: &str) -> Option<u64> {
        self.appreciation_paid.get(investor).copied()
    }

    /// Dividends already claimed by `investor`.
    pub fn dividends_claimed_by(&self, investor: &str) -> u64 {
        self.dividends_claimed.get(investor).copied().unwrap_or(0)
    }
}
