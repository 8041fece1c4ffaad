//! # Funding Ledger
//!
//! Contribution accounting for a campaign vault: who deposited how much,
//! how many shares that issued, and whether the next deposit is allowed
//! at all. The ledger enforces the contribution window, the per-investor
//! minimum and maximum, and the funding cap.
//!
//! ## Validate / Apply Split
//!
//! Accepting a deposit involves an asset transfer the ledger does not
//! control, so the operation is split in two:
//!
//! 1. [`validate_deposit`](FundingLedger::validate_deposit) checks every
//!    precondition against current state and returns a [`PlannedDeposit`]
//!    without mutating anything.
//! 2. [`apply_deposit`](FundingLedger::apply_deposit) commits a plan that
//!    validated. It cannot fail — every arithmetic bound was already
//!    proven by validation, and the vault serializes calls, so state
//!    cannot shift between the two steps.
//!
//! The vault runs the asset `transfer_from` between the two, which is
//! what makes a failed transfer leave the ledger untouched.
//!
//! ## Share Pricing
//!
//! Shares are issued at the fixed configured price:
//! `shares = amount * AMOUNT_SCALE / token_price`, truncated toward zero.
//! No bonding curve, no oracle. A sub-share remainder is not minted, but
//! it stays inside the investor's recorded contribution — and every
//! payout formula is computed from contributions, so truncation never
//! costs an investor payout weight.

use chrono::{DateTime, Utc};
use covault_core::config::AMOUNT_SCALE;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can reject a deposit at the ledger level.
#[derive(Debug, Error)]
pub enum FundingError {
    /// The deposit arrived before the window opened or after it closed.
    #[error("outside contribution window: open {opens_at} to {closes_at}, now {now}")]
    OutsideContributionWindow {
        /// When the window opens.
        opens_at: DateTime<Utc>,
        /// When the window closes.
        closes_at: DateTime<Utc>,
        /// The rejected call's timestamp.
        now: DateTime<Utc>,
    },

    /// Zero-amount deposits are a no-op and almost certainly a caller bug.
    #[error("zero-amount deposits are not permitted")]
    ZeroAmount,

    /// A first-time investor must deposit at least the configured minimum.
    #[error("below minimum investment: minimum {minimum}, attempted {attempted}")]
    BelowMinimumInvestment {
        /// The configured minimum first deposit.
        minimum: u64,
        /// Amount the investor tried to deposit.
        attempted: u64,
    },

    /// The deposit would push the investor past the per-investor limit.
    #[error(
        "exceeds maximum investment: limit {limit}, already contributed {contributed}, attempted {attempted}"
    )]
    ExceedsMaxInvestment {
        /// The configured per-investor limit.
        limit: u64,
        /// What this investor has contributed so far.
        contributed: u64,
        /// Amount the investor tried to add.
        attempted: u64,
    },

    /// The deposit would push the raise past the funding goal.
    #[error("exceeds funding goal: goal {goal}, raised {raised}, attempted {attempted}")]
    ExceedsFundingGoal {
        /// The configured funding cap.
        goal: u64,
        /// Total raised so far.
        raised: u64,
        /// Amount that was rejected.
        attempted: u64,
    },

    /// Share issuance arithmetic would overflow.
    #[error("amount overflow: operation would exceed representable limits")]
    AmountOverflow,
}

// ---------------------------------------------------------------------------
// Terms
// ---------------------------------------------------------------------------

/// The funding-side parameters of a campaign, fixed at initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingTerms {
    /// Maximum total amount the vault will accept (the cap).
    pub goal: u64,
    /// Minimum first deposit per investor. Top-ups may be smaller.
    pub min_investment: u64,
    /// Maximum cumulative contribution per investor.
    pub max_investment: u64,
    /// When the contribution window opens.
    pub start_time: DateTime<Utc>,
    /// When the contribution window closes.
    pub end_time: DateTime<Utc>,
    /// Asset units per whole share, in smallest-unit denomination.
    pub token_price: u64,
}

impl FundingTerms {
    /// Shares issued for a deposit of `amount`, truncated toward zero.
    ///
    /// Returns `None` when the price is zero (malformed terms) or the
    /// result does not fit in u64.
    pub fn shares_for(&self, amount: u64) -> Option<u64> {
        if self.token_price == 0 {
            return None;
        }
        let scaled = (amount as u128).checked_mul(AMOUNT_SCALE as u128)?;
        u64::try_from(scaled / self.token_price as u128).ok()
    }

    /// Returns `true` if `now` falls inside the contribution window
    /// (inclusive on both ends).
    pub fn window_contains(&self, now: DateTime<Utc>) -> bool {
        now >= self.start_time && now <= self.end_time
    }
}

// ---------------------------------------------------------------------------
// Investor
// ---------------------------------------------------------------------------

/// One investor's position, created on first deposit and never removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investor {
    /// Cumulative amount contributed, in smallest units.
    ///
    /// Invariant: never exceeds the configured maximum investment.
    pub contributed: u64,
    /// Cumulative shares held, in smallest share units.
    pub shares: u64,
    /// When this investor first deposited.
    pub first_deposit_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// PlannedDeposit
// ---------------------------------------------------------------------------

/// A deposit that passed validation and is ready to commit.
///
/// Produced by [`FundingLedger::validate_deposit`]; consumed by
/// [`FundingLedger::apply_deposit`] after the asset transfer succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedDeposit {
    /// Address of the investor to credit.
    pub investor: String,
    /// Amount to credit, in smallest units.
    pub amount: u64,
    /// Shares the deposit will issue.
    pub shares: u64,
}

// ---------------------------------------------------------------------------
// FundingLedger
// ---------------------------------------------------------------------------

/// Tracks cumulative funds raised, per-investor totals, and share
/// issuance for one campaign vault.
///
/// Exclusively owned and mutated by the vault; nothing else holds a
/// mutable handle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FundingLedger {
    /// Total accepted across all investors.
    ///
    /// Invariant: never exceeds the funding goal.
    total_raised: u64,
    /// Total shares issued across all investors.
    total_shares: u64,
    /// Positions keyed by investor address.
    investors: HashMap<String, Investor>,
}

impl FundingLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks every deposit precondition without mutating state.
    ///
    /// The checks run cheapest-first and each failure is a distinct error
    /// kind:
    ///
    /// 1. Window — `now` inside `[start_time, end_time]`.
    /// 2. Amount — non-zero.
    /// 3. Minimum — first-time investors must meet `min_investment`.
    /// 4. Per-investor limit — cumulative contribution stays within
    ///    `max_investment`.
    /// 5. Cap — the raise stays within `goal`.
    /// 6. Share arithmetic — issuance fits in u64.
    pub fn validate_deposit(
        &self,
        terms: &FundingTerms,
        investor: &str,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Result<PlannedDeposit, FundingError> {
        if !terms.window_contains(now) {
            return Err(FundingError::OutsideContributionWindow {
                opens_at: terms.start_time,
                closes_at: terms.end_time,
                now,
            });
        }

        if amount == 0 {
            return Err(FundingError::ZeroAmount);
        }

        let contributed = self
            .investors
            .get(investor)
            .map(|i| i.contributed)
            .unwrap_or(0);

        // The minimum binds the first deposit only — an investor already
        // in the book may top up below it.
        if contributed == 0 && amount < terms.min_investment {
            return Err(FundingError::BelowMinimumInvestment {
                minimum: terms.min_investment,
                attempted: amount,
            });
        }

        let new_contributed = contributed
            .checked_add(amount)
            .ok_or(FundingError::AmountOverflow)?;
        if new_contributed > terms.max_investment {
            return Err(FundingError::ExceedsMaxInvestment {
                limit: terms.max_investment,
                contributed,
                attempted: amount,
            });
        }

        let new_raised = self
            .total_raised
            .checked_add(amount)
            .ok_or(FundingError::AmountOverflow)?;
        if new_raised > terms.goal {
            return Err(FundingError::ExceedsFundingGoal {
                goal: terms.goal,
                raised: self.total_raised,
                attempted: amount,
            });
        }

        let shares = terms
            .shares_for(amount)
            .ok_or(FundingError::AmountOverflow)?;

        // Prove the cumulative share counters fit too, so apply_deposit
        // can commit without a failure path.
        self.total_shares
            .checked_add(shares)
            .ok_or(FundingError::AmountOverflow)?;
        self.investors
            .get(investor)
            .map(|i| i.shares)
            .unwrap_or(0)
            .checked_add(shares)
            .ok_or(FundingError::AmountOverflow)?;

        Ok(PlannedDeposit {
            investor: investor.to_string(),
            amount,
            shares,
        })
    }

    /// Commits a validated deposit.
    ///
    /// Must be called with a plan produced by
    /// [`validate_deposit`](Self::validate_deposit) against the current
    /// state — the vault serializes calls, so nothing can have shifted in
    /// between, and every bound was already proven.
    pub fn apply_deposit(&mut self, plan: &PlannedDeposit, now: DateTime<Utc>) {
        let entry = self
            .investors
            .entry(plan.investor.clone())
            .or_insert(Investor {
                contributed: 0,
                shares: 0,
                first_deposit_at: now,
            });
        entry.contributed += plan.amount;
        entry.shares += plan.shares;

        self.total_raised += plan.amount;
        self.total_shares += plan.shares;
    }

    /// Returns `true` once the raise has hit the goal exactly.
    ///
    /// The vault uses this to early-close the round on the deposit that
    /// fills the cap.
    pub fn cap_reached(&self, terms: &FundingTerms) -> bool {
        self.total_raised == terms.goal
    }

    /// Total accepted so far.
    pub fn total_raised(&self) -> u64 {
        self.total_raised
    }

    /// Total shares issued so far.
    pub fn total_shares(&self) -> u64 {
        self.total_shares
    }

    /// Capacity left before the cap, given the terms.
    pub fn remaining_capacity(&self, terms: &FundingTerms) -> u64 {
        terms.goal.saturating_sub(self.total_raised)
    }

    /// Cumulative contribution of `investor`, or 0.
    pub fn contributed(&self, investor: &str) -> u64 {
        self.investors
            .get(investor)
            .map(|i| i.contributed)
            .unwrap_or(0)
    }

    /// Shares held by `investor`, or 0.
    pub fn shares_of(&self, investor: &str) -> u64 {
        self.investors.get(investor).map(|i| i.shares).unwrap_or(0)
    }

    /// Number of distinct investors in the book.
    pub fn investor_count(&self) -> usize {
        self.investors.len()
    }

    /// Iterates all positions as `(address, position)` pairs.
    pub fn positions(&self) -> impl Iterator<Item = (&String, &Investor)> {
        self.investors.iter()
    }
}
