//! # Covault Campaign Vault Contracts
//!
//! The accounting and authorization engine behind Covault's crowdfunding
//! campaigns. A campaign vault accepts deposits of an underlying asset in
//! exchange for shares at a fixed price, enforces a funding cap and
//! per-investor limits inside a contribution window, and pays investors
//! out after maturity under a configurable regime:
//!
//! - **Funding Ledger** — contribution accounting: per-investor totals,
//!   share issuance, window / minimum / maximum / cap enforcement.
//! - **Signature Authorizer** — the relayer rail: deposits submitted on an
//!   investor's behalf under an off-chain Ed25519 authorization, with fee
//!   deduction and nonce/deadline replay protection.
//! - **Payout Scheduler** — post-maturity bookkeeping for capital
//!   appreciation, counted dividend distributions, or both.
//! - **Campaign Vault** — the orchestrator and only externally exposed
//!   surface; owns all state and drives the Open → Closed → Matured
//!   lifecycle.
//! - **Vault Factory** — instantiates and records vaults, binding an
//!   admin per instance.
//!
//! ## Design Principles
//!
//! 1. All monetary operations check for overflow — `checked_add`,
//!    `checked_sub`, and u128 widening everywhere, because wrapping
//!    arithmetic and money do not mix.
//! 2. State transitions are explicit: enum variants, not boolean flags.
//! 3. Every rejection is a distinct, machine-checkable error kind, and a
//!    rejected call mutates nothing.
//! 4. Time is injected: every time-dependent operation takes the caller's
//!    `now`, so the core never reads a clock.
//! 5. Every public type is serializable (serde) for wire transport and
//!    persistent storage.

pub mod authorizer;
pub mod factory;
pub mod funding;
pub mod payout;
pub mod vault;
