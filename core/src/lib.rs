// Copyright (c) 2026 Covault Contributors. MIT License.
// See LICENSE for details.

//! # Covault — Core Library
//!
//! Shared foundation for the Covault crowdfunding vault platform. Campaign
//! vaults raise an underlying asset against issued shares; this crate holds
//! everything the contract layer and the node have in common:
//!
//! - **crypto** — Ed25519 keys and signatures, SHA-256 and BLAKE3 hashing.
//!   The designated-signer rail (relayer-submitted deposits authorized
//!   off-chain) lives or dies by these primitives.
//! - **asset** — the fungible asset-token collaborator: the narrow
//!   capability interface a vault consumes (`balance_of`, `allowance`,
//!   `transfer_from`) plus an in-memory ledger with role-gated minting for
//!   tests and dev deployments.
//! - **config** — protocol constants: chain identifiers, amount scaling,
//!   signature lengths. Every magic number lives here and nowhere else.
//!
//! ## Design Philosophy
//!
//! 1. All amounts are `u64` in smallest-unit denomination. No floats near
//!    money, ever.
//! 2. Arithmetic on balances is checked. Wrapping addition and funding caps
//!    do not mix.
//! 3. No unsafe code in crypto paths.
//! 4. Every public state type is serializable for persistence and transport.

pub mod asset;
pub mod config;
pub mod crypto;
