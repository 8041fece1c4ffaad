//! # Asset Token Collaborator
//!
//! The underlying asset a vault raises is an external fungible token. The
//! vault core never owns it — it consumes a narrow capability interface
//! ([`AssetToken`]): check a balance, check an allowance, move funds that
//! were explicitly approved. Deep permission logic (who may mint, who may
//! grant roles) belongs entirely to the token's own access-control model
//! and never leaks into vault decisions.
//!
//! [`TokenLedger`] is the in-memory implementation used by tests and by
//! the node's dev mode: balances, allowances, and role-gated minting,
//! with checked arithmetic on every mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by the asset collaborator.
///
/// The vault propagates these untouched — an asset rejection aborts the
/// surrounding vault call before any vault state has been mutated.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Zero-amount operations are a no-op and almost certainly a caller bug.
    #[error("zero-amount asset operations are not permitted")]
    ZeroAmount,

    /// The holder does not have enough balance.
    #[error("insufficient balance: account holds {balance}, tried to move {requested}")]
    InsufficientBalance {
        /// Current balance of the account.
        balance: u64,
        /// Amount the caller tried to move.
        requested: u64,
    },

    /// The spender's allowance from the owner does not cover the amount.
    #[error("insufficient allowance: spender approved for {allowance}, tried to move {requested}")]
    InsufficientAllowance {
        /// Current allowance granted to the spender.
        allowance: u64,
        /// Amount the spender tried to move.
        requested: u64,
    },

    /// The caller lacks the role required for this operation.
    #[error("missing role: {address} does not hold {role:?}")]
    MissingRole {
        /// Address that attempted the operation.
        address: String,
        /// The role that would have been required.
        role: Role,
    },

    /// Minting this amount would overflow the total supply.
    #[error("supply overflow: minting {amount} would exceed u64::MAX")]
    SupplyOverflow {
        /// The amount that was attempted.
        amount: u64,
    },
}

// ---------------------------------------------------------------------------
// Capability Interface
// ---------------------------------------------------------------------------

/// The slice of a fungible token a vault is allowed to touch.
///
/// Modeled as a capability trait, not an inheritance relationship: the
/// vault receives `&mut dyn AssetToken` per call and can do exactly four
/// things with it. Everything role-gated stays behind the concrete type.
pub trait AssetToken {
    /// Ticker symbol of the token (e.g., "BUSD").
    fn symbol(&self) -> &str;

    /// Balance of `address`, or 0 for unknown accounts.
    fn balance_of(&self, address: &str) -> u64;

    /// Remaining allowance `owner` has granted to `spender`.
    fn allowance(&self, owner: &str, spender: &str) -> u64;

    /// Moves `amount` from `from` to `to`.
    fn transfer(&mut self, from: &str, to: &str, amount: u64) -> Result<(), AssetError>;

    /// Moves `amount` from `owner` to `to`, spending `spender`'s
    /// allowance. This is how a vault pulls an approved deposit.
    fn transfer_from(
        &mut self,
        spender: &str,
        owner: &str,
        to: &str,
        amount: u64,
    ) -> Result<(), AssetError>;
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Access-control roles on the token ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// May create new supply via [`TokenLedger::mint`].
    Minter,
}

// ---------------------------------------------------------------------------
// TokenLedger
// ---------------------------------------------------------------------------

/// In-memory fungible token with allowances and role-gated minting.
///
/// The shape mirrors the standard fungible-token contract the platform
/// deploys alongside its vaults: a role admin set at construction,
/// minters granted explicitly, and allowance bookkeeping that a spender
/// draws down with `transfer_from`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenLedger {
    /// Human-readable token name (e.g., "Mock BUSD").
    name: String,
    /// Ticker symbol.
    symbol: String,
    /// Address that administers roles. Set once at construction.
    admin: String,
    /// Current total supply in smallest units.
    total_supply: u64,
    /// Per-address balances.
    balances: HashMap<String, u64>,
    /// Allowances: owner -> (spender -> remaining amount).
    allowances: HashMap<String, HashMap<String, u64>>,
    /// Addresses holding [`Role::Minter`].
    minters: HashSet<String>,
    /// When this ledger was created.
    created_at: DateTime<Utc>,
}

impl TokenLedger {
    /// Creates a new token with zero supply.
    ///
    /// The admin administers roles but holds none itself — minting
    /// requires an explicit [`grant_role`](Self::grant_role), even for
    /// the admin.
    pub fn new(name: &str, symbol: &str, admin: &str) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            admin: admin.to_string(),
            total_supply: 0,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            minters: HashSet::new(),
            created_at: Utc::now(),
        }
    }

    /// Returns the token name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the role admin's address.
    pub fn admin(&self) -> &str {
        &self.admin
    }

    /// Returns the current total supply.
    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    /// Returns when this ledger was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Grants `role` to `grantee`. Only the admin may grant roles.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::MissingRole`] if `caller` is not the admin.
    pub fn grant_role(&mut self, caller: &str, role: Role, grantee: &str) -> Result<(), AssetError> {
        if caller != self.admin {
            return Err(AssetError::MissingRole {
                address: caller.to_string(),
                role,
            });
        }
        match role {
            Role::Minter => self.minters.insert(grantee.to_string()),
        };
        Ok(())
    }

    /// Returns `true` if `address` holds `role`.
    pub fn has_role(&self, address: &str, role: Role) -> bool {
        match role {
            Role::Minter => self.minters.contains(address),
        }
    }

    /// Mints `amount` new tokens to `to`. Caller must hold `Minter`.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::MissingRole`] if the caller is not a minter,
    /// [`AssetError::ZeroAmount`] for zero mints, and
    /// [`AssetError::SupplyOverflow`] if supply would overflow u64.
    pub fn mint(&mut self, caller: &str, to: &str, amount: u64) -> Result<(), AssetError> {
        if !self.minters.contains(caller) {
            return Err(AssetError::MissingRole {
                address: caller.to_string(),
                role: Role::Minter,
            });
        }
        if amount == 0 {
            return Err(AssetError::ZeroAmount);
        }

        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(AssetError::SupplyOverflow { amount })?;

        let balance = self.balances.entry(to.to_string()).or_insert(0);
        // Cannot overflow: the supply check above bounds every balance.
        *balance += amount;

        Ok(())
    }

    /// Sets the allowance `owner` grants to `spender`.
    ///
    /// Overwrites any previous allowance, matching the approve semantics
    /// of standard fungible tokens. Approving 0 revokes.
    pub fn approve(&mut self, owner: &str, spender: &str, amount: u64) {
        self.allowances
            .entry(owner.to_string())
            .or_default()
            .insert(spender.to_string(), amount);
    }

    /// Moves `amount` between balances after a balance check.
    fn move_balance(&mut self, from: &str, to: &str, amount: u64) -> Result<(), AssetError> {
        if amount == 0 {
            return Err(AssetError::ZeroAmount);
        }

        let from_balance = self.balances.get(from).copied().unwrap_or(0);
        if from_balance < amount {
            return Err(AssetError::InsufficientBalance {
                balance: from_balance,
                requested: amount,
            });
        }

        self.balances.insert(from.to_string(), from_balance - amount);
        let to_balance = self.balances.entry(to.to_string()).or_insert(0);
        // Cannot overflow: total supply is bounded by u64 and conserved.
        *to_balance += amount;

        Ok(())
    }
}

impl AssetToken for TokenLedger {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn balance_of(&self, address: &str) -> u64 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &str, spender: &str) -> u64 {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(&mut self, from: &str, to: &str, amount: u64) -> Result<(), AssetError> {
        self.move_balance(from, to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: &str,
        owner: &str,
        to: &str,
        amount: u64,
    ) -> Result<(), AssetError> {
        let allowance = self.allowance(owner, spender);
        if allowance < amount {
            return Err(AssetError::InsufficientAllowance {
                allowance,
                requested: amount,
            });
        }

        // Balance check happens inside move_balance, BEFORE the allowance
        // is drawn down — a failed transfer must leave the allowance
        // untouched.
        self.move_balance(owner, to, amount)?;

        self.allowances
            .get_mut(owner)
            .expect("allowance entry exists: checked above")
            .insert(spender.to_string(), allowance - amount);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: &str = "admin";
    const MINTER: &str = "minter";
    const ALICE: &str = "alice";
    const BOB: &str = "bob";
    const VAULT: &str = "vault-1";

    fn funded_ledger() -> TokenLedger {
        let mut token = TokenLedger::new("Mock BUSD", "BUSD", ADMIN);
        token.grant_role(ADMIN, Role::Minter, MINTER).unwrap();
        token.mint(MINTER, ALICE, 1_000_000).unwrap();
        token
    }

    #[test]
    fn new_ledger_is_empty() {
        let token = TokenLedger::new("Mock BUSD", "BUSD", ADMIN);
        assert_eq!(token.symbol(), "BUSD");
        assert_eq!(token.total_supply(), 0);
        assert_eq!(token.balance_of(ALICE), 0);
    }

    #[test]
    fn mint_requires_role() {
        let mut token = TokenLedger::new("Mock BUSD", "BUSD", ADMIN);
        // Even the admin can't mint without the role.
        let result = token.mint(ADMIN, ALICE, 100);
        assert!(matches!(result, Err(AssetError::MissingRole { .. })));
    }

    #[test]
    fn grant_role_requires_admin() {
        let mut token = TokenLedger::new("Mock BUSD", "BUSD", ADMIN);
        let result = token.grant_role(ALICE, Role::Minter, ALICE);
        assert!(matches!(result, Err(AssetError::MissingRole { .. })));
        assert!(!token.has_role(ALICE, Role::Minter));
    }

    #[test]
    fn mint_credits_balance_and_supply() {
        let token = funded_ledger();
        assert_eq!(token.balance_of(ALICE), 1_000_000);
        assert_eq!(token.total_supply(), 1_000_000);
    }

    #[test]
    fn transfer_moves_balance() {
        let mut token = funded_ledger();
        token.transfer(ALICE, BOB, 400_000).unwrap();
        assert_eq!(token.balance_of(ALICE), 600_000);
        assert_eq!(token.balance_of(BOB), 400_000);
        // Supply is conserved.
        assert_eq!(token.total_supply(), 1_000_000);
    }

    #[test]
    fn transfer_insufficient_balance_rejected() {
        let mut token = funded_ledger();
        let result = token.transfer(BOB, ALICE, 1);
        assert!(matches!(
            result,
            Err(AssetError::InsufficientBalance { balance: 0, requested: 1 })
        ));
    }

    #[test]
    fn transfer_zero_rejected() {
        let mut token = funded_ledger();
        assert!(matches!(
            token.transfer(ALICE, BOB, 0),
            Err(AssetError::ZeroAmount)
        ));
    }

    #[test]
    fn transfer_from_spends_allowance() {
        let mut token = funded_ledger();
        token.approve(ALICE, VAULT, 500_000);

        token.transfer_from(VAULT, ALICE, VAULT, 300_000).unwrap();
        assert_eq!(token.balance_of(ALICE), 700_000);
        assert_eq!(token.balance_of(VAULT), 300_000);
        assert_eq!(token.allowance(ALICE, VAULT), 200_000);
    }

    #[test]
    fn transfer_from_without_allowance_rejected() {
        let mut token = funded_ledger();
        let result = token.transfer_from(VAULT, ALICE, VAULT, 100);
        assert!(matches!(
            result,
            Err(AssetError::InsufficientAllowance { allowance: 0, .. })
        ));
        assert_eq!(token.balance_of(ALICE), 1_000_000);
    }

    #[test]
    fn failed_transfer_from_preserves_allowance() {
        let mut token = funded_ledger();
        // Allowance larger than balance: the balance check fires, and the
        // allowance must not be drawn down.
        token.approve(ALICE, VAULT, 2_000_000);
        let result = token.transfer_from(VAULT, ALICE, VAULT, 1_500_000);
        assert!(matches!(result, Err(AssetError::InsufficientBalance { .. })));
        assert_eq!(token.allowance(ALICE, VAULT), 2_000_000);
        assert_eq!(token.balance_of(ALICE), 1_000_000);
    }

    #[test]
    fn approve_overwrites() {
        let mut token = funded_ledger();
        token.approve(ALICE, VAULT, 500);
        token.approve(ALICE, VAULT, 200);
        assert_eq!(token.allowance(ALICE, VAULT), 200);
        token.approve(ALICE, VAULT, 0);
        assert_eq!(token.allowance(ALICE, VAULT), 0);
    }

    #[test]
    fn supply_overflow_rejected() {
        let mut token = TokenLedger::new("Mock BUSD", "BUSD", ADMIN);
        token.grant_role(ADMIN, Role::Minter, MINTER).unwrap();
        token.mint(MINTER, ALICE, u64::MAX).unwrap();
        let result = token.mint(MINTER, BOB, 1);
        assert!(matches!(result, Err(AssetError::SupplyOverflow { amount: 1 })));
    }

    #[test]
    fn ledger_serialization_roundtrip() {
        let mut token = funded_ledger();
        token.approve(ALICE, VAULT, 123);

        let json = serde_json::to_string(&token).expect("serialize");
        let restored: TokenLedger = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(restored.balance_of(ALICE), 1_000_000);
        assert_eq!(restored.allowance(ALICE, VAULT), 123);
        assert!(restored.has_role(MINTER, Role::Minter));
    }
}
