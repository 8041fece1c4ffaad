//! Integration tests for the campaign vault lifecycle.
//!
//! These tests exercise full campaigns across module boundaries,
//! simulating real-world flows: factory creation, deposits against a
//! live asset ledger, cap-triggered and admin closes, maturity
//! finalization, and payout claims under each mode.

use chrono::{DateTime, Duration, Utc};
use covault_contracts::factory::VaultFactory;
use covault_contracts::funding::{FundingError, FundingTerms};
use covault_contracts::payout::{PayoutError, PayoutMode, PayoutTerms};
use covault_contracts::vault::{VaultConfig, VaultError, VaultPhase};
use covault_core::asset::{AssetToken, Role, TokenLedger};
use covault_core::config::CHAIN_ID_DEVNET;
use covault_core::crypto::keys::CovaultKeypair;

const ADMIN: &str = "admin-pk";
const ALICE: &str = "alice-pk";
const BOB: &str = "bob-pk";

/// One whole asset unit in smallest-unit denomination.
const UNIT: u64 = 100_000_000;

/// Helper: a standard campaign config — 1000-unit goal, 1-unit minimum,
/// 0.1 price, 50% appreciation at maturity in 60 days.
fn campaign_config(signer: &CovaultKeypair, mode: PayoutMode, now: DateTime<Utc>) -> VaultConfig {
    VaultConfig {
        admin: ADMIN.to_string(),
        signer: signer.public_key(),
        share_name: "Harbor Fund One".to_string(),
        share_symbol: "HBR1".to_string(),
        asset_symbol: "BUSD".to_string(),
        chain_id: CHAIN_ID_DEVNET,
        funding: FundingTerms {
            goal: 1_000 * UNIT,
            min_investment: UNIT,
            max_investment: 1_000 * UNIT,
            start_time: now - Duration::hours(1),
            end_time: now + Duration::days(30),
            token_price: UNIT / 10,
        },
        payout: PayoutTerms {
            mode,
            maturity_time: now + Duration::days(60),
            appreciation_permille: 500,
            max_distributions: 4,
        },
    }
}

/// Helper: a token ledger with minted-and-approved holders for `vault_id`.
fn funded_token(vault_id: &str, holders: &[(&str, u64)]) -> TokenLedger {
    let mut token = TokenLedger::new("Mock BUSD", "BUSD", ADMIN);
    token.grant_role(ADMIN, Role::Minter, ADMIN).unwrap();
    for (holder, amount) in holders {
        token.mint(ADMIN, holder, *amount).unwrap();
        token.approve(holder, vault_id, *amount);
    }
    token
}

// ---------------------------------------------------------------------------
// Happy Path
// ---------------------------------------------------------------------------

#[test]
fn full_campaign_capital_appreciation() {
    let signer = CovaultKeypair::generate();
    let now = Utc::now();
    let mut factory = VaultFactory::new("operator");
    let vault_id = factory
        .create_vault(campaign_config(&signer, PayoutMode::CapitalAppreciation, now))
        .unwrap();
    let mut token = funded_token(&vault_id, &[(ALICE, 10 * UNIT)]);

    // 1. Deposit: 10 units at 0.1 per share -> 100 shares.
    let vault = factory.get_mut(&vault_id).unwrap();
    let shares = vault.deposit(&mut token, ALICE, 10 * UNIT, now).unwrap();
    assert_eq!(shares, 100 * UNIT);
    assert_eq!(vault.total_raised().unwrap(), 10 * UNIT);

    // 2. Admin closes the round.
    vault.close(ADMIN, now).unwrap();
    assert_eq!(vault.phase().unwrap(), VaultPhase::Closed);

    // 3. Finalize at maturity — callable by anyone.
    let after_maturity = now + Duration::days(61);
    vault.finalize_maturity(after_maturity).unwrap();
    assert_eq!(vault.phase().unwrap(), VaultPhase::Matured);

    // 4. Claim: 10 units at 500 permille -> 5 units, paid from the
    //    vault's balance once the admin tops it up.
    token.mint(ADMIN, &vault_id, 5 * UNIT).unwrap();
    let paid = vault.claim(&mut token, ALICE, after_maturity).unwrap();
    assert_eq!(paid, 5 * UNIT);
    assert_eq!(token.balance_of(ALICE), 5 * UNIT);
}

#[test]
fn deposits_accumulate_across_investors() {
    let signer = CovaultKeypair::generate();
    let now = Utc::now();
    let mut factory = VaultFactory::new("operator");
    let vault_id = factory
        .create_vault(campaign_config(&signer, PayoutMode::CapitalAppreciation, now))
        .unwrap();
    let mut token = funded_token(&vault_id, &[(ALICE, 50 * UNIT), (BOB, 20 * UNIT)]);

    let vault = factory.get_mut(&vault_id).unwrap();
    vault.deposit(&mut token, ALICE, 10 * UNIT, now).unwrap();
    vault.deposit(&mut token, BOB, 20 * UNIT, now).unwrap();
    vault.deposit(&mut token, ALICE, 5 * UNIT, now).unwrap();

    assert_eq!(vault.total_raised().unwrap(), 35 * UNIT);
    assert_eq!(vault.contributed_of(ALICE).unwrap(), 15 * UNIT);
    assert_eq!(vault.contributed_of(BOB).unwrap(), 20 * UNIT);
    assert_eq!(vault.investor_count().unwrap(), 2);
    assert_eq!(token.balance_of(&vault_id), 35 * UNIT);
}

// ---------------------------------------------------------------------------
// Cap & Limit Enforcement
// ---------------------------------------------------------------------------

#[test]
fn cap_race_admits_exactly_one_of_two_oversized_deposits() {
    let signer = CovaultKeypair::generate();
    let now = Utc::now();
    let mut factory = VaultFactory::new("operator");
    let vault_id = factory
        .create_vault(campaign_config(&signer, PayoutMode::CapitalAppreciation, now))
        .unwrap();
    let mut token = funded_token(&vault_id, &[(ALICE, 600 * UNIT), (BOB, 600 * UNIT)]);

    // Two 600-unit deposits against a 1000-unit goal, in arbitrary
    // order: exactly one succeeds, the other fails whole.
    let vault = factory.get_mut(&vault_id).unwrap();
    vault.deposit(&mut token, BOB, 600 * UNIT, now).unwrap();
    let result = vault.deposit(&mut token, ALICE, 600 * UNIT, now);
    assert!(matches!(
        result,
        Err(VaultError::Funding(FundingError::ExceedsFundingGoal { .. }))
    ));
    assert_eq!(vault.total_raised().unwrap(), 600 * UNIT);
    // Alice's tokens never moved.
    assert_eq!(token.balance_of(ALICE), 600 * UNIT);

    // A reduced amount (<= the remaining 400) succeeds.
    vault.deposit(&mut token, ALICE, 400 * UNIT, now).unwrap();
    assert_eq!(vault.total_raised().unwrap(), 1_000 * UNIT);
    // Filling the cap closed the round.
    assert_eq!(vault.phase().unwrap(), VaultPhase::Closed);
}

#[test]
fn per_investor_limit_is_cumulative() {
    let signer = CovaultKeypair::generate();
    let now = Utc::now();
    let mut config = campaign_config(&signer, PayoutMode::CapitalAppreciation, now);
    config.funding.max_investment = 15 * UNIT;

    let mut factory = VaultFactory::new("operator");
    let vault_id = factory.create_vault(config).unwrap();
    let mut token = funded_token(&vault_id, &[(ALICE, 100 * UNIT)]);

    let vault = factory.get_mut(&vault_id).unwrap();
    vault.deposit(&mut token, ALICE, 10 * UNIT, now).unwrap();
    let result = vault.deposit(&mut token, ALICE, 6 * UNIT, now);
    assert!(matches!(
        result,
        Err(VaultError::Funding(FundingError::ExceedsMaxInvestment { .. }))
    ));
    // Prior balance unchanged by the rejection.
    assert_eq!(vault.contributed_of(ALICE).unwrap(), 10 * UNIT);

    vault.deposit(&mut token, ALICE, 5 * UNIT, now).unwrap();
    assert_eq!(vault.contributed_of(ALICE).unwrap(), 15 * UNIT);
}

#[test]
fn window_is_enforced_regardless_of_cap_headroom() {
    let signer = CovaultKeypair::generate();
    let now = Utc::now();
    let mut config = campaign_config(&signer, PayoutMode::CapitalAppreciation, now);
    config.funding.start_time = now - Duration::days(10);
    config.funding.end_time = now - Duration::days(1);
    config.payout.maturity_time = now + Duration::days(60);

    let mut factory = VaultFactory::new("operator");
    let vault_id = factory.create_vault(config).unwrap();
    let mut token = funded_token(&vault_id, &[(ALICE, 10 * UNIT)]);

    // The vault is Open with the full cap available, but the window is
    // over.
    let vault = factory.get_mut(&vault_id).unwrap();
    let result = vault.deposit(&mut token, ALICE, 10 * UNIT, now);
    assert!(matches!(
        result,
        Err(VaultError::Funding(FundingError::OutsideContributionWindow { .. }))
    ));
}

#[test]
fn first_deposit_minimum_applies_only_once() {
    let signer = CovaultKeypair::generate();
    let now = Utc::now();
    let mut factory = VaultFactory::new("operator");
    let vault_id = factory
        .create_vault(campaign_config(&signer, PayoutMode::CapitalAppreciation, now))
        .unwrap();
    let mut token = funded_token(&vault_id, &[(ALICE, 10 * UNIT)]);

    let vault = factory.get_mut(&vault_id).unwrap();
    let result = vault.deposit(&mut token, ALICE, UNIT / 2, now);
    assert!(matches!(
        result,
        Err(VaultError::Funding(FundingError::BelowMinimumInvestment { .. }))
    ));

    vault.deposit(&mut token, ALICE, UNIT, now).unwrap();
    // Top-ups below the minimum are fine once in the book.
    vault.deposit(&mut token, ALICE, UNIT / 2, now).unwrap();
    assert_eq!(vault.contributed_of(ALICE).unwrap(), UNIT + UNIT / 2);
}

// ---------------------------------------------------------------------------
// Payout Modes
// ---------------------------------------------------------------------------

#[test]
fn dividends_flow_with_distribution_limit() {
    let signer = CovaultKeypair::generate();
    let now = Utc::now();
    let mut config = campaign_config(&signer, PayoutMode::Dividends, now);
    config.payout.max_distributions = 2;

    let mut factory = VaultFactory::new("operator");
    let vault_id = factory.create_vault(config).unwrap();
    let mut token = funded_token(&vault_id, &[(ALICE, 10 * UNIT), (BOB, 30 * UNIT)]);

    let vault = factory.get_mut(&vault_id).unwrap();
    vault.deposit(&mut token, ALICE, 10 * UNIT, now).unwrap();
    vault.deposit(&mut token, BOB, 30 * UNIT, now).unwrap();
    vault.close(ADMIN, now).unwrap();

    // Fund and record two distributions of 20 units each.
    token.mint(ADMIN, ADMIN, 40 * UNIT).unwrap();
    token.approve(ADMIN, &vault_id, 40 * UNIT);
    vault.record_distribution(&mut token, ADMIN, 20 * UNIT).unwrap();
    vault.record_distribution(&mut token, ADMIN, 20 * UNIT).unwrap();

    // The third hits the configured limit.
    let result = vault.record_distribution(&mut token, ADMIN, 20 * UNIT);
    assert!(matches!(
        result,
        Err(VaultError::Payout(PayoutError::DistributionLimitReached { limit: 2 }))
    ));

    // Claims split the 40-unit pool 10:30.
    let after_maturity = now + Duration::days(61);
    assert_eq!(vault.claim(&mut token, ALICE, after_maturity).unwrap(), 10 * UNIT);
    assert_eq!(vault.claim(&mut token, BOB, after_maturity).unwrap(), 30 * UNIT);
}

#[test]
fn both_mode_pays_appreciation_plus_dividends() {
    let signer = CovaultKeypair::generate();
    let now = Utc::now();
    let mut factory = VaultFactory::new("operator");
    let vault_id = factory
        .create_vault(campaign_config(&signer, PayoutMode::Both, now))
        .unwrap();
    let mut token = funded_token(&vault_id, &[(ALICE, 10 * UNIT)]);

    let vault = factory.get_mut(&vault_id).unwrap();
    vault.deposit(&mut token, ALICE, 10 * UNIT, now).unwrap();
    vault.close(ADMIN, now).unwrap();

    // Alice is the whole raise, so a 4-unit pool is all hers, on top of
    // the 5-unit appreciation.
    token.mint(ADMIN, ADMIN, 4 * UNIT).unwrap();
    token.approve(ADMIN, &vault_id, 4 * UNIT);
    vault.record_distribution(&mut token, ADMIN, 4 * UNIT).unwrap();
    token.mint(ADMIN, &vault_id, 5 * UNIT).unwrap();

    let after_maturity = now + Duration::days(61);
    assert_eq!(vault.claimable(ALICE, after_maturity).unwrap(), 9 * UNIT);
    assert_eq!(vault.claim(&mut token, ALICE, after_maturity).unwrap(), 9 * UNIT);
}

#[test]
fn claims_rejected_until_maturity() {
    let signer = CovaultKeypair::generate();
    let now = Utc::now();
    let mut factory = VaultFactory::new("operator");
    let vault_id = factory
        .create_vault(campaign_config(&signer, PayoutMode::CapitalAppreciation, now))
        .unwrap();
    let mut token = funded_token(&vault_id, &[(ALICE, 10 * UNIT)]);

    let vault = factory.get_mut(&vault_id).unwrap();
    vault.deposit(&mut token, ALICE, 10 * UNIT, now).unwrap();
    vault.close(ADMIN, now).unwrap();

    // Closed but not matured: both finalize and claim are premature.
    assert!(matches!(
        vault.finalize_maturity(now),
        Err(VaultError::Payout(PayoutError::NotYetMatured { .. }))
    ));
    assert!(matches!(
        vault.claim(&mut token, ALICE, now),
        Err(VaultError::Payout(PayoutError::NotYetMatured { .. }))
    ));
}

#[test]
fn claim_performs_lazy_maturity_transition() {
    let signer = CovaultKeypair::generate();
    let now = Utc::now();
    let mut factory = VaultFactory::new("operator");
    let vault_id = factory
        .create_vault(campaign_config(&signer, PayoutMode::CapitalAppreciation, now))
        .unwrap();
    let mut token = funded_token(&vault_id, &[(ALICE, 10 * UNIT)]);

    let vault = factory.get_mut(&vault_id).unwrap();
    vault.deposit(&mut token, ALICE, 10 * UNIT, now).unwrap();
    vault.close(ADMIN, now).unwrap();
    token.mint(ADMIN, &vault_id, 5 * UNIT).unwrap();

    // No explicit finalize: the first post-maturity claim transitions.
    let after_maturity = now + Duration::days(61);
    vault.claim(&mut token, ALICE, after_maturity).unwrap();
    assert_eq!(vault.phase().unwrap(), VaultPhase::Matured);
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

#[test]
fn mid_campaign_snapshot_roundtrip() {
    let signer = CovaultKeypair::generate();
    let now = Utc::now();
    let mut factory = VaultFactory::new("operator");
    let vault_id = factory
        .create_vault(campaign_config(&signer, PayoutMode::Both, now))
        .unwrap();
    let mut token = funded_token(&vault_id, &[(ALICE, 10 * UNIT)]);
    factory
        .get_mut(&vault_id)
        .unwrap()
        .deposit(&mut token, ALICE, 10 * UNIT, now)
        .unwrap();

    // A new logic version resuming the persisted registry sees the same
    // book.
    let json = serde_json::to_string(&factory).expect("serialize");
    let restored: VaultFactory = serde_json::from_str(&json).expect("deserialize");

    let vault = restored.get(&vault_id).unwrap();
    assert_eq!(vault.total_raised().unwrap(), 10 * UNIT);
    assert_eq!(vault.shares_of(ALICE).unwrap(), 100 * UNIT);
    assert_eq!(restored.vault_count(), 1);
}
