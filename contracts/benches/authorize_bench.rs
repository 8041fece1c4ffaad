// Authorization benchmarks for the Covault relayer rail.
//
// Covers digest construction, full authorization validation (the
// per-deposit hot path on the signed route), and signing on the tooling
// side for comparison.

use chrono::{Duration, Utc};
use criterion::{criterion_group, criterion_main, Criterion};

use covault_contracts::authorizer::{
    authorization_digest, DepositAuthorization, SignatureAuthorizer,
};
use covault_core::config::CHAIN_ID_DEVNET;
use covault_core::crypto::keys::CovaultKeypair;

const VAULT_ID: &str = "vault-bench-0001";
const ASSET: &str = "BUSD";

fn bench_digest(c: &mut Criterion) {
    let deadline = Utc::now() + Duration::hours(1);
    c.bench_function("authorize/digest", |b| {
        b.iter(|| {
            authorization_digest(
                VAULT_ID,
                "beneficiary-public-key-hex",
                ASSET,
                1_000_000_000,
                25_000_000,
                CHAIN_ID_DEVNET,
                42,
                deadline,
            )
        });
    });
}

fn bench_sign_authorization(c: &mut Criterion) {
    let signer = CovaultKeypair::generate();
    let deadline = Utc::now() + Duration::hours(1);

    c.bench_function("authorize/sign", |b| {
        b.iter(|| {
            DepositAuthorization::sign(
                &signer,
                VAULT_ID,
                ASSET,
                CHAIN_ID_DEVNET,
                "beneficiary-public-key-hex",
                1_000_000_000,
                25_000_000,
                42,
                deadline,
            )
        });
    });
}

fn bench_validate_authorization(c: &mut Criterion) {
    let signer = CovaultKeypair::generate();
    let authorizer = SignatureAuthorizer::new(signer.public_key(), VAULT_ID, ASSET, CHAIN_ID_DEVNET);
    let auth = DepositAuthorization::sign(
        &signer,
        VAULT_ID,
        ASSET,
        CHAIN_ID_DEVNET,
        "beneficiary-public-key-hex",
        1_000_000_000,
        25_000_000,
        42,
        Utc::now() + Duration::hours(1),
    );
    let now = Utc::now();

    c.bench_function("authorize/validate", |b| {
        b.iter(|| authorizer.validate(&auth, now).unwrap());
    });
}

criterion_group!(
    benches,
    bench_digest,
    bench_sign_authorization,
    bench_validate_authorization
);
criterion_main!(benches);
