//! # REST API
//!
//! Builds the axum router that exposes the platform node's HTTP
//! interface. All endpoints share application state through axum's
//! `State` extractor; the vault registry and the dev asset ledger sit
//! behind one `parking_lot::RwLock`, which is what serializes compound
//! operations (asset transfer + ledger commit) per request.
//!
//! ## Endpoints
//!
//! | Method | Path                              | Description                       |
//! |--------|-----------------------------------|-----------------------------------|
//! | GET    | `/health`                         | Liveness probe                    |
//! | GET    | `/status`                         | Node status summary               |
//! | GET    | `/vaults`                         | List registered vaults            |
//! | POST   | `/vaults`                         | Create a vault                    |
//! | GET    | `/vaults/:id`                     | Vault detail                      |
//! | POST   | `/vaults/:id/deposit`             | Direct deposit                    |
//! | POST   | `/vaults/:id/deposit-authorized`  | Relayer deposit                   |
//! | POST   | `/vaults/:id/close`               | Admin close                       |
//! | POST   | `/vaults/:id/finalize`            | Finalize maturity                 |
//! | POST   | `/vaults/:id/claim`               | Claim payout                      |
//! | POST   | `/vaults/:id/distributions`       | Record a dividend distribution    |
//! | POST   | `/asset/mint`                     | Dev faucet: mint asset            |
//! | POST   | `/asset/approve`                  | Set an allowance                  |
//! | GET    | `/asset/balances/:address`        | Asset balance                     |

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use covault_contracts::authorizer::DepositAuthorization;
use covault_contracts::factory::{FactoryError, VaultFactory};
use covault_contracts::funding::FundingTerms;
use covault_contracts::payout::{PayoutMode, PayoutTerms};
use covault_contracts::vault::{CampaignVault, VaultConfig, VaultError};
use covault_core::asset::{AssetToken, TokenLedger};
use covault_core::crypto::keys::{CovaultPublicKey, CovaultSignature};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// The mutable platform state: vault registry plus the dev asset ledger.
///
/// One lock over both, on purpose — a deposit touches the asset and the
/// vault in one indivisible sequence.
pub struct Platform {
    /// Vault registry.
    pub factory: VaultFactory,
    /// The dev-mode asset token ledger.
    pub asset: TokenLedger,
    /// Operator address: asset admin/minter and default vault admin.
    pub operator: String,
}

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything mutable behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// Chain name (e.g., "devnet").
    pub chain: String,
    /// Chain identifier bound into authorization digests.
    pub chain_id: u32,
    /// Default designated signer for newly created vaults.
    pub signer_public_key: CovaultPublicKey,
    /// Registry + asset ledger behind one lock.
    pub platform: Arc<RwLock<Platform>>,
    /// Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and
/// tracing, ready to be served on the configured RPC port.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/vaults", get(list_vaults_handler).post(create_vault_handler))
        .route("/vaults/:id", get(vault_detail_handler))
        .route("/vaults/:id/deposit", post(deposit_handler))
        .route("/vaults/:id/deposit-authorized", post(authorized_deposit_handler))
        .route("/vaults/:id/close", post(close_handler))
        .route("/vaults/:id/finalize", post(finalize_handler))
        .route("/vaults/:id/claim", post(claim_handler))
        .route("/vaults/:id/distributions", post(distribution_handler))
        .route("/asset/mint", post(mint_handler))
        .route("/asset/approve", post(approve_handler))
        .route("/asset/balances/:address", get(balance_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Request body for `POST /vaults`.
#[derive(Debug, Deserialize)]
pub struct CreateVaultRequest {
    /// Vault admin address. Defaults to the platform operator.
    pub admin: Option<String>,
    /// Designated signer public key (hex). Defaults to the node's signer.
    pub signer: Option<String>,
    pub share_name: String,
    pub share_symbol: String,
    pub goal: u64,
    pub min_investment: u64,
    pub max_investment: u64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub token_price: u64,
    /// Payout mode code: 0 = appreciation, 1 = dividends, 2 = both.
    pub payout_type: u8,
    pub maturity_time: DateTime<Utc>,
    pub appreciation_permille: u32,
    pub max_distributions: u32,
}

/// Response body for `POST /vaults`.
#[derive(Debug, Serialize)]
pub struct CreateVaultResponse {
    pub vault_id: String,
}

/// One row of `GET /vaults`.
#[derive(Debug, Serialize)]
pub struct VaultSummary {
    pub vault_id: String,
    pub share_name: String,
    pub share_symbol: String,
    pub phase: String,
    pub total_raised: u64,
    pub goal: u64,
    pub investor_count: usize,
}

/// Response body for `GET /vaults/:id`.
#[derive(Debug, Serialize)]
pub struct VaultDetail {
    pub vault_id: String,
    pub share_name: String,
    pub share_symbol: String,
    pub asset_symbol: String,
    pub admin: String,
    pub phase: String,
    pub total_raised: u64,
    pub total_shares: u64,
    pub remaining_capacity: u64,
    pub investor_count: usize,
    pub fees_accrued: u64,
    pub goal: u64,
    pub min_investment: u64,
    pub max_investment: u64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub token_price: u64,
    pub payout_type: u8,
    pub maturity_time: DateTime<Utc>,
    pub total_distributed: u64,
    pub distribution_count: u32,
    /// BLAKE3 fingerprint of the vault's configuration, for deployment
    /// verification.
    pub config_fingerprint: String,
}

/// Request body for `POST /vaults/:id/deposit`.
#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub investor: String,
    pub amount: u64,
}

/// Request body for `POST /vaults/:id/deposit-authorized`.
#[derive(Debug, Deserialize)]
pub struct AuthorizedDepositRequest {
    pub beneficiary: String,
    pub amount: u64,
    pub fee: u64,
    pub nonce: u64,
    pub deadline: DateTime<Utc>,
    /// Hex-encoded Ed25519 signature from the designated signer.
    pub signature: String,
}

/// Response body for both deposit endpoints.
#[derive(Debug, Serialize)]
pub struct DepositResponse {
    pub shares: u64,
    pub total_raised: u64,
    pub phase: String,
}

/// Request body for `POST /vaults/:id/close`.
#[derive(Debug, Deserialize)]
pub struct CloseRequest {
    pub caller: String,
}

/// Request body for `POST /vaults/:id/claim`.
#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub investor: String,
}

/// Response body for `POST /vaults/:id/claim`.
#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub paid: u64,
}

/// Request body for `POST /vaults/:id/distributions`.
#[derive(Debug, Deserialize)]
pub struct DistributionRequest {
    pub caller: String,
    pub amount: u64,
}

/// Request body for `POST /asset/mint` (dev faucet).
#[derive(Debug, Deserialize)]
pub struct MintRequest {
    pub to: String,
    pub amount: u64,
}

/// Request body for `POST /asset/approve`.
#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub owner: String,
    pub spender: String,
    pub amount: u64,
}

/// Response body for `GET /asset/balances/:address`.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: u64,
}

/// Response payload for `GET /status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub chain: String,
    pub vault_count: usize,
    pub timestamp: String,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn reject(status: StatusCode, message: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

/// Maps a contract-layer rejection to an HTTP status.
///
/// Not-found is 404, permission problems are 403, replays are 409, and
/// every other precondition failure is a plain 400 with the error's
/// Display text — the distinct kinds live in the message, the API does
/// not re-encode the whole taxonomy.
fn vault_error(err: VaultError) -> ApiError {
    use covault_contracts::authorizer::AuthorizationError;
    let status = match &err {
        VaultError::Unauthorized { .. } => StatusCode::FORBIDDEN,
        VaultError::Authorization(AuthorizationError::NonceReplayed { .. }) => {
            StatusCode::CONFLICT
        }
        _ => StatusCode::BAD_REQUEST,
    };
    reject(status, err)
}

fn factory_error(err: FactoryError) -> ApiError {
    match err {
        FactoryError::VaultNotFound(_) => reject(StatusCode::NOT_FOUND, err),
        FactoryError::Vault(inner) => vault_error(inner),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the node is alive.
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `GET /status` — node status summary.
async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let platform = state.platform.read();
    Json(StatusResponse {
        version: state.version.clone(),
        chain: state.chain.clone(),
        vault_count: platform.factory.vault_count(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// `POST /vaults` — creates and registers a campaign vault.
async fn create_vault_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateVaultRequest>,
) -> Result<Json<CreateVaultResponse>, ApiError> {
    let mode = PayoutMode::from_code(req.payout_type).ok_or_else(|| {
        reject(
            StatusCode::BAD_REQUEST,
            format!("unknown payout type code: {}", req.payout_type),
        )
    })?;

    let signer = match &req.signer {
        Some(hex_key) => CovaultPublicKey::from_hex(hex_key)
            .map_err(|e| reject(StatusCode::BAD_REQUEST, e))?,
        None => state.signer_public_key.clone(),
    };

    let mut platform = state.platform.write();
    let admin = req.admin.unwrap_or_else(|| platform.operator.clone());
    let asset_symbol = platform.asset.symbol().to_string();

    let config = VaultConfig {
        admin,
        signer,
        share_name: req.share_name,
        share_symbol: req.share_symbol,
        asset_symbol,
        chain_id: state.chain_id,
        funding: FundingTerms {
            goal: req.goal,
            min_investment: req.min_investment,
            max_investment: req.max_investment,
            start_time: req.start_time,
            end_time: req.end_time,
            token_price: req.token_price,
        },
        payout: PayoutTerms {
            mode,
            maturity_time: req.maturity_time,
            appreciation_permille: req.appreciation_permille,
            max_distributions: req.max_distributions,
        },
    };

    let fingerprint = config.fingerprint();
    let vault_id = platform
        .factory
        .create_vault(config)
        .map_err(factory_error)?;

    state.metrics.vaults_created_total.inc();
    state
        .metrics
        .registered_vaults
        .set(platform.factory.vault_count() as i64);
    tracing::info!(vault_id = %vault_id, config_fingerprint = %fingerprint, "vault created");

    Ok(Json(CreateVaultResponse { vault_id }))
}

/// `GET /vaults` — lists registered vaults.
async fn list_vaults_handler(State(state): State<AppState>) -> Json<Vec<VaultSummary>> {
    let platform = state.platform.read();
    let mut rows: Vec<VaultSummary> = platform
        .factory
        .vaults()
        .filter_map(|(id, vault)| summarize(id, vault))
        .collect();
    rows.sort_by(|a, b| a.vault_id.cmp(&b.vault_id));
    Json(rows)
}

fn summarize(vault_id: &str, vault: &CampaignVault) -> Option<VaultSummary> {
    let config = vault.config().ok()?;
    Some(VaultSummary {
        vault_id: vault_id.to_string(),
        share_name: config.share_name.clone(),
        share_symbol: config.share_symbol.clone(),
        phase: vault.phase().ok()?.to_string(),
        total_raised: vault.total_raised().ok()?,
        goal: config.funding.goal,
        investor_count: vault.investor_count().ok()?,
    })
}

/// `GET /vaults/:id` — full vault detail.
async fn vault_detail_handler(
    State(state): State<AppState>,
    Path(vault_id): Path<String>,
) -> Result<Json<VaultDetail>, ApiError> {
    let platform = state.platform.read();
    let vault = platform.factory.get(&vault_id).map_err(factory_error)?;
    let config = vault.config().map_err(vault_error)?;

    Ok(Json(VaultDetail {
        vault_id: vault_id.clone(),
        share_name: config.share_name.clone(),
        share_symbol: config.share_symbol.clone(),
        asset_symbol: config.asset_symbol.clone(),
        admin: config.admin.clone(),
        phase: vault.phase().map_err(vault_error)?.to_string(),
        total_raised: vault.total_raised().map_err(vault_error)?,
        total_shares: vault.total_shares().map_err(vault_error)?,
        remaining_capacity: vault.remaining_capacity().map_err(vault_error)?,
        investor_count: vault.investor_count().map_err(vault_error)?,
        fees_accrued: vault.fees_accrued().map_err(vault_error)?,
        goal: config.funding.goal,
        min_investment: config.funding.min_investment,
        max_investment: config.funding.max_investment,
        start_time: config.funding.start_time,
        end_time: config.funding.end_time,
        token_price: config.funding.token_price,
        payout_type: config.payout.mode.code(),
        maturity_time: config.payout.maturity_time,
        total_distributed: vault.total_distributed().map_err(vault_error)?,
        distribution_count: vault.distribution_count().map_err(vault_error)?,
        config_fingerprint: config.fingerprint(),
    }))
}

/// `POST /vaults/:id/deposit` — direct deposit.
async fn deposit_handler(
    State(state): State<AppState>,
    Path(vault_id): Path<String>,
    Json(req): Json<DepositRequest>,
) -> Result<Json<DepositResponse>, ApiError> {
    let timer = state.metrics.deposit_latency_seconds.start_timer();
    let mut platform = state.platform.write();
    let Platform { factory, asset, .. } = &mut *platform;
    let vault = factory.get_mut(&vault_id).map_err(factory_error)?;

    let result = vault.deposit(asset, &req.investor, req.amount, Utc::now());
    timer.observe_duration();

    match result {
        Ok(shares) => {
            state.metrics.deposits_total.inc();
            tracing::info!(
                vault_id = %vault_id,
                investor = %req.investor,
                amount = req.amount,
                shares,
                "deposit accepted"
            );
            Ok(Json(DepositResponse {
                shares,
                total_raised: vault.total_raised().map_err(vault_error)?,
                phase: vault.phase().map_err(vault_error)?.to_string(),
            }))
        }
        Err(err) => {
            state.metrics.deposits_rejected_total.inc();
            tracing::warn!(vault_id = %vault_id, investor = %req.investor, %err, "deposit rejected");
            Err(vault_error(err))
        }
    }
}

/// `POST /vaults/:id/deposit-authorized` — relayer deposit under a
/// signed authorization.
async fn authorized_deposit_handler(
    State(state): State<AppState>,
    Path(vault_id): Path<String>,
    Json(req): Json<AuthorizedDepositRequest>,
) -> Result<Json<DepositResponse>, ApiError> {
    let signature = CovaultSignature::from_hex(&req.signature)
        .map_err(|e| reject(StatusCode::BAD_REQUEST, format!("malformed signature: {}", e)))?;
    let auth = DepositAuthorization {
        beneficiary: req.beneficiary.clone(),
        amount: req.amount,
        fee: req.fee,
        nonce: req.nonce,
        deadline: req.deadline,
        signature,
    };

    let timer = state.metrics.deposit_latency_seconds.start_timer();
    let mut platform = state.platform.write();
    let Platform { factory, asset, .. } = &mut *platform;
    let vault = factory.get_mut(&vault_id).map_err(factory_error)?;

    let result = vault.deposit_with_authorization(asset, &auth, req.amount, Utc::now());
    timer.observe_duration();

    match result {
        Ok(shares) => {
            state.metrics.deposits_total.inc();
            state.metrics.authorized_deposits_total.inc();
            tracing::info!(
                vault_id = %vault_id,
                beneficiary = %req.beneficiary,
                amount = req.amount,
                fee = req.fee,
                nonce = req.nonce,
                shares,
                "authorized deposit accepted"
            );
            Ok(Json(DepositResponse {
                shares,
                total_raised: vault.total_raised().map_err(vault_error)?,
                phase: vault.phase().map_err(vault_error)?.to_string(),
            }))
        }
        Err(err) => {
            state.metrics.deposits_rejected_total.inc();
            tracing::warn!(
                vault_id = %vault_id,
                beneficiary = %req.beneficiary,
                nonce = req.nonce,
                %err,
                "authorized deposit rejected"
            );
            Err(vault_error(err))
        }
    }
}

/// `POST /vaults/:id/close` — admin close.
async fn close_handler(
    State(state): State<AppState>,
    Path(vault_id): Path<String>,
    Json(req): Json<CloseRequest>,
) -> Result<StatusCode, ApiError> {
    let mut platform = state.platform.write();
    let vault = platform.factory.get_mut(&vault_id).map_err(factory_error)?;
    vault.close(&req.caller, Utc::now()).map_err(vault_error)?;
    tracing::info!(vault_id = %vault_id, caller = %req.caller, "vault closed");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /vaults/:id/finalize` — finalize maturity. Callable by anyone.
async fn finalize_handler(
    State(state): State<AppState>,
    Path(vault_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut platform = state.platform.write();
    let vault = platform.factory.get_mut(&vault_id).map_err(factory_error)?;
    vault.finalize_maturity(Utc::now()).map_err(vault_error)?;
    tracing::info!(vault_id = %vault_id, "vault matured");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /vaults/:id/claim` — pay out what the investor is owed.
async fn claim_handler(
    State(state): State<AppState>,
    Path(vault_id): Path<String>,
    Json(req): Json<ClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let mut platform = state.platform.write();
    let Platform { factory, asset, .. } = &mut *platform;
    let vault = factory.get_mut(&vault_id).map_err(factory_error)?;

    let paid = vault
        .claim(asset, &req.investor, Utc::now())
        .map_err(vault_error)?;
    state.metrics.claims_total.inc();
    tracing::info!(vault_id = %vault_id, investor = %req.investor, paid, "claim paid");
    Ok(Json(ClaimResponse { paid }))
}

/// `POST /vaults/:id/distributions` — record a dividend distribution.
async fn distribution_handler(
    State(state): State<AppState>,
    Path(vault_id): Path<String>,
    Json(req): Json<DistributionRequest>,
) -> Result<StatusCode, ApiError> {
    let mut platform = state.platform.write();
    let Platform { factory, asset, .. } = &mut *platform;
    let vault = factory.get_mut(&vault_id).map_err(factory_error)?;

    vault
        .record_distribution(asset, &req.caller, req.amount)
        .map_err(vault_error)?;
    state.metrics.distributions_total.inc();
    tracing::info!(vault_id = %vault_id, amount = req.amount, "distribution recorded");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /asset/mint` — dev faucet. The node mints as the operator.
async fn mint_handler(
    State(state): State<AppState>,
    Json(req): Json<MintRequest>,
) -> Result<StatusCode, ApiError> {
    let mut platform = state.platform.write();
    let operator = platform.operator.clone();
    platform
        .asset
        .mint(&operator, &req.to, req.amount)
        .map_err(|e| reject(StatusCode::BAD_REQUEST, e))?;
    tracing::info!(to = %req.to, amount = req.amount, "asset minted");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /asset/approve` — set an allowance on the dev asset ledger.
///
/// Dev mode has no transaction signatures, so the owner field is taken
/// at its word. Do not expose this node to anything you don't trust.
async fn approve_handler(
    State(state): State<AppState>,
    Json(req): Json<ApproveRequest>,
) -> StatusCode {
    let mut platform = state.platform.write();
    platform.asset.approve(&req.owner, &req.spender, req.amount);
    StatusCode::NO_CONTENT
}

/// `GET /asset/balances/:address` — asset balance lookup.
async fn balance_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Json<BalanceResponse> {
    let platform = state.platform.read();
    Json(BalanceResponse {
        balance: platform.asset.balance_of(&address),
        address,
    })
}
