//! Route handlers.
//!
//! Handlers only translate between HTTP and the blockchain/events services:
//! they parse paths, queries and bodies, call one service method and wrap
//! the result. Validation of addresses and amounts lives in the services so
//! it runs before any remote call no matter who the caller is.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::blockchain::parse_tx_hash;
use crate::blockchain::reader::{RecordedTransfer, TokenDetails};
use crate::blockchain::types::{ConfirmationStatus, PendingTransfer};
use crate::error::GatewayError;
use crate::events::{AccountHistory, BlockRange, TransactionRecord};
use crate::http::response::{ApiError, ApiResult};
use crate::http::server::AppState;
use crate::numeric::{wire, TokenAmount};
use crate::observability::metrics;

/// Accept a JSON string as-is, or an integer that JSON carried exactly.
///
/// Floats (including integers too large for `u64`, which serde_json parses as
/// floats) are rejected rather than rounded.
pub fn amount_from_json(value: &Value) -> Result<String, GatewayError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => n.as_u64().map(|v| v.to_string()).ok_or_else(|| {
            GatewayError::InvalidAmount(format!(
                "{} is not an exact integer; send amounts as decimal strings",
                n
            ))
        }),
        other => Err(GatewayError::InvalidAmount(format!(
            "expected a decimal string, got {}",
            other
        ))),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub chain_reachable: bool,
    #[serde(
        with = "wire::option_safe_u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub block_number: Option<u64>,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let block = state.client.block_number().await;
    metrics::record_chain_health(block.is_ok());

    let (code, status) = match block {
        Ok(_) => (StatusCode::OK, "ok"),
        Err(ref e) => {
            tracing::warn!(error = %e, "Chain unreachable during health check");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded")
        }
    };
    let body = HealthStatus {
        status,
        version: env!("CARGO_PKG_VERSION"),
        chain_reachable: block.is_ok(),
        block_number: block.ok(),
    };
    (code, Json(body))
}

pub async fn token_details(State(state): State<AppState>) -> ApiResult<TokenDetails> {
    Ok(Json(state.reader.token_details().await?))
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: TokenAmount,
}

pub async fn balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ApiResult<BalanceResponse> {
    let balance = state.reader.balance_of(&address).await?;
    Ok(Json(BalanceResponse { address, balance }))
}

// A missing `to` or `amount` falls through to address or amount validation.
#[derive(Debug, Deserialize)]
pub struct TransferBody {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub amount: Value,
    #[serde(default)]
    pub message: String,
}

pub async fn transfer_with_details(
    State(state): State<AppState>,
    body: Result<Json<TransferBody>, JsonRejection>,
) -> ApiResult<PendingTransfer> {
    let Json(body) = body?;
    let amount = amount_from_json(&body.amount)?;
    let pending = state
        .pipeline
        .transfer_with_details(&body.to, &amount, &body.message)
        .await?;
    Ok(Json(pending))
}

#[derive(Debug, Deserialize)]
pub struct MintBody {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub amount: Value,
}

pub async fn mint(
    State(state): State<AppState>,
    body: Result<Json<MintBody>, JsonRejection>,
) -> ApiResult<PendingTransfer> {
    let Json(body) = body?;
    let amount = amount_from_json(&body.amount)?;
    Ok(Json(state.pipeline.mint(&body.to, &amount).await?))
}

#[derive(Debug, Deserialize)]
pub struct BurnBody {
    #[serde(default)]
    pub amount: Value,
}

pub async fn burn(
    State(state): State<AppState>,
    body: Result<Json<BurnBody>, JsonRejection>,
) -> ApiResult<PendingTransfer> {
    let Json(body) = body?;
    let amount = amount_from_json(&body.amount)?;
    Ok(Json(state.pipeline.burn(&amount).await?))
}

pub async fn recorded_by_index(State(state): State<AppState>) -> ApiResult<Vec<RecordedTransfer>> {
    Ok(Json(state.reader.recorded_transactions_by_index().await?))
}

pub async fn recorded_all(State(state): State<AppState>) -> ApiResult<Vec<RecordedTransfer>> {
    Ok(Json(state.reader.all_recorded_transactions().await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanParams {
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
}

pub async fn contract_transactions(
    State(state): State<AppState>,
    params: Result<Query<ScanParams>, QueryRejection>,
) -> ApiResult<Vec<TransactionRecord>> {
    let Query(params) = params?;
    let range = BlockRange::new(params.from_block, params.to_block);
    Ok(Json(state.aggregator.scan(range).await?))
}

pub async fn transaction_details(
    State(state): State<AppState>,
    Path(tx_hash): Path<String>,
) -> ApiResult<TransactionRecord> {
    let tx_hash = parse_tx_hash(&tx_hash)?;
    Ok(Json(state.aggregator.lookup(tx_hash).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationParams {
    pub timeout_secs: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationResponse {
    pub transaction_hash: String,
    #[serde(flatten)]
    pub status: ConfirmationStatus,
}

pub async fn confirmation(
    State(state): State<AppState>,
    Path(tx_hash): Path<String>,
    params: Result<Query<ConfirmationParams>, QueryRejection>,
) -> ApiResult<ConfirmationResponse> {
    let Query(params) = params?;
    let hash = parse_tx_hash(&tx_hash)?;
    let wait = params
        .timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(state.confirmation_wait)
        .min(state.max_confirmation_wait);

    let status = state.pipeline.await_confirmation(hash, wait).await?;
    Ok(Json(ConfirmationResponse {
        transaction_hash: hash.to_string(),
        status,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    pub to_block: Option<u64>,
}

pub async fn account_history(
    State(state): State<AppState>,
    Path(address): Path<String>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<AccountHistory>, ApiError> {
    let Query(params) = params?;
    Ok(Json(
        state
            .aggregator
            .account_history(&address, params.to_block)
            .await?,
    ))
}
