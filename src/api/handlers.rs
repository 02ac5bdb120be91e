//! Request Handlers
//!
//! Thin adapters between the HTTP surface and the settlement core:
//! decode the game-specific request shape, hand it to the settlement
//! engine, shape the result. Settlement runs on the blocking pool; it
//! holds row locks and may retry.

use super::{errors::ApiError, middleware::RequestId, models::*};
use crate::games::types::GameParams;
use crate::ledger::settlement::SettlementEngine;
use crate::ledger::store::LedgerStore;
use crate::metrics::MetricsRegistry;
use crate::verify;
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state
pub struct AppState {
    pub store: Arc<LedgerStore>,
    pub engine: Arc<SettlementEngine>,
    pub metrics: Arc<MetricsRegistry>,
    pub version: String,
}

/// Health check handler - minimal response time
/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
        version: state.version.clone(),
    })
}

/// Play dice
/// POST /api/dice/play
pub async fn play_dice(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<DicePlayRequest>,
) -> Result<Json<BetResponse>, ApiError> {
    let amount = decimal_to_cents(request.amount, "amount")
        .map_err(|e| reject(&state, ApiError::from_core(request_id.0.clone(), e)))?;
    let target = decimal_to_hundredths(request.target, "target")
        .map_err(|e| reject(&state, ApiError::from_core(request_id.0.clone(), e)))?;

    let params = GameParams::Dice {
        bet_type: request.bet_type,
        target,
    };
    settle(
        state,
        request_id,
        request.principal_id,
        amount,
        params,
        request.client_seed,
    )
    .await
}

/// Play coin flip
/// POST /api/flip/play
pub async fn play_flip(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<FlipPlayRequest>,
) -> Result<Json<BetResponse>, ApiError> {
    let amount = decimal_to_cents(request.amount, "amount")
        .map_err(|e| reject(&state, ApiError::from_core(request_id.0.clone(), e)))?;

    let params = GameParams::Flip { side: request.side };
    settle(
        state,
        request_id,
        request.principal_id,
        amount,
        params,
        request.client_seed,
    )
    .await
}

/// Run one settlement on the blocking pool and shape the outcome.
async fn settle(
    state: Arc<AppState>,
    request_id: RequestId,
    principal_id: String,
    amount: u64,
    params: GameParams,
    client_seed: Option<String>,
) -> Result<Json<BetResponse>, ApiError> {
    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || {
        engine.settle(&principal_id, amount, params, client_seed)
    })
    .await
    .map_err(|e| {
        ApiError::internal(request_id.0.clone(), format!("Settlement task failed: {}", e))
    })?;

    match result {
        Ok(settled) => {
            state
                .metrics
                .record_settlement(settled.record.amount, settled.record.payout, settled.record.won);
            Ok(Json(BetResponse::from_record(
                &settled.record,
                Some(settled.new_balance),
            )))
        }
        Err(e) => {
            let api_error = ApiError::from_core(request_id.0, e);
            if api_error.is_rejection() {
                state.metrics.record_rejection();
            } else if matches!(api_error.kind, super::errors::ApiErrorKind::Conflict(_)) {
                state.metrics.record_conflict();
            }
            Err(api_error)
        }
    }
}

fn reject(state: &AppState, error: ApiError) -> ApiError {
    state.metrics.record_rejection();
    error
}

fn parse_bet_id(request_id: &RequestId, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        ApiError::bad_request(request_id.0.clone(), format!("Invalid bet id: {}", raw))
    })
}

/// Look up a persisted bet record
/// GET /api/bet/:bet_id
pub async fn get_bet(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(bet_id): Path<String>,
) -> Result<Json<BetResponse>, ApiError> {
    let bet_id = parse_bet_id(&request_id, &bet_id)?;
    let record = state
        .store
        .get_bet(&bet_id)
        .map_err(|e| ApiError::from_core(request_id.0.clone(), e))?
        .ok_or_else(|| ApiError::not_found(request_id.0.clone(), format!("Bet {} not found", bet_id)))?;
    Ok(Json(BetResponse::from_record(&record, None)))
}

/// Independently verify a persisted bet
/// GET /api/verify/:bet_id
pub async fn verify_bet_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(bet_id): Path<String>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let bet_id = parse_bet_id(&request_id, &bet_id)?;
    let record = state
        .store
        .get_bet(&bet_id)
        .map_err(|e| ApiError::from_core(request_id.0.clone(), e))?
        .ok_or_else(|| ApiError::not_found(request_id.0.clone(), format!("Bet {} not found", bet_id)))?;

    let report = verify::verify_bet(&record);
    if !report.is_valid() {
        tracing::error!(
            bet_id = %bet_id,
            seed_hash_valid = report.seed_hash_valid,
            matches_stored = report.matches_stored,
            payout_consistent = report.payout_consistent,
            "Bet failed verification"
        );
    }

    Ok(Json(VerifyResponse {
        bet_id,
        seed_hash_valid: report.seed_hash_valid,
        recomputed_result: report.recomputed_result(),
        matches_stored: report.matches_stored,
        payout_consistent: report.payout_consistent,
        valid: report.is_valid(),
    }))
}

/// Account balance view
/// GET /api/account/:id
pub async fn get_account(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(principal_id): Path<String>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state
        .store
        .get_account(&principal_id)
        .map_err(|e| ApiError::from_core(request_id.0.clone(), e))?
        .ok_or_else(|| {
            ApiError::not_found(
                request_id.0.clone(),
                format!("Account {} not found", principal_id),
            )
        })?;
    Ok(Json(account.into()))
}

/// Create an account (ops surface; identity/auth is external)
/// POST /api/account
pub async fn create_account_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let initial_balance = if request.initial_balance == 0.0 {
        0
    } else {
        decimal_to_cents(request.initial_balance, "initial_balance")
            .map_err(|e| ApiError::from_core(request_id.0.clone(), e))?
    };

    let account = state
        .store
        .create_account(&request.id, initial_balance, request.is_admin)
        .map_err(|e| ApiError::from_core(request_id.0, e))?;
    Ok(Json(account.into()))
}

/// Credit an account
/// POST /api/account/:id/deposit
pub async fn deposit_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(principal_id): Path<String>,
    Json(request): Json<DepositRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let amount = decimal_to_cents(request.amount, "amount")
        .map_err(|e| ApiError::from_core(request_id.0.clone(), e))?;
    let account = state
        .store
        .deposit(&principal_id, amount)
        .map_err(|e| ApiError::from_core(request_id.0, e))?;
    Ok(Json(account.into()))
}

/// Newest-first bet history with cursor pagination
/// GET /api/account/:id/bets?cursor={hex}&limit={n}
pub async fn bet_history_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(principal_id): Path<String>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let limit = params.limit.min(100);
    let (bets, next_cursor) = state
        .store
        .bet_history(&principal_id, params.cursor.as_deref(), limit)
        .map_err(|e| ApiError::from_core(request_id.0, e))?;

    Ok(Json(HistoryResponse {
        bets: bets
            .iter()
            .map(|record| BetResponse::from_record(record, None))
            .collect(),
        next_cursor,
    }))
}

/// Platform totals
/// GET /api/stats
pub async fn stats_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state
        .store
        .stats()
        .map_err(|e| ApiError::from_core(request_id.0, e))?;
    Ok(Json(stats.into()))
}

/// Prometheus metrics endpoint
/// GET /metrics
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> axum::response::Response {
    let body = state.metrics.to_prometheus_format();
    axum::response::Response::builder()
        .header("Content-Type", "text/plain; version=0.0.4; charset=utf-8")
        .body(body.into())
        .unwrap_or_else(|_| axum::response::Response::new("".into()))
}
