//! API Request/Response Models
//!
//! All wire types for the API endpoints. Externally visible amounts are
//! two-decimal values; conversion to and from the ledger's integer cents
//! happens here and nowhere else.

use crate::errors::{CoreError, CoreResult};
use crate::games::types::{BetRecord, CoinSide, DiceBetType, GameParams, GameType};
use crate::ledger::store::{AccountRecord, PlatformStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Largest accepted decimal amount: one trillion units keeps the cent
/// conversion well inside u64.
const MAX_DECIMAL_AMOUNT: f64 = 1e12;

/// Convert a caller-supplied decimal amount to cents.
pub fn decimal_to_cents(value: f64, field: &str) -> CoreResult<u64> {
    if !value.is_finite() || value <= 0.0 || value > MAX_DECIMAL_AMOUNT {
        return Err(CoreError::Validation(format!(
            "{} must be a positive amount, got {}",
            field, value
        )));
    }
    Ok((value * 100.0).round() as u64)
}

/// Convert a decimal percentage-domain value (e.g. a dice target) to
/// hundredths.
pub fn decimal_to_hundredths(value: f64, field: &str) -> CoreResult<u32> {
    if !value.is_finite() || value < 0.0 || value > 100.0 {
        return Err(CoreError::Validation(format!(
            "{} must be between 0.00 and 100.00, got {}",
            field, value
        )));
    }
    Ok((value * 100.0).round() as u32)
}

pub fn cents_to_decimal(cents: u64) -> f64 {
    cents as f64 / 100.0
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Dice play request
/// POST /api/dice/play
#[derive(Debug, Clone, Deserialize)]
pub struct DicePlayRequest {
    pub principal_id: String,
    pub amount: f64,
    pub bet_type: DiceBetType,
    pub target: f64,
    #[serde(default)]
    pub client_seed: Option<String>,
}

/// Coin flip play request
/// POST /api/flip/play
#[derive(Debug, Clone, Deserialize)]
pub struct FlipPlayRequest {
    pub principal_id: String,
    pub amount: f64,
    pub side: CoinSide,
    #[serde(default)]
    pub client_seed: Option<String>,
}

/// Settled bet / persisted bet record in API encoding. The raw server
/// seed is included: each seed is single-use, revealed at settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetResponse {
    pub bet_id: Uuid,
    pub principal_id: String,
    pub game_type: GameType,
    pub amount: f64,
    pub win_chance: f64,
    pub multiplier: f64,
    pub won: bool,
    pub payout: f64,
    /// Present on settlement responses; absent on record lookups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_balance: Option<f64>,
    pub result: f64,
    pub server_seed: String,
    pub server_seed_hash: String,
    pub client_seed: String,
    pub nonce: u64,
    pub params: GameParams,
    pub created_at: DateTime<Utc>,
}

impl BetResponse {
    pub fn from_record(record: &BetRecord, new_balance: Option<u64>) -> Self {
        Self {
            bet_id: record.id,
            principal_id: record.principal_id.clone(),
            game_type: record.game_type,
            amount: cents_to_decimal(record.amount),
            win_chance: f64::from(record.win_chance) / 100.0,
            multiplier: record.multiplier,
            won: record.won,
            payout: cents_to_decimal(record.payout),
            new_balance: new_balance.map(cents_to_decimal),
            result: record.result_value(),
            server_seed: record.server_seed.clone(),
            server_seed_hash: record.server_seed_hash.clone(),
            client_seed: record.client_seed.clone(),
            nonce: record.nonce,
            params: record.params,
            created_at: record.created_at,
        }
    }
}

/// Verification response
/// GET /api/verify/:bet_id
#[derive(Debug, Clone, Serialize)]
pub struct VerifyResponse {
    pub bet_id: Uuid,
    pub seed_hash_valid: bool,
    pub recomputed_result: f64,
    pub matches_stored: bool,
    pub payout_consistent: bool,
    pub valid: bool,
}

/// Account view
#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub balance: f64,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<AccountRecord> for AccountResponse {
    fn from(account: AccountRecord) -> Self {
        Self {
            id: account.id,
            balance: cents_to_decimal(account.balance),
            is_admin: account.is_admin,
            created_at: account.created_at,
        }
    }
}

/// Account creation request (ops surface; auth is external)
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccountRequest {
    pub id: String,
    #[serde(default)]
    pub initial_balance: f64,
    #[serde(default)]
    pub is_admin: bool,
}

/// Deposit request
#[derive(Debug, Clone, Deserialize)]
pub struct DepositRequest {
    pub amount: f64,
}

/// Bet history query parameters
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_history_limit() -> usize {
    20
}

/// Paginated bet history
#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub bets: Vec<BetResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Platform totals
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub total_wagered: f64,
    pub total_paid_out: f64,
    pub bet_count: u64,
}

impl From<PlatformStats> for StatsResponse {
    fn from(stats: PlatformStats) -> Self {
        Self {
            total_wagered: cents_to_decimal(stats.total_wagered),
            total_paid_out: cents_to_decimal(stats.total_paid_out),
            bet_count: stats.bet_count,
        }
    }
}
