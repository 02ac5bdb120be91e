//! Fairbet - Provably-Fair Bet Settlement Service
//!
//! The settlement core of a gambling platform: derives cryptographically
//! verifiable outcomes from (server seed, client seed, nonce) triples,
//! applies them to account balances under per-principal transactional
//! isolation, and persists an immutable, independently verifiable bet
//! record for every settlement.

pub mod api;
pub mod config;
pub mod errors;
pub mod fairness;
pub mod games;
pub mod ledger;
pub mod metrics;
pub mod verify;

pub use config::FairbetConfig;
pub use errors::{CoreError, CoreResult};
pub use games::types::{BetRecord, CoinSide, DiceBetType, GameParams, GameType, SettledBet};
pub use ledger::settlement::SettlementEngine;
pub use ledger::store::LedgerStore;
pub use verify::{verify_bet, VerificationReport};
