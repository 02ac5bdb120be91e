//! Bet settlement: the atomic read-check-mutate-record unit.
//!
//! One settlement is one pessimistic transaction: lock the account row,
//! re-check the balance, advance the nonce, derive the outcome, apply the
//! payout, and persist the immutable bet record, committing everything
//! together. Lock conflicts retry the whole unit a bounded number of
//! times; any other failure rolls back with nothing written.

use crate::config::GameConfig;
use crate::errors::{CoreError, CoreResult};
use crate::fairness;
use crate::games::rules;
use crate::games::types::{BetRecord, GameParams, SettledBet};
use crate::ledger::store::LedgerStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub struct SettlementEngine {
    store: Arc<LedgerStore>,
    config: GameConfig,
}

impl SettlementEngine {
    pub fn new(store: Arc<LedgerStore>, config: GameConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<LedgerStore> {
        &self.store
    }

    /// Settle a bet for a principal. Validation runs before the
    /// transaction; the transaction itself is retried on lock conflicts
    /// up to `max_settle_retries` attempts.
    pub fn settle(
        &self,
        principal_id: &str,
        amount: u64,
        params: GameParams,
        client_seed: Option<String>,
    ) -> CoreResult<SettledBet> {
        self.validate_request(amount, &params, client_seed.as_deref())?;

        let client_seed = match client_seed {
            Some(seed) if !seed.is_empty() => seed,
            _ => fairness::generate_client_seed(),
        };

        let mut attempt: u32 = 0;
        loop {
            match self.try_settle(principal_id, amount, &params, &client_seed) {
                Ok(settled) => {
                    tracing::info!(
                        principal = principal_id,
                        bet_id = %settled.record.id,
                        game = %settled.record.game_type,
                        nonce = settled.record.nonce,
                        amount,
                        payout = settled.record.payout,
                        won = settled.record.won,
                        "Bet settled"
                    );
                    return Ok(settled);
                }
                Err(e) if e.is_retryable() => {
                    attempt += 1;
                    if attempt >= self.config.max_settle_retries {
                        tracing::warn!(
                            principal = principal_id,
                            attempts = attempt,
                            "Settlement conflict retries exhausted"
                        );
                        return Err(e);
                    }
                    tracing::debug!(
                        principal = principal_id,
                        attempt,
                        "Settlement conflict, retrying"
                    );
                    std::thread::sleep(Duration::from_millis(
                        self.config.retry_backoff_ms * u64::from(attempt),
                    ));
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Pure request validation; rejects before any store access.
    fn validate_request(
        &self,
        amount: u64,
        params: &GameParams,
        client_seed: Option<&str>,
    ) -> CoreResult<()> {
        if amount < self.config.min_bet {
            return Err(CoreError::Validation(format!(
                "Bet amount below minimum of {} cents",
                self.config.min_bet
            )));
        }
        if amount > self.config.max_bet {
            return Err(CoreError::Validation(format!(
                "Bet amount above maximum of {} cents",
                self.config.max_bet
            )));
        }
        if let Some(seed) = client_seed {
            if seed.len() > self.config.max_client_seed_len {
                return Err(CoreError::Validation(format!(
                    "Client seed longer than {} bytes",
                    self.config.max_client_seed_len
                )));
            }
        }
        rules::validate(params)
    }

    /// One settlement attempt as a single transaction. The account and
    /// nonce row locks serialize concurrent bets from one principal;
    /// dropping the transaction on any error path rolls back cleanly.
    fn try_settle(
        &self,
        principal_id: &str,
        amount: u64,
        params: &GameParams,
        client_seed: &str,
    ) -> CoreResult<SettledBet> {
        let txn = self.store.begin();

        let account = self
            .store
            .locked_account(&txn, principal_id)?
            .ok_or_else(|| CoreError::UnknownPrincipal(principal_id.to_string()))?;

        // Balance re-read under the row lock; a stale pre-transaction
        // read must never be trusted.
        if account.balance < amount {
            return Err(CoreError::InsufficientBalance {
                balance: account.balance,
                requested: amount,
            });
        }

        let nonce = self.store.locked_nonce(&txn, principal_id)? + 1;

        let server_seed = fairness::generate_server_seed();
        let server_seed_hash = fairness::seed_hash(&server_seed);
        let roll = fairness::derive_roll(&server_seed, client_seed, nonce);

        let terms = rules::win_terms(params);
        let won = rules::decide(params, roll);
        let payout = rules::payout(amount, terms.multiplier, won);

        let new_balance = (account.balance - amount)
            .checked_add(payout)
            .ok_or_else(|| CoreError::Integrity("Payout would overflow balance".to_string()))?;

        let record = BetRecord {
            id: Uuid::new_v4(),
            principal_id: principal_id.to_string(),
            game_type: params.game_type(),
            amount,
            win_chance: terms.win_chance,
            multiplier: terms.multiplier,
            won,
            payout,
            server_seed,
            server_seed_hash,
            client_seed: client_seed.to_string(),
            nonce,
            params: *params,
            roll,
            created_at: Utc::now(),
        };

        let mut updated = account;
        updated.balance = new_balance;
        self.store.put_account(&txn, &updated)?;
        self.store.put_nonce(&txn, principal_id, nonce)?;
        self.store.put_bet(&txn, &record)?;

        txn.commit()?;

        // Advisory totals; never under the account locks.
        if let Err(e) = self.store.record_settlement_stats(amount, payout) {
            tracing::warn!("Failed to update platform stats: {}", e);
        }

        Ok(SettledBet {
            record,
            new_balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::types::{CoinSide, DiceBetType};
    use crate::verify;

    fn test_engine() -> (tempfile::TempDir, SettlementEngine) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LedgerStore::open(dir.path()).unwrap());
        (dir, SettlementEngine::new(store, GameConfig::default()))
    }

    fn dice_over_50() -> GameParams {
        GameParams::Dice {
            bet_type: DiceBetType::Over,
            target: 5_000,
        }
    }

    #[test]
    fn test_dice_settlement_math_and_persistence() {
        let (_dir, engine) = test_engine();
        engine.store().create_account("alice", 100_000, false).unwrap();

        // amount=100.00 over 50.00: winChance=50%, multiplier=1.98.
        let settled = engine
            .settle("alice", 10_000, dice_over_50(), Some("my-seed".to_string()))
            .unwrap();
        let record = &settled.record;

        assert_eq!(record.nonce, 1);
        assert_eq!(record.win_chance, 5_000);
        assert!((record.multiplier - 1.98).abs() < 1e-9);
        assert_eq!(record.client_seed, "my-seed");
        if record.won {
            assert_eq!(record.payout, 19_800);
            assert_eq!(settled.new_balance, 109_800);
        } else {
            assert_eq!(record.payout, 0);
            assert_eq!(settled.new_balance, 90_000);
        }

        // Persisted record and balance match the response.
        let stored = engine.store().get_bet(&record.id).unwrap().unwrap();
        assert_eq!(stored.roll, record.roll);
        assert_eq!(
            engine.store().get_account("alice").unwrap().unwrap().balance,
            settled.new_balance
        );

        // Every persisted bet passes verification.
        let report = verify::verify_bet(&stored);
        assert!(report.seed_hash_valid);
        assert!(report.matches_stored);
        assert!(report.payout_consistent);
    }

    #[test]
    fn test_flip_settlement_math() {
        let (_dir, engine) = test_engine();
        engine.store().create_account("bob", 50_000, false).unwrap();

        // amount=50.00: winChance=49.5%, multiplier=2.0.
        let settled = engine
            .settle(
                "bob",
                5_000,
                GameParams::Flip {
                    side: CoinSide::Heads,
                },
                None,
            )
            .unwrap();

        assert_eq!(settled.record.win_chance, rules::FLIP_WIN_CHANCE);
        assert_eq!(settled.record.multiplier, 2.0);
        if settled.record.won {
            assert_eq!(settled.record.payout, 10_000);
            assert_eq!(settled.new_balance, 55_000);
        } else {
            assert_eq!(settled.new_balance, 45_000);
        }
        // Auto-generated client seed is recorded.
        assert!(!settled.record.client_seed.is_empty());
    }

    #[test]
    fn test_insufficient_balance_leaves_no_trace() {
        let (_dir, engine) = test_engine();
        engine.store().create_account("carol", 100_000, false).unwrap();

        let err = engine
            .settle("carol", 200_000, dice_over_50(), None)
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientBalance { .. }));

        assert_eq!(
            engine.store().get_account("carol").unwrap().unwrap().balance,
            100_000
        );
        assert_eq!(engine.store().current_nonce("carol").unwrap(), 0);
        let (history, _) = engine.store().bet_history("carol", None, 10).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_unknown_principal_rejected() {
        let (_dir, engine) = test_engine();
        assert!(matches!(
            engine.settle("nobody", 1_000, dice_over_50(), None),
            Err(CoreError::UnknownPrincipal(_))
        ));
    }

    #[test]
    fn test_validation_happens_before_any_mutation() {
        let (_dir, engine) = test_engine();
        engine.store().create_account("dave", 100_000, false).unwrap();

        // Target 99.99 over -> 0.01% win chance, rejected.
        let err = engine
            .settle(
                "dave",
                1_000,
                GameParams::Dice {
                    bet_type: DiceBetType::Over,
                    target: 9_999,
                },
                None,
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        // Zero amount rejected by the stake bounds.
        assert!(matches!(
            engine.settle("dave", 0, dice_over_50(), None),
            Err(CoreError::Validation(_))
        ));

        // Oversized client seed rejected.
        assert!(matches!(
            engine.settle("dave", 1_000, dice_over_50(), Some("x".repeat(65))),
            Err(CoreError::Validation(_))
        ));

        assert_eq!(engine.store().current_nonce("dave").unwrap(), 0);
    }

    #[test]
    fn test_sequential_bets_use_contiguous_nonces() {
        let (_dir, engine) = test_engine();
        engine.store().create_account("erin", 1_000_000, false).unwrap();

        for expected_nonce in 1..=5 {
            let settled = engine.settle("erin", 1_000, dice_over_50(), None).unwrap();
            assert_eq!(settled.record.nonce, expected_nonce);
        }

        let (history, _) = engine.store().bet_history("erin", None, 10).unwrap();
        let nonces: Vec<u64> = history.iter().map(|b| b.nonce).collect();
        assert_eq!(nonces, vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_stats_follow_settlements() {
        let (_dir, engine) = test_engine();
        engine.store().create_account("fred", 1_000_000, false).unwrap();

        let s1 = engine.settle("fred", 1_000, dice_over_50(), None).unwrap();
        let s2 = engine.settle("fred", 2_000, dice_over_50(), None).unwrap();

        let stats = engine.store().stats().unwrap();
        assert_eq!(stats.bet_count, 2);
        assert_eq!(stats.total_wagered, 3_000);
        assert_eq!(
            stats.total_paid_out,
            s1.record.payout + s2.record.payout
        );
    }
}
