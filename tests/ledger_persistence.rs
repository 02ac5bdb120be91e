//! Test to verify ledger persistence across restarts
//! This validates that balances, nonces, and bet records survive
//! closing and reopening the store.

use fairbet::config::GameConfig;
use fairbet::games::types::{CoinSide, GameParams};
use fairbet::ledger::settlement::SettlementEngine;
use fairbet::ledger::store::LedgerStore;
use std::sync::Arc;

#[test]
fn test_ledger_persistence_across_restarts() {
    let dir = tempfile::tempdir().unwrap();

    // === PHASE 1: create store, settle some bets, and drop it ===
    let (balance_before, bet_ids, nonce_before) = {
        let store = Arc::new(LedgerStore::open(dir.path()).unwrap());
        store.create_account("alice", 500_000, false).unwrap();
        let engine = SettlementEngine::new(store.clone(), GameConfig::default());

        let mut bet_ids = Vec::new();
        for _ in 0..3 {
            let settled = engine
                .settle(
                    "alice",
                    5_000,
                    GameParams::Flip {
                        side: CoinSide::Heads,
                    },
                    None,
                )
                .unwrap();
            bet_ids.push(settled.record.id);
        }

        let balance = store.get_account("alice").unwrap().unwrap().balance;
        let nonce = store.current_nonce("alice").unwrap();
        (balance, bet_ids, nonce)
        // store dropped here, releasing the DB lock
    };
    assert_eq!(nonce_before, 3);

    // === PHASE 2: reopen and verify everything survived ===
    let store = LedgerStore::open(dir.path()).unwrap();

    let account = store.get_account("alice").unwrap().unwrap();
    assert_eq!(account.balance, balance_before);
    assert_eq!(store.current_nonce("alice").unwrap(), 3);

    for bet_id in &bet_ids {
        let record = store
            .get_bet(bet_id)
            .unwrap()
            .expect("bet record must survive restart");
        let report = fairbet::verify_bet(&record);
        assert!(report.is_valid(), "persisted bet must still verify");
    }

    let (history, _) = store.bet_history("alice", None, 10).unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(store.stats().unwrap().bet_count, 3);

    // Nonces continue from the persisted counter after restart.
    let engine = SettlementEngine::new(Arc::new(store), GameConfig::default());
    let settled = engine
        .settle(
            "alice",
            5_000,
            GameParams::Flip {
                side: CoinSide::Tails,
            },
            None,
        )
        .unwrap();
    assert_eq!(settled.record.nonce, 4);
}
