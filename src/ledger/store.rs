//! Transactional ledger store over RocksDB.
//!
//! Holds the only shared mutable state in the core: account balances and
//! nonce counters, plus the immutable bet records and their per-principal
//! history index. Settlement runs inside a pessimistic transaction;
//! `get_for_update` row locks on the account and nonce keys serialize
//! concurrent bets from one principal while leaving other principals
//! untouched.

use crate::errors::{CoreError, CoreResult};
use crate::games::types::BetRecord;
use chrono::{DateTime, Utc};
use rocksdb::{
    Direction, IteratorMode, Options, Transaction, TransactionDB, TransactionDBOptions,
    TransactionOptions, WriteOptions,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

const ACCOUNT_PREFIX: &str = "account:";
const NONCE_PREFIX: &str = "nonce:";
const BET_PREFIX: &str = "bet:";
const BET_INDEX_PREFIX: &str = "bets:index:";
const STATS_KEY: &[u8] = b"stats:platform";

/// Principal account row. Balance is integer cents and never negative.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: String,
    pub balance: u64,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Running platform totals, in cents. Advisory; updated after each
/// settlement commits.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlatformStats {
    pub total_wagered: u64,
    pub total_paid_out: u64,
    pub bet_count: u64,
}

fn account_key(principal_id: &str) -> Vec<u8> {
    format!("{}{}", ACCOUNT_PREFIX, principal_id).into_bytes()
}

fn nonce_key(principal_id: &str) -> Vec<u8> {
    format!("{}{}", NONCE_PREFIX, principal_id).into_bytes()
}

fn bet_key(bet_id: &Uuid) -> Vec<u8> {
    format!("{}{}", BET_PREFIX, bet_id).into_bytes()
}

fn bet_index_prefix(principal_id: &str) -> Vec<u8> {
    format!("{}{}:", BET_INDEX_PREFIX, principal_id).into_bytes()
}

/// Newest-first history key: prefix | inverted nonce (big-endian).
/// Nonces are contiguous per principal, so the inverted nonce sorts the
/// latest bet first.
fn bet_index_key(principal_id: &str, nonce: u64) -> Vec<u8> {
    let mut key = bet_index_prefix(principal_id);
    key.extend_from_slice(&(u64::MAX - nonce).to_be_bytes());
    key
}

fn parse_u64_le(bytes: &[u8]) -> Option<u64> {
    let arr: [u8; 8] = bytes.try_into().ok()?;
    Some(u64::from_le_bytes(arr))
}

pub struct LedgerStore {
    db: TransactionDB,
}

impl LedgerStore {
    /// Open (or create) the ledger at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let txn_opts = TransactionDBOptions::default();
        let db = TransactionDB::open(&opts, &txn_opts, path)
            .map_err(|e| CoreError::Store(format!("Failed to open ledger: {}", e)))?;
        Ok(Self { db })
    }

    /// Begin a pessimistic transaction. Dropping the handle without
    /// committing rolls back.
    pub fn begin(&self) -> Transaction<'_, TransactionDB> {
        let write_opts = WriteOptions::default();
        let mut txn_opts = TransactionOptions::default();
        txn_opts.set_deadlock_detect(true);
        self.db.transaction_opt(&write_opts, &txn_opts)
    }

    // ---- account rows ----

    pub fn create_account(
        &self,
        principal_id: &str,
        initial_balance: u64,
        is_admin: bool,
    ) -> CoreResult<AccountRecord> {
        // Ids become key segments; the charset keeps one principal's
        // history prefix from aliasing another's.
        if principal_id.is_empty() || principal_id.len() > 64 {
            return Err(CoreError::Validation(
                "Principal id must be 1-64 characters".to_string(),
            ));
        }
        if !principal_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(CoreError::Validation(format!(
                "Principal id may only contain alphanumerics, '-' and '_': {}",
                principal_id
            )));
        }

        let txn = self.begin();
        if self.locked_account(&txn, principal_id)?.is_some() {
            return Err(CoreError::Validation(format!(
                "Account already exists: {}",
                principal_id
            )));
        }

        let account = AccountRecord {
            id: principal_id.to_string(),
            balance: initial_balance,
            is_admin,
            created_at: Utc::now(),
        };
        self.put_account(&txn, &account)?;
        txn.commit()?;
        Ok(account)
    }

    /// Credit an account. Ops surface; settlement is the only other
    /// balance writer.
    pub fn deposit(&self, principal_id: &str, amount: u64) -> CoreResult<AccountRecord> {
        let txn = self.begin();
        let mut account = self
            .locked_account(&txn, principal_id)?
            .ok_or_else(|| CoreError::UnknownPrincipal(principal_id.to_string()))?;

        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| CoreError::Validation("Deposit would overflow balance".to_string()))?;

        self.put_account(&txn, &account)?;
        txn.commit()?;
        Ok(account)
    }

    pub fn get_account(&self, principal_id: &str) -> CoreResult<Option<AccountRecord>> {
        let Some(bytes) = self.db.get(account_key(principal_id))? else {
            return Ok(None);
        };
        let account = serde_json::from_slice(&bytes).map_err(|e| {
            CoreError::Integrity(format!("Failed to decode account {}: {}", principal_id, e))
        })?;
        Ok(Some(account))
    }

    /// Locked read of an account row inside `txn`.
    pub fn locked_account(
        &self,
        txn: &Transaction<'_, TransactionDB>,
        principal_id: &str,
    ) -> CoreResult<Option<AccountRecord>> {
        let Some(bytes) = txn.get_for_update(account_key(principal_id), true)? else {
            return Ok(None);
        };
        let account = serde_json::from_slice(&bytes).map_err(|e| {
            CoreError::Integrity(format!("Failed to decode account {}: {}", principal_id, e))
        })?;
        Ok(Some(account))
    }

    pub fn put_account(
        &self,
        txn: &Transaction<'_, TransactionDB>,
        account: &AccountRecord,
    ) -> CoreResult<()> {
        let bytes = serde_json::to_vec(account)?;
        txn.put(account_key(&account.id), bytes)?;
        Ok(())
    }

    // ---- nonce counter ----

    /// Locked read of the principal's nonce counter. A missing row reads
    /// as 0; the first committed bet carries nonce 1.
    pub fn locked_nonce(
        &self,
        txn: &Transaction<'_, TransactionDB>,
        principal_id: &str,
    ) -> CoreResult<u64> {
        let current = txn
            .get_for_update(nonce_key(principal_id), true)?
            .and_then(|b| parse_u64_le(&b))
            .unwrap_or(0);
        Ok(current)
    }

    pub fn put_nonce(
        &self,
        txn: &Transaction<'_, TransactionDB>,
        principal_id: &str,
        nonce: u64,
    ) -> CoreResult<()> {
        txn.put(nonce_key(principal_id), nonce.to_le_bytes())?;
        Ok(())
    }

    /// Last committed nonce, outside any transaction.
    pub fn current_nonce(&self, principal_id: &str) -> CoreResult<u64> {
        Ok(self
            .db
            .get(nonce_key(principal_id))?
            .and_then(|b| parse_u64_le(&b))
            .unwrap_or(0))
    }

    // ---- bet records ----

    /// Write the immutable bet record and its history index entry.
    /// Must be called inside the settlement transaction.
    pub fn put_bet(
        &self,
        txn: &Transaction<'_, TransactionDB>,
        record: &BetRecord,
    ) -> CoreResult<()> {
        let bytes = serde_json::to_vec(record)?;
        txn.put(bet_key(&record.id), bytes)?;
        txn.put(
            bet_index_key(&record.principal_id, record.nonce),
            record.id.to_string().into_bytes(),
        )?;
        Ok(())
    }

    pub fn get_bet(&self, bet_id: &Uuid) -> CoreResult<Option<BetRecord>> {
        let Some(bytes) = self.db.get(bet_key(bet_id))? else {
            return Ok(None);
        };
        let record = serde_json::from_slice(&bytes).map_err(|e| {
            CoreError::Integrity(format!("Failed to decode bet {}: {}", bet_id, e))
        })?;
        Ok(Some(record))
    }

    /// Newest-first bet history for a principal with cursor pagination.
    /// The cursor is the hex-encoded index key of the last returned row.
    pub fn bet_history(
        &self,
        principal_id: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> CoreResult<(Vec<BetRecord>, Option<String>)> {
        let prefix = bet_index_prefix(principal_id);
        let limit = limit.max(1);

        let start = match cursor {
            Some(c) => hex::decode(c)
                .map_err(|e| CoreError::Validation(format!("Invalid cursor: {}", e)))?,
            None => prefix.clone(),
        };
        let skip_first = cursor.is_some();

        let mut bets = Vec::with_capacity(limit);
        let mut last_key: Option<Vec<u8>> = None;

        let iter = self
            .db
            .iterator(IteratorMode::From(&start, Direction::Forward));
        for (i, item) in iter.enumerate() {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            if skip_first && i == 0 && key.as_ref() == start.as_slice() {
                continue;
            }

            let bet_id = std::str::from_utf8(&value)
                .ok()
                .and_then(|s| Uuid::parse_str(s).ok())
                .ok_or_else(|| {
                    CoreError::Integrity(format!(
                        "Corrupt history index entry for {}",
                        principal_id
                    ))
                })?;
            let Some(record) = self.get_bet(&bet_id)? else {
                return Err(CoreError::Integrity(format!(
                    "History index references missing bet {}",
                    bet_id
                )));
            };
            bets.push(record);
            last_key = Some(key.to_vec());
            if bets.len() >= limit {
                break;
            }
        }

        let next_cursor = if bets.len() >= limit {
            last_key.map(hex::encode)
        } else {
            None
        };
        Ok((bets, next_cursor))
    }

    // ---- platform stats ----

    pub fn stats(&self) -> CoreResult<PlatformStats> {
        match self.db.get(STATS_KEY)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| CoreError::Integrity(format!("Failed to decode stats: {}", e))),
            None => Ok(PlatformStats::default()),
        }
    }

    /// Fold one settled bet into the running totals. Runs in its own
    /// short transaction after the settlement commits; the totals are
    /// advisory and must not hold the account locks.
    pub fn record_settlement_stats(&self, amount: u64, payout: u64) -> CoreResult<()> {
        let txn = self.begin();
        let mut stats: PlatformStats = match txn.get_for_update(STATS_KEY, true)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| CoreError::Integrity(format!("Failed to decode stats: {}", e)))?,
            None => PlatformStats::default(),
        };

        stats.total_wagered = stats.total_wagered.saturating_add(amount);
        stats.total_paid_out = stats.total_paid_out.saturating_add(payout);
        stats.bet_count += 1;

        txn.put(STATS_KEY, serde_json::to_vec(&stats)?)?;
        txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::types::{DiceBetType, GameParams, GameType};

    fn test_store() -> (tempfile::TempDir, LedgerStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::open(dir.path()).unwrap();
        (dir, store)
    }

    fn test_bet(principal: &str, nonce: u64) -> BetRecord {
        BetRecord {
            id: Uuid::new_v4(),
            principal_id: principal.to_string(),
            game_type: GameType::Dice,
            amount: 1_000,
            win_chance: 5_000,
            multiplier: 1.98,
            won: false,
            payout: 0,
            server_seed: format!("seed-{}", nonce),
            server_seed_hash: crate::fairness::seed_hash(&format!("seed-{}", nonce)),
            client_seed: "client".to_string(),
            nonce,
            params: GameParams::Dice {
                bet_type: DiceBetType::Over,
                target: 5_000,
            },
            roll: 1_234,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_account_create_deposit_get() {
        let (_dir, store) = test_store();

        let account = store.create_account("alice", 100_000, false).unwrap();
        assert_eq!(account.balance, 100_000);

        let account = store.deposit("alice", 50_000).unwrap();
        assert_eq!(account.balance, 150_000);

        let loaded = store.get_account("alice").unwrap().unwrap();
        assert_eq!(loaded.balance, 150_000);
        assert!(!loaded.is_admin);

        assert!(store.get_account("bob").unwrap().is_none());
        assert!(matches!(
            store.deposit("bob", 1),
            Err(CoreError::UnknownPrincipal(_))
        ));
    }

    #[test]
    fn test_duplicate_account_rejected() {
        let (_dir, store) = test_store();
        store.create_account("alice", 0, false).unwrap();
        assert!(matches!(
            store.create_account("alice", 0, false),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_nonce_defaults_to_zero_and_persists() {
        let (_dir, store) = test_store();
        assert_eq!(store.current_nonce("alice").unwrap(), 0);

        let txn = store.begin();
        assert_eq!(store.locked_nonce(&txn, "alice").unwrap(), 0);
        store.put_nonce(&txn, "alice", 1).unwrap();
        txn.commit().unwrap();

        assert_eq!(store.current_nonce("alice").unwrap(), 1);
    }

    #[test]
    fn test_bet_round_trip() {
        let (_dir, store) = test_store();
        let bet = test_bet("alice", 1);

        let txn = store.begin();
        store.put_bet(&txn, &bet).unwrap();
        txn.commit().unwrap();

        let loaded = store.get_bet(&bet.id).unwrap().unwrap();
        assert_eq!(loaded.nonce, 1);
        assert_eq!(loaded.server_seed_hash, bet.server_seed_hash);
    }

    #[test]
    fn test_history_is_newest_first_with_cursor() {
        let (_dir, store) = test_store();

        let mut ids = Vec::new();
        for nonce in 1..=5 {
            let bet = test_bet("alice", nonce);
            ids.push(bet.id);
            let txn = store.begin();
            store.put_bet(&txn, &bet).unwrap();
            txn.commit().unwrap();
        }

        let (page1, cursor) = store.bet_history("alice", None, 3).unwrap();
        assert_eq!(
            page1.iter().map(|b| b.nonce).collect::<Vec<_>>(),
            vec![5, 4, 3]
        );
        let cursor = cursor.expect("full page yields a cursor");

        let (page2, cursor2) = store.bet_history("alice", Some(&cursor), 3).unwrap();
        assert_eq!(
            page2.iter().map(|b| b.nonce).collect::<Vec<_>>(),
            vec![2, 1]
        );
        assert!(cursor2.is_none());

        // Other principals see nothing.
        let (empty, _) = store.bet_history("bob", None, 10).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_stats_accumulate() {
        let (_dir, store) = test_store();
        assert_eq!(store.stats().unwrap().bet_count, 0);

        store.record_settlement_stats(1_000, 0).unwrap();
        store.record_settlement_stats(2_000, 3_960).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_wagered, 3_000);
        assert_eq!(stats.total_paid_out, 3_960);
        assert_eq!(stats.bet_count, 2);
    }

    #[test]
    fn test_dropped_transaction_rolls_back() {
        let (_dir, store) = test_store();
        store.create_account("alice", 5_000, false).unwrap();

        {
            let txn = store.begin();
            let mut account = store.locked_account(&txn, "alice").unwrap().unwrap();
            account.balance = 0;
            store.put_account(&txn, &account).unwrap();
            // dropped without commit
        }

        assert_eq!(store.get_account("alice").unwrap().unwrap().balance, 5_000);
    }
}
