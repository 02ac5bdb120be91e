//! Independent verification of persisted bets.
//!
//! Recomputes everything a bet record claims from its disclosed seed
//! triple: the SHA-256 seed commitment, the roll, and the win/payout
//! derivation. Pure and idempotent; callable any number of times against
//! the same record with identical results. Mismatches are reported,
//! never corrected.

use crate::fairness;
use crate::games::rules;
use crate::games::types::BetRecord;
use serde::Serialize;

/// Outcome of verifying one bet record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VerificationReport {
    /// sha256(server_seed) equals the stored commitment hash.
    pub seed_hash_valid: bool,
    /// Roll re-derived from the stored seed triple, in hundredths.
    pub recomputed_roll: u32,
    /// The recomputed roll equals the stored roll. Exact integer
    /// comparison; the outcome domain is integral.
    pub matches_stored: bool,
    /// Win flag, win chance, and payout re-derive to the stored values.
    pub payout_consistent: bool,
}

impl VerificationReport {
    pub fn is_valid(&self) -> bool {
        self.seed_hash_valid && self.matches_stored && self.payout_consistent
    }

    /// Recomputed outcome as the externally visible two-decimal value.
    pub fn recomputed_result(&self) -> f64 {
        fairness::roll_value(self.recomputed_roll)
    }
}

/// Verify a persisted bet record.
pub fn verify_bet(record: &BetRecord) -> VerificationReport {
    let seed_hash_valid = fairness::seed_hash(&record.server_seed) == record.server_seed_hash;

    let recomputed_roll =
        fairness::derive_roll(&record.server_seed, &record.client_seed, record.nonce);
    let matches_stored = recomputed_roll == record.roll;

    let terms = rules::win_terms(&record.params);
    let won = rules::decide(&record.params, recomputed_roll);
    let payout_consistent = record.game_type == record.params.game_type()
        && record.win_chance == terms.win_chance
        && record.won == won
        && record.payout == rules::payout(record.amount, terms.multiplier, won);

    VerificationReport {
        seed_hash_valid,
        recomputed_roll,
        matches_stored,
        payout_consistent,
    }
}
