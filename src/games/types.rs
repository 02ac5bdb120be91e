use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Supported game types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Dice,
    Flip,
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameType::Dice => write!(f, "dice"),
            GameType::Flip => write!(f, "flip"),
        }
    }
}

/// Dice bet direction relative to the target
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiceBetType {
    Over,
    Under,
}

impl fmt::Display for DiceBetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiceBetType::Over => write!(f, "over"),
            DiceBetType::Under => write!(f, "under"),
        }
    }
}

/// Coin flip side
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CoinSide {
    Heads,
    Tails,
}

impl fmt::Display for CoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoinSide::Heads => write!(f, "heads"),
            CoinSide::Tails => write!(f, "tails"),
        }
    }
}

/// Game-specific bet parameters (discriminated union).
///
/// Dice targets are carried in hundredths (e.g. 50.00 -> 5000), the same
/// integer domain the roll uses. Adding a game means adding a variant
/// here plus its rules in `games::rules`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "game", rename_all = "lowercase")]
pub enum GameParams {
    Dice { bet_type: DiceBetType, target: u32 },
    Flip { side: CoinSide },
}

impl GameParams {
    pub fn game_type(&self) -> GameType {
        match self {
            GameParams::Dice { .. } => GameType::Dice,
            GameParams::Flip { .. } => GameType::Flip,
        }
    }
}

/// Immutable settled bet, persisted exactly once inside the settlement
/// transaction. Amounts are integer cents; `roll` is the raw outcome in
/// hundredths; `win_chance` is in hundredths of a percent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetRecord {
    pub id: Uuid,
    pub principal_id: String,
    pub game_type: GameType,
    pub amount: u64,
    pub win_chance: u32,
    pub multiplier: f64,
    pub won: bool,
    pub payout: u64,
    pub server_seed: String,
    pub server_seed_hash: String,
    pub client_seed: String,
    pub nonce: u64,
    #[serde(flatten)]
    pub params: GameParams,
    pub roll: u32,
    pub created_at: DateTime<Utc>,
}

impl BetRecord {
    /// Outcome as the externally visible two-decimal value.
    pub fn result_value(&self) -> f64 {
        crate::fairness::roll_value(self.roll)
    }
}

/// Result of a committed settlement: the persisted record plus the
/// balance it left behind.
#[derive(Debug, Clone)]
pub struct SettledBet {
    pub record: BetRecord,
    pub new_balance: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_params_serde_tagging() {
        let dice = GameParams::Dice {
            bet_type: DiceBetType::Over,
            target: 5000,
        };
        let json = serde_json::to_value(&dice).unwrap();
        assert_eq!(json["game"], "dice");
        assert_eq!(json["bet_type"], "over");
        assert_eq!(json["target"], 5000);

        let flip: GameParams = serde_json::from_value(serde_json::json!({
            "game": "flip",
            "side": "tails",
        }))
        .unwrap();
        assert_eq!(flip, GameParams::Flip { side: CoinSide::Tails });
    }

    #[test]
    fn test_bet_record_round_trips_with_flattened_params() {
        let record = BetRecord {
            id: Uuid::new_v4(),
            principal_id: "player-1".to_string(),
            game_type: GameType::Dice,
            amount: 10_000,
            win_chance: 5000,
            multiplier: 1.98,
            won: true,
            payout: 19_800,
            server_seed: "seed".to_string(),
            server_seed_hash: crate::fairness::seed_hash("seed"),
            client_seed: "client".to_string(),
            nonce: 1,
            params: GameParams::Dice {
                bet_type: DiceBetType::Over,
                target: 5000,
            },
            roll: 7250,
            created_at: Utc::now(),
        };

        let bytes = serde_json::to_vec(&record).unwrap();
        let decoded: BetRecord = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded.id, record.id);
        assert_eq!(decoded.params, record.params);
        assert_eq!(decoded.roll, 7250);
        assert_eq!(decoded.result_value(), 72.50);
    }
}
