//! Game rules: validation, win decision, and payout math per game type.
//!
//! All chances are in hundredths of a percent and all amounts in cents,
//! matching the roll's integer domain. The same functions drive both
//! settlement and verification so the two can never disagree.

use crate::errors::{CoreError, CoreResult};
use crate::games::types::{CoinSide, DiceBetType, GameParams};

/// House edge subtracted from the fair return, in percent.
pub const HOUSE_EDGE_PERCENT: u32 = 1;

/// Accepted win-chance band, hundredths of a percent (1% to 98%).
/// The lower bound caps the maximum multiplier at 99x.
pub const MIN_WIN_CHANCE: u32 = 100;
pub const MAX_WIN_CHANCE: u32 = 9_800;

/// Fixed flip win chance: 49.5%.
pub const FLIP_WIN_CHANCE: u32 = 4_950;

/// Rolls below this land Heads, at or above land Tails.
pub const FLIP_HEADS_BOUND: u32 = 5_000;

/// Win chance and payout multiplier derived from validated parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WinTerms {
    /// Hundredths of a percent.
    pub win_chance: u32,
    pub multiplier: f64,
}

/// Validate game parameters. Pure; runs before any store access.
pub fn validate(params: &GameParams) -> CoreResult<()> {
    match params {
        GameParams::Dice { bet_type, target } => {
            // Target boundaries 0.00 and 100.00 are rejected outright.
            if *target == 0 || *target >= crate::fairness::OUTCOME_STATES {
                return Err(CoreError::Validation(format!(
                    "Dice target must be between 0.01 and 99.99, got {:.2}",
                    crate::fairness::roll_value(*target)
                )));
            }
            let win_chance = dice_win_chance(*bet_type, *target);
            if !(MIN_WIN_CHANCE..=MAX_WIN_CHANCE).contains(&win_chance) {
                return Err(CoreError::Validation(format!(
                    "Win chance {:.2}% outside allowed band {:.0}%-{:.0}%",
                    f64::from(win_chance) / 100.0,
                    f64::from(MIN_WIN_CHANCE) / 100.0,
                    f64::from(MAX_WIN_CHANCE) / 100.0
                )));
            }
            Ok(())
        }
        GameParams::Flip { .. } => Ok(()),
    }
}

/// Win chance and multiplier for validated parameters.
pub fn win_terms(params: &GameParams) -> WinTerms {
    let win_chance = match params {
        GameParams::Dice { bet_type, target } => dice_win_chance(*bet_type, *target),
        GameParams::Flip { .. } => FLIP_WIN_CHANCE,
    };
    WinTerms {
        win_chance,
        multiplier: multiplier_for(win_chance),
    }
}

/// Decide a roll against the bet. Deterministic; shared by settlement
/// and verification.
pub fn decide(params: &GameParams, roll: u32) -> bool {
    match params {
        GameParams::Dice { bet_type, target } => match bet_type {
            DiceBetType::Over => roll > *target,
            DiceBetType::Under => roll < *target,
        },
        GameParams::Flip { side } => flip_result(roll) == *side,
    }
}

/// Which side a roll lands on. Canonical mapping: roll < 50.00 is Heads.
pub fn flip_result(roll: u32) -> CoinSide {
    if roll < FLIP_HEADS_BOUND {
        CoinSide::Heads
    } else {
        CoinSide::Tails
    }
}

/// Payout in cents. Zero on loss; stake times multiplier on win,
/// rounded to the nearest cent.
pub fn payout(amount: u64, multiplier: f64, won: bool) -> u64 {
    if won {
        (amount as f64 * multiplier).round() as u64
    } else {
        0
    }
}

fn dice_win_chance(bet_type: DiceBetType, target: u32) -> u32 {
    match bet_type {
        DiceBetType::Over => crate::fairness::OUTCOME_STATES - target,
        DiceBetType::Under => target,
    }
}

fn multiplier_for(win_chance: u32) -> f64 {
    // (100 - house_edge)% over the win chance, both in hundredths.
    f64::from((100 - HOUSE_EDGE_PERCENT) * 100) / f64::from(win_chance)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dice(bet_type: DiceBetType, target: u32) -> GameParams {
        GameParams::Dice { bet_type, target }
    }

    #[test]
    fn test_dice_over_50_terms() {
        // amount=100.00, over 50.00: winChance=50%, multiplier=99/50=1.98.
        let terms = win_terms(&dice(DiceBetType::Over, 5000));
        assert_eq!(terms.win_chance, 5000);
        assert!((terms.multiplier - 1.98).abs() < 1e-9);
        assert_eq!(payout(10_000, terms.multiplier, true), 19_800);
        assert_eq!(payout(10_000, terms.multiplier, false), 0);
    }

    #[test]
    fn test_flip_terms_are_fixed() {
        // winChance=49.5%, multiplier=99/49.5=2.0 exactly.
        let terms = win_terms(&GameParams::Flip { side: CoinSide::Heads });
        assert_eq!(terms.win_chance, FLIP_WIN_CHANCE);
        assert_eq!(terms.multiplier, 2.0);
        assert_eq!(payout(5_000, terms.multiplier, true), 10_000);
    }

    #[test]
    fn test_dice_decision_boundaries() {
        let over = dice(DiceBetType::Over, 5000);
        assert!(!decide(&over, 5000)); // equal is a loss for over
        assert!(decide(&over, 5001));
        assert!(!decide(&over, 4999));

        let under = dice(DiceBetType::Under, 5000);
        assert!(!decide(&under, 5000)); // equal is a loss for under
        assert!(decide(&under, 4999));
    }

    #[test]
    fn test_flip_mapping_is_canonical() {
        assert_eq!(flip_result(0), CoinSide::Heads);
        assert_eq!(flip_result(4999), CoinSide::Heads);
        assert_eq!(flip_result(5000), CoinSide::Tails);
        assert_eq!(flip_result(9999), CoinSide::Tails);

        assert!(decide(&GameParams::Flip { side: CoinSide::Heads }, 1234));
        assert!(!decide(&GameParams::Flip { side: CoinSide::Heads }, 8765));
    }

    #[test]
    fn test_validation_rejects_boundary_targets() {
        assert!(validate(&dice(DiceBetType::Over, 0)).is_err());
        assert!(validate(&dice(DiceBetType::Under, 10_000)).is_err());
        assert!(validate(&dice(DiceBetType::Under, 10_500)).is_err());
    }

    #[test]
    fn test_validation_enforces_win_chance_band() {
        // over 99.50 -> 0.50% win chance: too low.
        assert!(validate(&dice(DiceBetType::Over, 9_950)).is_err());
        // over 1.00 -> 99% win chance: too high.
        assert!(validate(&dice(DiceBetType::Over, 100)).is_err());
        // over 2.00 -> exactly 98%: allowed.
        assert!(validate(&dice(DiceBetType::Over, 200)).is_ok());
        // under 1.00 -> exactly 1%: allowed.
        assert!(validate(&dice(DiceBetType::Under, 100)).is_ok());
        // under 0.99 -> below 1%: rejected.
        assert!(validate(&dice(DiceBetType::Under, 99)).is_err());

        assert!(validate(&GameParams::Flip { side: CoinSide::Tails }).is_ok());
    }

    #[test]
    fn test_max_multiplier_is_bounded() {
        let terms = win_terms(&dice(DiceBetType::Under, MIN_WIN_CHANCE));
        assert!((terms.multiplier - 99.0).abs() < 1e-9);
    }
}
