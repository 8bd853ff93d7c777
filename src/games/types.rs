//! Game round request/response types.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::currency::Currency;
use crate::errors::GameError;

/// Supported game types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    Slots,
    Dice,
    Plinko,
    PlinkoMaster,
}

impl GameType {
    /// Parse a wire-level game name. Unknown names are the
    /// `UnsupportedGame` failure rather than a deserialization error so the
    /// API can report them cleanly.
    pub fn parse(name: &str) -> Result<Self, GameError> {
        match name.to_ascii_lowercase().as_str() {
            "slots" => Ok(GameType::Slots),
            "dice" => Ok(GameType::Dice),
            "plinko" => Ok(GameType::Plinko),
            "plinko_master" => Ok(GameType::PlinkoMaster),
            other => Err(GameError::UnsupportedGame(other.to_string())),
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameType::Slots => write!(f, "slots"),
            GameType::Dice => write!(f, "dice"),
            GameType::Plinko => write!(f, "plinko"),
            GameType::PlinkoMaster => write!(f, "plinko_master"),
        }
    }
}

/// Slot reel symbols
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SlotSymbol {
    Cherry,
    Lemon,
    Seven,
    Bar,
    Diamond,
}

impl SlotSymbol {
    pub const ALL: [SlotSymbol; 5] = [
        SlotSymbol::Cherry,
        SlotSymbol::Lemon,
        SlotSymbol::Seven,
        SlotSymbol::Bar,
        SlotSymbol::Diamond,
    ];
}

/// One step of a plinko ball path
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PathStep {
    Left,
    Right,
}

/// Dice round inputs
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DiceParams {
    /// Threshold the roll is compared against, within [2, 98]
    pub prediction: u8,
    /// Win on `roll >= prediction` when true, `roll <= prediction` otherwise
    pub roll_over: bool,
}

impl DiceParams {
    pub const MIN_PREDICTION: u8 = 2;
    pub const MAX_PREDICTION: u8 = 98;

    pub fn validate(&self) -> Result<(), GameError> {
        if self.prediction < Self::MIN_PREDICTION || self.prediction > Self::MAX_PREDICTION {
            return Err(GameError::InvalidPrediction {
                min: Self::MIN_PREDICTION,
                max: Self::MAX_PREDICTION,
                got: self.prediction,
            });
        }
        Ok(())
    }

    /// Slots on the die that win, out of 100 (the published odds, which
    /// intentionally undercount the over range by one)
    pub fn win_chance(&self) -> u8 {
        if self.roll_over {
            100 - self.prediction
        } else {
            self.prediction - 1
        }
    }

    /// 99% theoretical-return multiplier
    pub fn multiplier(&self) -> f64 {
        99.0 / f64::from(self.win_chance())
    }
}

/// Game-specific result payload (discriminated union)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum GameData {
    Slots {
        reels: [SlotSymbol; 5],
    },
    Dice {
        roll: u8,
        prediction: u8,
        roll_over: bool,
    },
    Plinko {
        bucket: usize,
        multiplier: f64,
    },
    PlinkoMaster {
        path: Vec<PathStep>,
        bucket: usize,
        multiplier: f64,
    },
}

/// A validated game round request handed to the engine
#[derive(Debug, Clone)]
pub struct RoundRequest {
    pub account_id: String,
    pub game_type: GameType,
    pub bet_amount: f64,
    pub currency: Currency,
    pub dice: Option<DiceParams>,
}

/// What a settled round reports back to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundReceipt {
    pub session_id: Uuid,
    pub is_win: bool,
    /// Payout in the bet currency; zero on a plain loss
    pub win_amount: f64,
    pub multiplier: f64,
    /// Account balance after settlement, in the account's currency
    pub balance: f64,
    pub currency: Currency,
    pub game_data: GameData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_games() {
        assert_eq!(GameType::parse("slots").unwrap(), GameType::Slots);
        assert_eq!(GameType::parse("PLINKO_MASTER").unwrap(), GameType::PlinkoMaster);
    }

    #[test]
    fn test_parse_unknown_game() {
        assert!(matches!(
            GameType::parse("roulette"),
            Err(GameError::UnsupportedGame(_))
        ));
    }

    #[test]
    fn test_dice_params_bounds() {
        assert!(DiceParams { prediction: 1, roll_over: true }.validate().is_err());
        assert!(DiceParams { prediction: 99, roll_over: false }.validate().is_err());
        assert!(DiceParams { prediction: 2, roll_over: true }.validate().is_ok());
        assert!(DiceParams { prediction: 98, roll_over: false }.validate().is_ok());
    }

    #[test]
    fn test_dice_multiplier() {
        let params = DiceParams { prediction: 50, roll_over: true };
        assert_eq!(params.win_chance(), 50);
        assert_eq!(params.multiplier(), 99.0 / 50.0);

        let params = DiceParams { prediction: 50, roll_over: false };
        assert_eq!(params.win_chance(), 49);
    }

    #[test]
    fn test_game_data_tagged_serialization() {
        let data = GameData::Plinko { bucket: 3, multiplier: 1.4 };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["game"], "plinko");
        assert_eq!(json["bucket"], 3);
    }
}
