//! Game outcome engine.
//!
//! Resolution is a two-phase pipeline: `decision` computes the win/lose
//! decision once per round (win-lock ceiling, then the global probability),
//! and the per-game renderers bias their own randomness to match it. The
//! renderers never decide win/lose on their own.

pub mod decision;
pub mod dice;
pub mod engine;
pub mod history;
pub mod plinko;
pub mod slots;
pub mod types;

pub use engine::GameEngine;
pub use history::{CasinoStats, GameHistoryStore, MemoryGameHistory, RoundRecord};
pub use types::{DiceParams, GameData, GameType, RoundReceipt, RoundRequest};
