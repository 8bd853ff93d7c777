//! API Request/Response Models
//!
//! All wire types for the HTTP endpoints. Currencies and game types travel
//! as plain strings here and are validated at the handler boundary so
//! unknown values map to the right domain errors instead of generic 422s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::games::{CasinoStats, GameData, RoundRecord};
use uuid::Uuid;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// POST /account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub id: String,
    pub currency: String,
    #[serde(default)]
    pub initial_balance: f64,
}

/// Account snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: String,
    pub balance: f64,
    pub currency: String,
    pub updated_at: DateTime<Utc>,
}

/// POST /bet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceBetRequest {
    pub account_id: String,
    pub game_type: String,
    pub bet_amount: f64,
    pub currency: String,
    /// Dice only
    #[serde(default)]
    pub prediction: Option<u8>,
    /// Dice only; defaults to roll-over
    #[serde(default)]
    pub roll_over: Option<bool>,
}

/// POST /bet response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceBetResponse {
    pub session_id: Uuid,
    pub is_win: bool,
    pub win_amount: f64,
    pub multiplier: f64,
    pub balance: f64,
    pub currency: String,
    pub game_data: GameData,
}

/// POST /account/:id/currency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeCurrencyRequest {
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeCurrencyResponse {
    pub balance: f64,
    pub currency: String,
}

/// POST /account/:id/deposit and /withdraw
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResponse {
    pub balance: f64,
    pub currency: String,
    pub entry_id: Uuid,
}

/// GET /rates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatesResponse {
    pub base: String,
    pub rates: HashMap<String, f64>,
    pub last_updated: DateTime<Utc>,
    pub age_minutes: i64,
}

/// GET /history/recent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentRoundsResponse {
    pub rounds: Vec<RoundRecord>,
}

/// GET /history/stats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub stats: CasinoStats,
}
