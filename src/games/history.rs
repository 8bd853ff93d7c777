//! Append-only game history for statistics and the recent-winners feed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::types::GameType;
use crate::currency::Currency;
use crate::errors::CasinoResult;

/// One settled round, as recorded for feeds and statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundRecord {
    pub session_id: Uuid,
    pub account_id: String,
    pub game_type: GameType,
    pub bet_amount: f64,
    pub win_amount: f64,
    pub multiplier: f64,
    pub currency: Currency,
    pub is_win: bool,
    pub created_at: DateTime<Utc>,
}

/// Aggregate casino statistics. Totals are kept per currency; summing
/// mixed units would be meaningless.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CasinoStats {
    pub round_count: u64,
    pub win_count: u64,
    pub wagered: HashMap<Currency, f64>,
    pub paid_out: HashMap<Currency, f64>,
}

#[async_trait]
pub trait GameHistoryStore: Send + Sync {
    async fn append(&self, record: RoundRecord) -> CasinoResult<()>;

    /// Newest-first recent rounds
    async fn recent(&self, limit: usize) -> CasinoResult<Vec<RoundRecord>>;

    async fn stats(&self) -> CasinoResult<CasinoStats>;
}

/// In-memory history: bounded ring of recent rounds plus running totals
/// that survive ring eviction.
pub struct MemoryGameHistory {
    records: RwLock<VecDeque<RoundRecord>>,
    stats: RwLock<CasinoStats>,
    capacity: usize,
}

impl MemoryGameHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::with_capacity(capacity.min(1024))),
            stats: RwLock::new(CasinoStats::default()),
            capacity,
        }
    }
}

#[async_trait]
impl GameHistoryStore for MemoryGameHistory {
    async fn append(&self, record: RoundRecord) -> CasinoResult<()> {
        {
            let mut stats = self.stats.write().await;
            stats.round_count += 1;
            if record.is_win {
                stats.win_count += 1;
            }
            *stats.wagered.entry(record.currency).or_insert(0.0) += record.bet_amount;
            *stats.paid_out.entry(record.currency).or_insert(0.0) += record.win_amount;
        }

        let mut records = self.records.write().await;
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> CasinoResult<Vec<RoundRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().rev().take(limit).cloned().collect())
    }

    async fn stats(&self) -> CasinoResult<CasinoStats> {
        Ok(self.stats.read().await.clone())
    }
}
