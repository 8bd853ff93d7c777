//! Account and ledger-entry record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::currency::{round_amount, Currency};

/// A user's wallet. The balance is always expressed in `currency`;
/// changing currency converts the stored amount, never relabels it.
/// Mutated only through the [`Ledger`](super::Ledger).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub balance: f64,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(id: impl Into<String>, currency: Currency, balance: f64) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            balance: round_amount(balance, currency),
            currency,
            created_at: now,
            updated_at: now,
        }
    }
}

/// What a ledger entry records
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    Bet,
    Win,
    Deposit,
    Withdrawal,
    AdminAdjustment,
    CurrencyChange,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntryKind::Bet => "BET",
            EntryKind::Win => "WIN",
            EntryKind::Deposit => "DEPOSIT",
            EntryKind::Withdrawal => "WITHDRAWAL",
            EntryKind::AdminAdjustment => "ADMIN_ADJUSTMENT",
            EntryKind::CurrencyChange => "CURRENCY_CHANGE",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    Completed,
    Failed,
}

/// Immutable record of a single balance-affecting event. Entries are
/// append-only; the account balance is the cached derivation the ledger
/// keeps consistent with this stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub account_id: String,
    /// Positive magnitude in the account's currency
    pub amount: f64,
    /// Negative for debits, positive for credits
    pub signed_amount: f64,
    pub currency: Currency,
    pub kind: EntryKind,
    pub status: EntryStatus,
    pub balance_after: f64,
    /// Correlates a bet with the win it produced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(
        account_id: &str,
        signed_amount: f64,
        currency: Currency,
        kind: EntryKind,
        balance_after: f64,
        session_id: Option<Uuid>,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id: account_id.to_string(),
            amount: signed_amount.abs(),
            signed_amount,
            currency,
            kind,
            status: EntryStatus::Completed,
            balance_after,
            session_id,
            metadata,
            created_at: Utc::now(),
        }
    }
}
