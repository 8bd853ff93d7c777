//! Real-time event delivery to live client sessions.
//!
//! The session registry is a concurrent multimap from account id to the
//! connections currently open for it; the broadcaster is the narrow
//! interface the ledger and game engine see. Delivery is an unbounded,
//! non-blocking enqueue: calling it from inside a mutation's critical
//! section costs nothing measurable and guarantees a single account's
//! events are observed in apply order. Zero registered connections is not
//! an error; the event is dropped.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::currency::Currency;
use crate::games::types::GameType;

/// Events pushed to websocket clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WalletEvent {
    /// An account's balance changed
    BalanceUpdate {
        account_id: String,
        balance: f64,
        currency: Currency,
        #[serde(skip_serializing_if = "Option::is_none")]
        previous_balance: Option<f64>,
        /// What caused the change ("BET", "WIN", "DEPOSIT", ...)
        context: String,
        timestamp: DateTime<Utc>,
    },

    /// A game round resolved; fans out to every connection for the
    /// recent-winners feed
    RoundResult {
        account_id: String,
        game_type: GameType,
        is_win: bool,
        win_amount: f64,
        multiplier: f64,
        currency: Currency,
        timestamp: DateTime<Utc>,
    },
}

struct ConnectionHandle {
    id: u64,
    tx: mpsc::UnboundedSender<WalletEvent>,
}

/// Live connections keyed by account id. Owned by the websocket transport;
/// everything else goes through [`EventBroadcaster`].
#[derive(Default)]
pub struct SessionRegistry {
    connections: DashMap<String, Vec<ConnectionHandle>>,
    next_id: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection for an account; returns its id and the event
    /// stream to drain into the socket.
    pub fn register(&self, account_id: &str) -> (u64, mpsc::UnboundedReceiver<WalletEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.connections
            .entry(account_id.to_string())
            .or_default()
            .push(ConnectionHandle { id, tx });
        (id, rx)
    }

    pub fn deregister(&self, account_id: &str, connection_id: u64) {
        if let Some(mut handles) = self.connections.get_mut(account_id) {
            handles.retain(|h| h.id != connection_id);
        }
        self.connections
            .remove_if(account_id, |_, handles| handles.is_empty());
    }

    pub fn connection_count(&self) -> usize {
        self.connections.iter().map(|e| e.value().len()).sum()
    }

    /// Enqueue for one account's connections; prunes closed ones.
    /// Returns how many connections received the event.
    fn send_to(&self, account_id: &str, event: &WalletEvent) -> usize {
        let Some(mut handles) = self.connections.get_mut(account_id) else {
            return 0;
        };
        handles.retain(|h| h.tx.send(event.clone()).is_ok());
        handles.len()
    }

    /// Enqueue for every connection regardless of account
    fn send_all(&self, event: &WalletEvent) -> usize {
        let mut delivered = 0;
        for mut entry in self.connections.iter_mut() {
            entry.retain(|h| h.tx.send(event.clone()).is_ok());
            delivered += entry.len();
        }
        delivered
    }
}

/// The notify interface handed to the ledger and game engine.
#[derive(Clone)]
pub struct EventBroadcaster {
    registry: Arc<SessionRegistry>,
}

impl EventBroadcaster {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Push a balance change to the account's live connections.
    /// Best-effort: failures never reach the mutation path.
    pub fn notify_balance(
        &self,
        account_id: &str,
        balance: f64,
        currency: Currency,
        previous_balance: Option<f64>,
        context: &str,
    ) {
        let event = WalletEvent::BalanceUpdate {
            account_id: account_id.to_string(),
            balance,
            currency,
            previous_balance,
            context: context.to_string(),
            timestamp: Utc::now(),
        };

        let delivered = self.registry.send_to(account_id, &event);
        if delivered == 0 {
            debug!(account_id, context, "balance event dropped: no live connections");
        }
    }

    /// Push a resolved round to all connections (recent-winners feed).
    pub fn notify_round_result(
        &self,
        account_id: &str,
        game_type: GameType,
        is_win: bool,
        win_amount: f64,
        multiplier: f64,
        currency: Currency,
    ) {
        let event = WalletEvent::RoundResult {
            account_id: account_id.to_string(),
            game_type,
            is_win,
            win_amount,
            multiplier,
            currency,
            timestamp: Utc::now(),
        };

        let delivered = self.registry.send_all(&event);
        debug!(account_id, delivered, "round result broadcast");
    }
}
