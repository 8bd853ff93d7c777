//! Spinhouse - Casino Wallet Ledger & Game Outcome Engine
//!
//! The core of an online casino platform: multi-currency account balances
//! mutated through an append-only ledger, game resolution under a
//! house-favored probability model, exchange rates cached from external
//! sources with a static fallback, and real-time balance/round events
//! pushed to live websocket sessions.

pub mod api;
pub mod config;
pub mod currency;
pub mod errors;
pub mod events;
pub mod games;
pub mod wallet;

pub use config::CasinoConfig;
pub use currency::{Currency, RateService, RateTable};
pub use errors::{CasinoError, CasinoResult};
pub use events::{EventBroadcaster, SessionRegistry, WalletEvent};
pub use games::{GameEngine, GameType, RoundReceipt, RoundRequest};
pub use wallet::{Account, EntryKind, Ledger, LedgerEntry, MemoryWalletStore, WalletStore};
