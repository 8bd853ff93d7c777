//! Wallet subsystem: accounts, the append-only ledger, and balance
//! mutation with per-account serialization.

pub mod account;
pub mod ledger;
pub mod store;

pub use account::{Account, EntryKind, EntryStatus, LedgerEntry};
pub use ledger::{Ledger, RoundResolution, SettledRound};
pub use store::{MemoryWalletStore, WalletStore};
