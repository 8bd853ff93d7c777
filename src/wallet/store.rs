//! Wallet persistence seam.
//!
//! The ledger talks to storage through [`WalletStore`]; the in-memory
//! implementation backs the server and the tests, and a database adapter
//! plugs in at the same trait.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::RwLock;

use super::account::{Account, LedgerEntry};
use crate::errors::{CasinoResult, WalletError};

#[async_trait]
pub trait WalletStore: Send + Sync {
    async fn get_account(&self, id: &str) -> CasinoResult<Option<Account>>;

    async fn insert_account(&self, account: Account) -> CasinoResult<()>;

    async fn update_account(&self, account: &Account) -> CasinoResult<()>;

    /// Entries are append-only; implementations must never rewrite them.
    async fn append_entry(&self, entry: &LedgerEntry) -> CasinoResult<()>;

    /// Newest-first entries for one account
    async fn entries_for(&self, account_id: &str, limit: usize) -> CasinoResult<Vec<LedgerEntry>>;
}

/// In-memory store: accounts in a concurrent map, entries in an
/// append-only log.
#[derive(Default)]
pub struct MemoryWalletStore {
    accounts: DashMap<String, Account>,
    entries: RwLock<Vec<LedgerEntry>>,
}

impl MemoryWalletStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl WalletStore for MemoryWalletStore {
    async fn get_account(&self, id: &str) -> CasinoResult<Option<Account>> {
        Ok(self.accounts.get(id).map(|a| a.clone()))
    }

    async fn insert_account(&self, account: Account) -> CasinoResult<()> {
        self.accounts.insert(account.id.clone(), account);
        Ok(())
    }

    async fn update_account(&self, account: &Account) -> CasinoResult<()> {
        match self.accounts.get_mut(&account.id) {
            Some(mut existing) => {
                *existing = account.clone();
                Ok(())
            }
            None => Err(WalletError::AccountNotFound(account.id.clone()).into()),
        }
    }

    async fn append_entry(&self, entry: &LedgerEntry) -> CasinoResult<()> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn entries_for(&self, account_id: &str, limit: usize) -> CasinoResult<Vec<LedgerEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .rev()
            .filter(|e| e.account_id == account_id)
            .take(limit)
            .cloned()
            .collect())
    }
}
