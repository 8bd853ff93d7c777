//! Balance mutation with per-account serialization.
//!
//! Every mutation is funds-check-then-apply against one balance snapshot,
//! guarded by the account's async mutex so concurrent requests on the same
//! account cannot double-approve funds. Rate tables are snapshotted BEFORE
//! the lock is taken: conversion may touch the network and the lock must
//! only cover the read-modify-write. Balance events are enqueued inside the
//! critical section (non-blocking), which keeps a single account's event
//! stream in apply order.

use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::error;
use uuid::Uuid;

use super::account::{Account, EntryKind, LedgerEntry};
use super::store::WalletStore;
use crate::currency::{round_amount, Currency, RateService};
use crate::errors::{CasinoResult, WalletError};
use crate::events::EventBroadcaster;

/// Slack for float comparison when checking fund sufficiency
const FUNDS_EPSILON: f64 = 1e-9;

/// What a round's resolve step produced: a payout (in the bet currency,
/// zero for a plain loss) plus the caller's own detail value.
pub struct RoundResolution<T> {
    pub payout: f64,
    pub detail: T,
}

/// Result of an atomically settled round
pub struct SettledRound<T> {
    pub account: Account,
    pub bet_entry: LedgerEntry,
    /// Absent when there was no payout, or when the payout could not be
    /// converted and the round settled as lost
    pub win_entry: Option<LedgerEntry>,
    pub detail: T,
}

/// The account ledger: owns all balance mutation.
pub struct Ledger {
    store: Arc<dyn WalletStore>,
    rates: Arc<RateService>,
    broadcaster: EventBroadcaster,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Ledger {
    pub fn new(
        store: Arc<dyn WalletStore>,
        rates: Arc<RateService>,
        broadcaster: EventBroadcaster,
    ) -> Self {
        Self {
            store,
            rates,
            broadcaster,
            locks: DashMap::new(),
        }
    }

    /// Remove `amount` (given in `currency`, converted into the account's
    /// currency) from the account.
    pub async fn debit(
        &self,
        account_id: &str,
        amount: f64,
        currency: Currency,
        kind: EntryKind,
        metadata: Option<serde_json::Value>,
    ) -> CasinoResult<(Account, LedgerEntry)> {
        Self::validate_amount(amount)?;
        let table = self.rates.rates().await;

        let lock = self.lock_for(account_id);
        let _guard = lock.lock().await;

        let mut account = self.load(account_id).await?;
        let delta = round_amount(
            table.convert(amount, currency, account.currency)?,
            account.currency,
        );
        if delta > account.balance + FUNDS_EPSILON {
            return Err(WalletError::InsufficientFunds {
                balance: account.balance,
                required: delta,
            }
            .into());
        }

        let entry = self.apply(&mut account, -delta, kind, None, metadata).await?;
        Ok((account, entry))
    }

    /// Add `amount` (given in `currency`, converted into the account's
    /// currency) to the account.
    pub async fn credit(
        &self,
        account_id: &str,
        amount: f64,
        currency: Currency,
        kind: EntryKind,
        metadata: Option<serde_json::Value>,
    ) -> CasinoResult<(Account, LedgerEntry)> {
        Self::validate_amount(amount)?;
        let table = self.rates.rates().await;

        let lock = self.lock_for(account_id);
        let _guard = lock.lock().await;

        let mut account = self.load(account_id).await?;
        let delta = round_amount(
            table.convert(amount, currency, account.currency)?,
            account.currency,
        );

        let entry = self.apply(&mut account, delta, kind, None, metadata).await?;
        Ok((account, entry))
    }

    /// Re-denominate the account: converts the stored balance into
    /// `new_currency` and writes an audit entry. No-op when the currency is
    /// unchanged.
    pub async fn change_currency(
        &self,
        account_id: &str,
        new_currency: Currency,
    ) -> CasinoResult<Account> {
        let table = self.rates.rates().await;

        let lock = self.lock_for(account_id);
        let _guard = lock.lock().await;

        let mut account = self.load(account_id).await?;
        if account.currency == new_currency {
            return Ok(account);
        }

        let old_currency = account.currency;
        let old_balance = account.balance;
        let rate = table.exchange_rate(old_currency, new_currency)?;
        let new_balance = table.convert(old_balance, old_currency, new_currency)?;

        account.currency = new_currency;
        account.balance = new_balance;
        account.updated_at = Utc::now();
        self.store.update_account(&account).await?;

        let metadata = serde_json::json!({
            "old_currency": old_currency,
            "old_balance": old_balance,
            "new_currency": new_currency,
            "new_balance": new_balance,
            "rate": rate,
        });
        let entry = LedgerEntry::new(
            account_id,
            0.0,
            new_currency,
            EntryKind::CurrencyChange,
            new_balance,
            None,
            Some(metadata),
        );
        self.store.append_entry(&entry).await?;

        self.broadcaster.notify_balance(
            account_id,
            new_balance,
            new_currency,
            Some(old_balance),
            "CURRENCY_CHANGE",
        );
        Ok(account)
    }

    /// Settle one game round as a single critical section: funds-checked
    /// bet debit, win/lose resolution on the post-debit balance, and the
    /// payout credit when one is due.
    ///
    /// `resolve` must be pure (no I/O): it receives the post-debit balance
    /// converted into the reference currency and returns the payout in the
    /// bet currency. The same rate snapshot prices the debit, the win-lock
    /// input, and the credit.
    pub async fn settle_round<T, F>(
        &self,
        account_id: &str,
        bet_amount: f64,
        currency: Currency,
        session_id: Uuid,
        resolve: F,
    ) -> CasinoResult<SettledRound<T>>
    where
        F: FnOnce(f64) -> RoundResolution<T> + Send,
        T: Send,
    {
        Self::validate_amount(bet_amount)?;
        let table = self.rates.rates().await;

        let lock = self.lock_for(account_id);
        let _guard = lock.lock().await;

        let mut account = self.load(account_id).await?;
        let debit_delta = round_amount(
            table.convert(bet_amount, currency, account.currency)?,
            account.currency,
        );
        if debit_delta > account.balance + FUNDS_EPSILON {
            return Err(WalletError::InsufficientFunds {
                balance: account.balance,
                required: debit_delta,
            }
            .into());
        }

        let bet_entry = self
            .apply(&mut account, -debit_delta, EntryKind::Bet, Some(session_id), None)
            .await?;

        let balance_reference =
            match table.convert(account.balance, account.currency, Currency::REFERENCE) {
                Ok(v) => v,
                Err(e) => {
                    // Unconvertible balance: treat as locked, the round
                    // cannot win.
                    error!(account_id, error = %e, "reference conversion failed; forcing loss");
                    f64::MAX
                }
            };
        let resolution = resolve(balance_reference);

        let win_entry = if resolution.payout > 0.0 {
            match table.convert(resolution.payout, currency, account.currency) {
                Ok(credit) => {
                    let credit = round_amount(credit, account.currency);
                    Some(
                        self.apply(&mut account, credit, EntryKind::Win, Some(session_id), None)
                            .await?,
                    )
                }
                Err(e) => {
                    // The bet is already debited; the round settles as lost
                    // and this line is what manual reconciliation works from.
                    error!(
                        account_id,
                        session_id = %session_id,
                        payout = resolution.payout,
                        error = %e,
                        "payout conversion failed; round settled as lost"
                    );
                    None
                }
            }
        } else {
            None
        };

        Ok(SettledRound {
            account,
            bet_entry,
            win_entry,
            detail: resolution.detail,
        })
    }

    /// Apply one signed delta: mutate, persist account + entry, notify.
    /// Caller must hold the account's lock.
    async fn apply(
        &self,
        account: &mut Account,
        signed_delta: f64,
        kind: EntryKind,
        session_id: Option<Uuid>,
        metadata: Option<serde_json::Value>,
    ) -> CasinoResult<LedgerEntry> {
        let previous = account.balance;
        account.balance = round_amount(account.balance + signed_delta, account.currency);
        account.updated_at = Utc::now();
        self.store.update_account(account).await?;

        let entry = LedgerEntry::new(
            &account.id,
            signed_delta,
            account.currency,
            kind,
            account.balance,
            session_id,
            metadata,
        );
        self.store.append_entry(&entry).await?;

        self.broadcaster.notify_balance(
            &account.id,
            account.balance,
            account.currency,
            Some(previous),
            &kind.to_string(),
        );
        Ok(entry)
    }

    fn lock_for(&self, account_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(account_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn load(&self, account_id: &str) -> CasinoResult<Account> {
        Ok(self
            .store
            .get_account(account_id)
            .await?
            .ok_or_else(|| WalletError::AccountNotFound(account_id.to_string()))?)
    }

    fn validate_amount(amount: f64) -> Result<(), WalletError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(WalletError::InvalidAmount(amount));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::RateService;
    use crate::errors::CasinoError;
    use crate::events::SessionRegistry;
    use crate::wallet::store::MemoryWalletStore;
    use std::time::Duration;

    async fn ledger_with(accounts: &[(&str, Currency, f64)]) -> (Ledger, Arc<MemoryWalletStore>) {
        let store = Arc::new(MemoryWalletStore::new());
        for &(id, currency, balance) in accounts {
            store
                .insert_account(Account::new(id, currency, balance))
                .await
                .unwrap();
        }
        let rates = Arc::new(RateService::with_sources(
            vec![],
            vec![],
            Duration::from_secs(300),
            Duration::from_secs(1),
        ));
        let broadcaster = EventBroadcaster::new(Arc::new(SessionRegistry::new()));
        let ledger = Ledger::new(store.clone() as Arc<dyn WalletStore>, rates, broadcaster);
        (ledger, store)
    }

    #[tokio::test]
    async fn test_debit_same_currency() {
        let (ledger, _store) = ledger_with(&[("alice", Currency::Usd, 100.0)]).await;

        let (account, entry) = ledger
            .debit("alice", 10.0, Currency::Usd, EntryKind::Bet, None)
            .await
            .unwrap();

        assert_eq!(account.balance, 90.0);
        assert_eq!(entry.signed_amount, -10.0);
        assert_eq!(entry.balance_after, 90.0);
    }

    #[tokio::test]
    async fn test_debit_converts_into_account_currency() {
        // Fallback table: USD->BDT at 110
        let (ledger, _store) = ledger_with(&[("alice", Currency::Bdt, 1000.0)]).await;

        let (account, entry) = ledger
            .debit("alice", 5.0, Currency::Usd, EntryKind::Bet, None)
            .await
            .unwrap();

        assert_eq!(account.balance, 450.0);
        assert_eq!(entry.currency, Currency::Bdt);
        assert_eq!(entry.amount, 550.0);
    }

    #[tokio::test]
    async fn test_debit_insufficient_funds() {
        let (ledger, store) = ledger_with(&[("alice", Currency::Usd, 5.0)]).await;

        let err = ledger
            .debit("alice", 10.0, Currency::Usd, EntryKind::Bet, None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CasinoError::Wallet(WalletError::InsufficientFunds { .. })
        ));
        // Validation failures leave no trace in the ledger.
        assert_eq!(store.entry_count().await, 0);
        let account = store.get_account("alice").await.unwrap().unwrap();
        assert_eq!(account.balance, 5.0);
    }

    #[tokio::test]
    async fn test_invalid_amounts_rejected() {
        let (ledger, _store) = ledger_with(&[("alice", Currency::Usd, 100.0)]).await;

        for amount in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            let err = ledger
                .debit("alice", amount, Currency::Usd, EntryKind::Bet, None)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                CasinoError::Wallet(WalletError::InvalidAmount(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let (ledger, _store) = ledger_with(&[]).await;

        let err = ledger
            .credit("nobody", 10.0, Currency::Usd, EntryKind::Deposit, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CasinoError::Wallet(WalletError::AccountNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_change_currency_converts_balance() {
        let (ledger, store) = ledger_with(&[("alice", Currency::Usd, 50.0)]).await;

        let account = ledger.change_currency("alice", Currency::Bdt).await.unwrap();

        assert_eq!(account.currency, Currency::Bdt);
        assert_eq!(account.balance, 5500.0);

        let entries = store.entries_for("alice", 10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, EntryKind::CurrencyChange);
        let metadata = entries[0].metadata.as_ref().unwrap();
        assert_eq!(metadata["old_currency"], "USD");
        assert_eq!(metadata["old_balance"], 50.0);
        assert_eq!(metadata["new_currency"], "BDT");
        assert_eq!(metadata["new_balance"], 5500.0);
    }

    #[tokio::test]
    async fn test_change_currency_same_is_noop() {
        let (ledger, store) = ledger_with(&[("alice", Currency::Usd, 50.0)]).await;

        let account = ledger.change_currency("alice", Currency::Usd).await.unwrap();

        assert_eq!(account.balance, 50.0);
        assert_eq!(store.entry_count().await, 0);
    }

    #[tokio::test]
    async fn test_settle_round_win_credits_payout() {
        let (ledger, store) = ledger_with(&[("alice", Currency::Usd, 100.0)]).await;
        let session_id = Uuid::new_v4();

        let settled = ledger
            .settle_round("alice", 10.0, Currency::Usd, session_id, |_balance_ref| {
                RoundResolution {
                    payout: 11.0,
                    detail: (),
                }
            })
            .await
            .unwrap();

        assert_eq!(settled.account.balance, 101.0);
        assert_eq!(settled.bet_entry.signed_amount, -10.0);
        let win = settled.win_entry.unwrap();
        assert_eq!(win.signed_amount, 11.0);
        assert_eq!(win.session_id, Some(session_id));
        assert_eq!(win.session_id, settled.bet_entry.session_id);
        assert_eq!(store.entry_count().await, 2);
    }

    #[tokio::test]
    async fn test_settle_round_loss_writes_only_the_bet() {
        let (ledger, store) = ledger_with(&[("alice", Currency::Usd, 100.0)]).await;

        let settled = ledger
            .settle_round("alice", 10.0, Currency::Usd, Uuid::new_v4(), |_| {
                RoundResolution {
                    payout: 0.0,
                    detail: (),
                }
            })
            .await
            .unwrap();

        assert_eq!(settled.account.balance, 90.0);
        assert!(settled.win_entry.is_none());
        assert_eq!(store.entry_count().await, 1);
    }

    #[tokio::test]
    async fn test_settle_round_passes_reference_balance() {
        // BDT account: 11_000 BDT post-debit should surface as ~95.45 USD.
        let (ledger, _store) = ledger_with(&[("alice", Currency::Bdt, 11_550.0)]).await;

        let settled = ledger
            .settle_round("alice", 550.0, Currency::Bdt, Uuid::new_v4(), |balance_ref| {
                RoundResolution {
                    payout: 0.0,
                    detail: balance_ref,
                }
            })
            .await
            .unwrap();

        assert!((settled.detail - 100.0).abs() < 0.01);
    }
}
