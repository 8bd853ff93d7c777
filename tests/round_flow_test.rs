//! End-to-end tests for the wallet ledger and game engine: concurrency
//! safety, the win-lock ceiling, currency scenarios, and event ordering.

use spinhouse::config::CasinoConfig;
use spinhouse::currency::{Currency, RateService};
use spinhouse::errors::{CasinoError, WalletError};
use spinhouse::events::{EventBroadcaster, SessionRegistry, WalletEvent};
use spinhouse::games::{
    DiceParams, GameData, GameEngine, GameHistoryStore, GameType, MemoryGameHistory, RoundRequest,
};
use spinhouse::wallet::{Account, EntryKind, Ledger, MemoryWalletStore, WalletStore};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

struct TestStack {
    store: Arc<MemoryWalletStore>,
    ledger: Arc<Ledger>,
    engine: GameEngine,
    history: Arc<MemoryGameHistory>,
    registry: Arc<SessionRegistry>,
    rates: Arc<RateService>,
}

/// Full in-memory stack on the static fallback rate table
/// (USD 1.0, EUR 0.92, BDT 110, SOL priced at 150 USD).
async fn stack_with(accounts: &[(&str, Currency, f64)]) -> TestStack {
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
    let registry = Arc::new(SessionRegistry::new());
    let broadcaster = EventBroadcaster::new(Arc::clone(&registry));
    let ledger = Arc::new(Ledger::new(
        store.clone() as Arc<dyn WalletStore>,
        Arc::clone(&rates),
        broadcaster.clone(),
    ));
    let history = Arc::new(MemoryGameHistory::new(20_000));
    let engine = GameEngine::new(
        Arc::clone(&ledger),
        history.clone() as Arc<dyn GameHistoryStore>,
        broadcaster,
        CasinoConfig::testing().games,
    );

    TestStack {
        store,
        ledger,
        engine,
        history,
        registry,
        rates,
    }
}

#[tokio::test]
async fn concurrent_bets_cannot_both_drain_the_balance() {
    let stack = stack_with(&[("alice", Currency::Usd, 100.0)]).await;

    // Two simultaneous 60 USD bets against a 100 USD balance: exactly one
    // may succeed.
    let first = stack
        .ledger
        .debit("alice", 60.0, Currency::Usd, EntryKind::Bet, None);
    let second = stack
        .ledger
        .debit("alice", 60.0, Currency::Usd, EntryKind::Bet, None);
    let (a, b) = tokio::join!(first, second);

    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one bet must be approved");

    let failure = if a.is_err() { a } else { b };
    assert!(matches!(
        failure.unwrap_err(),
        CasinoError::Wallet(WalletError::InsufficientFunds { .. })
    ));

    let account = stack.store.get_account("alice").await.unwrap().unwrap();
    assert_eq!(account.balance, 40.0);
}

#[tokio::test]
async fn win_lock_holds_across_ten_thousand_rounds() {
    // Balance never drops below the 150 USD ceiling during the run.
    let stack = stack_with(&[("whale", Currency::Usd, 100_000.0)]).await;

    for _ in 0..10_000 {
        let receipt = stack
            .engine
            .place_bet(RoundRequest {
                account_id: "whale".to_string(),
                game_type: GameType::Slots,
                bet_amount: 1.0,
                currency: Currency::Usd,
                dice: None,
            })
            .await
            .unwrap();
        assert!(!receipt.is_win, "win-lock must override the 45% probability");
        assert_eq!(receipt.win_amount, 0.0);
    }

    let stats = stack.history.stats().await.unwrap();
    assert_eq!(stats.round_count, 10_000);
    assert_eq!(stats.win_count, 0);
}

#[tokio::test]
async fn forced_slots_win_pays_the_fixed_multiplier() {
    use spinhouse::wallet::RoundResolution;

    let stack = stack_with(&[("alice", Currency::Usd, 100.0)]).await;

    // Resolve the round exactly as the engine would for a forced win.
    let settled = stack
        .ledger
        .settle_round("alice", 10.0, Currency::Usd, Uuid::new_v4(), |_| {
            let mut rng = rand::thread_rng();
            let (payout, data) = spinhouse::games::slots::render(true, 10.0, 1.1, &mut rng);
            RoundResolution {
                payout,
                detail: data,
            }
        })
        .await
        .unwrap();

    // 100 - 10 + 10 * 1.1 = 101
    assert_eq!(settled.account.balance, 101.0);
    let GameData::Slots { reels } = settled.detail else {
        panic!("wrong payload")
    };
    assert_eq!(reels[1], reels[2]);
    assert_eq!(reels[2], reels[3]);
}

#[tokio::test]
async fn currency_change_converts_and_audits() {
    let stack = stack_with(&[("alice", Currency::Usd, 50.0)]).await;

    let account = stack
        .ledger
        .change_currency("alice", Currency::Bdt)
        .await
        .unwrap();

    assert_eq!(account.currency, Currency::Bdt);
    assert_eq!(account.balance, 5500.0);

    let entries = stack.store.entries_for("alice", 10).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, EntryKind::CurrencyChange);
    let metadata = entries[0].metadata.as_ref().unwrap();
    assert_eq!(metadata["old_currency"], "USD");
    assert_eq!(metadata["new_currency"], "BDT");
    assert_eq!(metadata["old_balance"], 50.0);
    assert_eq!(metadata["new_balance"], 5500.0);
}

#[tokio::test]
async fn conversion_round_trips_within_tolerance() {
    let stack = stack_with(&[]).await;

    for &(from, to, amount, tolerance) in &[
        (Currency::Usd, Currency::Bdt, 123.45, 0.01),
        (Currency::Usd, Currency::Eur, 87.65, 0.01),
        (Currency::Eur, Currency::Bdt, 10.0, 0.01),
        (Currency::Sol, Currency::Usd, 0.25, 1e-8),
    ] {
        let there = stack.rates.convert(amount, from, to).await.unwrap();
        let back = stack.rates.convert(there, to, from).await.unwrap();
        assert!(
            (back - amount).abs() < tolerance,
            "{from}->{to}: {amount} came back as {back}"
        );
    }
}

#[tokio::test]
async fn dice_receipt_is_consistent_with_its_roll() {
    let stack = stack_with(&[("alice", Currency::Usd, 100.0)]).await;

    for _ in 0..50 {
        let receipt = stack
            .engine
            .place_bet(RoundRequest {
                account_id: "alice".to_string(),
                game_type: GameType::Dice,
                bet_amount: 1.0,
                currency: Currency::Usd,
                dice: Some(DiceParams {
                    prediction: 50,
                    roll_over: true,
                }),
            })
            .await
            .unwrap();

        assert_eq!(receipt.multiplier, 99.0 / 50.0);
        let GameData::Dice { roll, .. } = receipt.game_data else {
            panic!("wrong payload")
        };
        assert_eq!(receipt.is_win, roll >= 50);
    }
}

#[tokio::test]
async fn balance_events_follow_mutations_in_order() {
    let stack = stack_with(&[("alice", Currency::Usd, 100.0)]).await;
    let (_id, mut events) = stack.registry.register("alice");

    stack
        .ledger
        .credit("alice", 25.0, Currency::Usd, EntryKind::Deposit, None)
        .await
        .unwrap();
    stack
        .ledger
        .debit("alice", 40.0, Currency::Usd, EntryKind::Withdrawal, None)
        .await
        .unwrap();

    match events.recv().await.unwrap() {
        WalletEvent::BalanceUpdate {
            balance,
            previous_balance,
            context,
            ..
        } => {
            assert_eq!(balance, 125.0);
            assert_eq!(previous_balance, Some(100.0));
            assert_eq!(context, "DEPOSIT");
        }
        other => panic!("unexpected event: {other:?}"),
    }
    match events.recv().await.unwrap() {
        WalletEvent::BalanceUpdate {
            balance, context, ..
        } => {
            assert_eq!(balance, 85.0);
            assert_eq!(context, "WITHDRAWAL");
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn round_in_foreign_currency_settles_in_account_currency() {
    // BDT account betting in USD: the debit converts at 110.
    let stack = stack_with(&[("alice", Currency::Bdt, 2200.0)]).await;

    let receipt = stack
        .engine
        .place_bet(RoundRequest {
            account_id: "alice".to_string(),
            game_type: GameType::Slots,
            bet_amount: 10.0,
            currency: Currency::Usd,
            dice: None,
        })
        .await
        .unwrap();

    assert_eq!(receipt.currency, Currency::Bdt);
    let expected = if receipt.is_win {
        // 2200 - 1100 + round2(11 * 110)
        2310.0
    } else {
        1100.0
    };
    assert_eq!(receipt.balance, expected);
}
