//! Round orchestration.
//!
//! `place_bet` walks a round through its whole lifecycle: validate the bet,
//! settle it against the ledger (debit, decide, render, credit) as one
//! per-account critical section, then record history and broadcast the
//! result to the recent-winners feed.

use chrono::Utc;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use super::history::{GameHistoryStore, RoundRecord};
use super::types::{GameData, GameType, RoundReceipt, RoundRequest};
use super::{decision, dice, plinko, slots};
use crate::config::GamesConfig;
use crate::currency::round_amount;
use crate::errors::{CasinoResult, GameError};
use crate::events::EventBroadcaster;
use crate::wallet::{Ledger, RoundResolution};

/// Per-round detail carried through settlement
struct RoundDetail {
    is_win: bool,
    multiplier: f64,
    payout: f64,
    game_data: GameData,
}

/// The game outcome engine
pub struct GameEngine {
    ledger: Arc<Ledger>,
    history: Arc<dyn GameHistoryStore>,
    broadcaster: EventBroadcaster,
    config: GamesConfig,
}

impl GameEngine {
    pub fn new(
        ledger: Arc<Ledger>,
        history: Arc<dyn GameHistoryStore>,
        broadcaster: EventBroadcaster,
        config: GamesConfig,
    ) -> Self {
        Self {
            ledger,
            history,
            broadcaster,
            config,
        }
    }

    /// Play one round: debit the bet, resolve the outcome, credit any
    /// payout, and report the settled state.
    pub async fn place_bet(&self, request: RoundRequest) -> CasinoResult<RoundReceipt> {
        if !request.bet_amount.is_finite() || request.bet_amount <= 0.0 {
            return Err(GameError::InvalidBet(request.bet_amount).into());
        }

        // Game parameters are validated before any money moves.
        let dice_params = match request.game_type {
            GameType::Dice => {
                let params = request
                    .dice
                    .ok_or(GameError::MissingParameters("dice prediction and direction"))?;
                params.validate()?;
                Some(params)
            }
            _ => None,
        };

        let session_id = Uuid::new_v4();
        let config = self.config.clone();
        let game_type = request.game_type;
        let bet_amount = request.bet_amount;

        let settled = self
            .ledger
            .settle_round(
                &request.account_id,
                bet_amount,
                request.currency,
                session_id,
                move |balance_reference| {
                    let mut rng = rand::thread_rng();
                    let decision = decision::decide(
                        balance_reference,
                        config.win_probability,
                        config.win_lock_threshold,
                        &mut rng,
                    );

                    let (payout, multiplier, is_win, game_data) = match game_type {
                        GameType::Slots => {
                            let (payout, data) =
                                slots::render(decision, bet_amount, config.slots_multiplier, &mut rng);
                            (payout, config.slots_multiplier, decision, data)
                        }
                        GameType::Dice => {
                            let params = dice_params.expect("validated above");
                            let (payout, data) = dice::render(decision, bet_amount, params, &mut rng);
                            (payout, params.multiplier(), decision, data)
                        }
                        GameType::Plinko => {
                            let (payout, multiplier, data) =
                                plinko::render_fixed(decision, bet_amount, &mut rng);
                            (payout, multiplier, multiplier >= 1.0, data)
                        }
                        GameType::PlinkoMaster => {
                            let (payout, multiplier, data) =
                                plinko::render_master(decision, bet_amount, &mut rng);
                            (payout, multiplier, multiplier >= 1.0, data)
                        }
                    };

                    RoundResolution {
                        payout,
                        detail: RoundDetail {
                            is_win,
                            multiplier,
                            payout,
                            game_data,
                        },
                    }
                },
            )
            .await?;

        let detail = settled.detail;
        // A payout the ledger could not credit settles the round as lost.
        let (is_win, win_amount) = if detail.payout > 0.0 && settled.win_entry.is_none() {
            (false, 0.0)
        } else {
            (detail.is_win, round_amount(detail.payout, request.currency))
        };

        let record = RoundRecord {
            session_id,
            account_id: request.account_id.clone(),
            game_type,
            bet_amount,
            win_amount,
            multiplier: detail.multiplier,
            currency: request.currency,
            is_win,
            created_at: Utc::now(),
        };
        if let Err(e) = self.history.append(record).await {
            warn!(account_id = %request.account_id, error = %e, "failed to record round history");
        }

        self.broadcaster.notify_round_result(
            &request.account_id,
            game_type,
            is_win,
            win_amount,
            detail.multiplier,
            request.currency,
        );

        Ok(RoundReceipt {
            session_id,
            is_win,
            win_amount,
            multiplier: detail.multiplier,
            balance: settled.account.balance,
            currency: settled.account.currency,
            game_data: detail.game_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CasinoConfig;
    use crate::currency::{Currency, RateService};
    use crate::errors::{CasinoError, WalletError};
    use crate::events::SessionRegistry;
    use crate::games::history::MemoryGameHistory;
    use crate::wallet::{Account, MemoryWalletStore, WalletStore};
    use std::time::Duration;

    async fn engine_with(balance: f64) -> (GameEngine, Arc<MemoryWalletStore>) {
        let store = Arc::new(MemoryWalletStore::new());
        store
            .insert_account(Account::new("alice", Currency::Usd, balance))
            .await
            .unwrap();
        let rates = Arc::new(RateService::with_sources(
            vec![],
            vec![],
            Duration::from_secs(300),
            Duration::from_secs(1),
        ));
        let broadcaster = EventBroadcaster::new(Arc::new(SessionRegistry::new()));
        let ledger = Arc::new(Ledger::new(
            store.clone() as Arc<dyn WalletStore>,
            rates,
            broadcaster.clone(),
        ));
        let history = Arc::new(MemoryGameHistory::new(100));
        let engine = GameEngine::new(
            ledger,
            history,
            broadcaster,
            CasinoConfig::testing().games,
        );
        (engine, store)
    }

    fn slots_request(bet: f64) -> RoundRequest {
        RoundRequest {
            account_id: "alice".to_string(),
            game_type: GameType::Slots,
            bet_amount: bet,
            currency: Currency::Usd,
            dice: None,
        }
    }

    #[tokio::test]
    async fn test_invalid_bet_rejected_without_mutation() {
        let (engine, store) = engine_with(100.0).await;

        for bet in [0.0, -5.0, f64::NAN] {
            let err = engine.place_bet(slots_request(bet)).await.unwrap_err();
            assert!(matches!(err, CasinoError::Game(GameError::InvalidBet(_))));
        }
        assert_eq!(store.entry_count().await, 0);
    }

    #[tokio::test]
    async fn test_insufficient_funds_stops_before_payload() {
        let (engine, store) = engine_with(5.0).await;

        let err = engine.place_bet(slots_request(10.0)).await.unwrap_err();
        assert!(matches!(
            err,
            CasinoError::Wallet(WalletError::InsufficientFunds { .. })
        ));
        assert_eq!(store.entry_count().await, 0);
    }

    #[tokio::test]
    async fn test_dice_requires_valid_params() {
        let (engine, store) = engine_with(100.0).await;

        let mut request = slots_request(10.0);
        request.game_type = GameType::Dice;
        let err = engine.place_bet(request.clone()).await.unwrap_err();
        assert!(matches!(
            err,
            CasinoError::Game(GameError::MissingParameters(_))
        ));

        request.dice = Some(crate::games::DiceParams {
            prediction: 1,
            roll_over: true,
        });
        let err = engine.place_bet(request).await.unwrap_err();
        assert!(matches!(
            err,
            CasinoError::Game(GameError::InvalidPrediction { .. })
        ));
        assert_eq!(store.entry_count().await, 0);
    }

    #[tokio::test]
    async fn test_slots_accounting_identity() {
        let (engine, store) = engine_with(100.0).await;

        let receipt = engine.place_bet(slots_request(10.0)).await.unwrap();

        let expected = if receipt.is_win { 101.0 } else { 90.0 };
        assert_eq!(receipt.balance, expected);
        let account = store.get_account("alice").await.unwrap().unwrap();
        assert_eq!(account.balance, expected);
    }

    #[tokio::test]
    async fn test_win_lock_forces_losses() {
        // Balance stays far above the 150 USD ceiling for every round.
        let (engine, _store) = engine_with(100_000.0).await;

        for _ in 0..200 {
            let receipt = engine.place_bet(slots_request(1.0)).await.unwrap();
            assert!(!receipt.is_win);
        }
    }

    #[tokio::test]
    async fn test_plinko_always_settles_a_payout() {
        let (engine, _store) = engine_with(100.0).await;

        let mut request = slots_request(10.0);
        request.game_type = GameType::Plinko;
        let receipt = engine.place_bet(request).await.unwrap();

        assert!(receipt.win_amount >= 0.0);
        assert_eq!(receipt.is_win, receipt.multiplier >= 1.0);
        match receipt.game_data {
            GameData::Plinko { bucket, .. } => assert!(bucket < 16),
            other => panic!("unexpected payload: {other:?}"),
        }
    }
}
