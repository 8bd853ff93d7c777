//! Request Handlers
//!
//! Thin translation layer: parse and validate wire values, call into the
//! ledger/engine/rate service, map domain errors to HTTP.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::errors::ApiError;
use super::models::*;
use crate::currency::{Currency, RateService};
use crate::errors::WalletError;
use crate::events::SessionRegistry;
use crate::games::{DiceParams, GameEngine, GameHistoryStore, GameType, RoundRequest};
use crate::wallet::{Account, EntryKind, Ledger, LedgerEntry, WalletStore};

/// Shared application state
pub struct AppState {
    pub store: Arc<dyn WalletStore>,
    pub ledger: Arc<Ledger>,
    pub engine: Arc<GameEngine>,
    pub rates: Arc<RateService>,
    pub history: Arc<dyn GameHistoryStore>,
    pub registry: Arc<SessionRegistry>,
}

/// Health check handler - minimal response time
/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
    })
}

/// Create (seed) an account
/// POST /account
pub async fn create_account_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let currency = Currency::from_code(&request.currency)?;
    if !request.initial_balance.is_finite() || request.initial_balance < 0.0 {
        return Err(WalletError::InvalidAmount(request.initial_balance).into());
    }
    if state.store.get_account(&request.id).await?.is_some() {
        return Err(ApiError::bad_request(
            "ACCOUNT_EXISTS",
            format!("account '{}' already exists", request.id),
        ));
    }

    let account = Account::new(request.id, currency, request.initial_balance);
    state.store.insert_account(account.clone()).await?;
    Ok(Json(account_response(account)))
}

/// Account snapshot
/// GET /account/:id
pub async fn account_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state
        .store
        .get_account(&id)
        .await?
        .ok_or(WalletError::AccountNotFound(id))?;
    Ok(Json(account_response(account)))
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// Account ledger entries, newest first
/// GET /account/:id/ledger?limit={n}
pub async fn ledger_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<Vec<LedgerEntry>>, ApiError> {
    if state.store.get_account(&id).await?.is_none() {
        return Err(WalletError::AccountNotFound(id).into());
    }
    let entries = state.store.entries_for(&id, params.limit.min(500)).await?;
    Ok(Json(entries))
}

/// Play a game round
/// POST /bet
pub async fn place_bet_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PlaceBetRequest>,
) -> Result<Json<PlaceBetResponse>, ApiError> {
    let game_type = GameType::parse(&request.game_type)?;
    let currency = Currency::from_code(&request.currency)?;
    let dice = request.prediction.map(|prediction| DiceParams {
        prediction,
        roll_over: request.roll_over.unwrap_or(true),
    });

    let receipt = state
        .engine
        .place_bet(RoundRequest {
            account_id: request.account_id,
            game_type,
            bet_amount: request.bet_amount,
            currency,
            dice,
        })
        .await?;

    Ok(Json(PlaceBetResponse {
        session_id: receipt.session_id,
        is_win: receipt.is_win,
        win_amount: receipt.win_amount,
        multiplier: receipt.multiplier,
        balance: receipt.balance,
        currency: receipt.currency.code().to_string(),
        game_data: receipt.game_data,
    }))
}

/// Re-denominate an account
/// POST /account/:id/currency
pub async fn change_currency_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<ChangeCurrencyRequest>,
) -> Result<Json<ChangeCurrencyResponse>, ApiError> {
    let currency = Currency::from_code(&request.currency)?;
    let account = state.ledger.change_currency(&id, currency).await?;
    Ok(Json(ChangeCurrencyResponse {
        balance: account.balance,
        currency: account.currency.code().to_string(),
    }))
}

/// Deposit funds
/// POST /account/:id/deposit
pub async fn deposit_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, ApiError> {
    let currency = Currency::from_code(&request.currency)?;
    let (account, entry) = state
        .ledger
        .credit(&id, request.amount, currency, EntryKind::Deposit, None)
        .await?;
    Ok(Json(transfer_response(account, entry)))
}

/// Withdraw funds
/// POST /account/:id/withdraw
pub async fn withdraw_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, ApiError> {
    let currency = Currency::from_code(&request.currency)?;
    let (account, entry) = state
        .ledger
        .debit(&id, request.amount, currency, EntryKind::Withdrawal, None)
        .await?;
    Ok(Json(transfer_response(account, entry)))
}

#[derive(Debug, Deserialize)]
pub struct RatesQuery {
    pub base: Option<String>,
}

/// Current exchange rates, optionally rebased
/// GET /rates?base={code}
pub async fn rates_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RatesQuery>,
) -> Result<Json<RatesResponse>, ApiError> {
    let base = match params.base {
        Some(code) => Currency::from_code(&code)?,
        None => Currency::REFERENCE,
    };

    let table = state.rates.rates().await;
    let base_rate = table.rate(base)?;

    let mut rates = std::collections::HashMap::new();
    for currency in Currency::all() {
        let rate = table.rate(currency)?;
        rates.insert(currency.code().to_string(), rate / base_rate);
    }

    Ok(Json(RatesResponse {
        base: base.code().to_string(),
        rates,
        last_updated: table.last_updated,
        age_minutes: table.age_minutes(),
    }))
}

/// Recent rounds feed
/// GET /history/recent?limit={n}
pub async fn recent_rounds_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<RecentRoundsResponse>, ApiError> {
    let rounds = state.history.recent(params.limit.min(200)).await?;
    Ok(Json(RecentRoundsResponse { rounds }))
}

/// Aggregate casino stats
/// GET /history/stats
pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.history.stats().await?;
    Ok(Json(StatsResponse { stats }))
}

fn account_response(account: Account) -> AccountResponse {
    AccountResponse {
        id: account.id,
        balance: account.balance,
        currency: account.currency.code().to_string(),
        updated_at: account.updated_at,
    }
}

fn transfer_response(account: Account, entry: LedgerEntry) -> TransferResponse {
    TransferResponse {
        balance: account.balance,
        currency: account.currency.code().to_string(),
        entry_id: entry.id,
    }
}
