//! Route Definitions
//!
//! Maps URLs to handlers with type-safe routing.

use super::{handlers::*, websocket::websocket_handler};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // Accounts and the ledger
        .route("/account", post(create_account_handler))
        .route("/account/:id", get(account_handler))
        .route("/account/:id/ledger", get(ledger_handler))
        .route("/account/:id/currency", post(change_currency_handler))
        .route("/account/:id/deposit", post(deposit_handler))
        .route("/account/:id/withdraw", post(withdraw_handler))
        // Game rounds
        .route("/bet", post(place_bet_handler))
        // Exchange rates
        .route("/rates", get(rates_handler))
        // History feeds
        .route("/history/recent", get(recent_rounds_handler))
        .route("/history/stats", get(stats_handler))
        // Real-time events
        .route("/ws/:account_id", get(websocket_handler))
        // Attach shared state
        .with_state(state)
}
