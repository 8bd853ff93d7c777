//! Spinhouse Server Binary
//!
//! Wires the wallet, currency, game, and event subsystems together and
//! serves the HTTP/WebSocket API.

use clap::Parser;
use spinhouse::api::{ApiServer, AppState};
use spinhouse::config::CasinoConfig;
use spinhouse::currency::RateService;
use spinhouse::events::{EventBroadcaster, SessionRegistry};
use spinhouse::games::{GameEngine, GameHistoryStore, MemoryGameHistory};
use spinhouse::wallet::{Ledger, MemoryWalletStore, WalletStore};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "spinhouse")]
#[command(about = "Spinhouse casino wallet & game engine", long_about = None)]
struct Args {
    /// Configuration file (TOML); defaults apply when omitted
    #[arg(long)]
    config: Option<String>,

    /// Override the configured bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the configured bind port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spinhouse=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => CasinoConfig::from_file(path)?,
        None => CasinoConfig::default(),
    };
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;

    // Currency layer: cached rates with background refresh.
    let rates = Arc::new(RateService::new(&config.currency));
    let _refresh_task = rates.spawn_refresh_task(config.refresh_interval());

    // Event layer: session registry owned by the websocket transport, the
    // ledger and engine only see the broadcaster.
    let registry = Arc::new(SessionRegistry::new());
    let broadcaster = EventBroadcaster::new(Arc::clone(&registry));

    // Wallet and games.
    let store: Arc<dyn WalletStore> = Arc::new(MemoryWalletStore::new());
    let ledger = Arc::new(Ledger::new(
        Arc::clone(&store),
        Arc::clone(&rates),
        broadcaster.clone(),
    ));
    let history: Arc<dyn GameHistoryStore> =
        Arc::new(MemoryGameHistory::new(config.events.history_capacity));
    let engine = Arc::new(GameEngine::new(
        Arc::clone(&ledger),
        Arc::clone(&history),
        broadcaster,
        config.games.clone(),
    ));

    let state = Arc::new(AppState {
        store,
        ledger,
        engine,
        rates,
        history,
        registry,
    });

    ApiServer::new(config.server.clone(), state).run().await
}
