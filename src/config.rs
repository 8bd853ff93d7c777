//! Configuration management with validation and defaults
//!
//! Centralized configuration for the wallet, currency, game, and event
//! subsystems, loadable from a TOML file with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level Spinhouse configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CasinoConfig {
    pub server: ServerConfig,
    pub currency: CurrencyConfig,
    pub games: GamesConfig,
    pub events: EventsConfig,
}

/// HTTP/WebSocket server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
        }
    }
}

/// Exchange-rate cache and source configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyConfig {
    /// How long a cached rate table stays fresh
    pub cache_duration_secs: u64,
    /// Background refresh interval
    pub refresh_interval_secs: u64,
    /// Per-source HTTP timeout
    pub source_timeout_secs: u64,
    /// Prioritized fiat rate source URLs; first full answer wins
    pub fiat_sources: Vec<String>,
    /// Prioritized crypto price sources as (url, json pointer) pairs
    pub crypto_sources: Vec<CryptoSourceConfig>,
}

/// One crypto price endpoint and the JSON pointer to its USD price field
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CryptoSourceConfig {
    pub url: String,
    pub pointer: String,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            cache_duration_secs: 300,
            refresh_interval_secs: 300,
            source_timeout_secs: 3,
            fiat_sources: vec![
                "https://open.er-api.com/v6/latest/USD".to_string(),
                "https://api.exchangerate.host/latest?base=USD".to_string(),
            ],
            crypto_sources: vec![
                CryptoSourceConfig {
                    url: "https://api.coingecko.com/api/v3/simple/price?ids=solana&vs_currencies=usd"
                        .to_string(),
                    pointer: "/solana/usd".to_string(),
                },
                CryptoSourceConfig {
                    url: "https://api.binance.com/api/v3/ticker/price?symbol=SOLUSDT".to_string(),
                    pointer: "/price".to_string(),
                },
            ],
        }
    }
}

/// Game resolution configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GamesConfig {
    /// Global probability that a round wins, before the win-lock rule
    pub win_probability: f64,
    /// Balance ceiling in the reference currency; at or above it a round
    /// cannot win
    pub win_lock_threshold: f64,
    /// Fixed payout multiplier for a slots win
    pub slots_multiplier: f64,
}

impl Default for GamesConfig {
    fn default() -> Self {
        Self {
            win_probability: 0.45,
            win_lock_threshold: 150.0,
            slots_multiplier: 1.1,
        }
    }
}

/// Event feed configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Rounds retained in the in-memory recent-winners feed
    pub history_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            history_capacity: 10_000,
        }
    }
}

impl CasinoConfig {
    /// Load configuration from a TOML file, falling back to defaults for
    /// missing sections.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::LoadFailed(format!("{}: {}", path.as_ref().display(), e)))?;
        let config: CasinoConfig =
            toml::from_str(&raw).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration used by tests: no external sources, tiny feeds.
    pub fn testing() -> Self {
        Self {
            currency: CurrencyConfig {
                fiat_sources: vec![],
                crypto_sources: vec![],
                ..Default::default()
            },
            events: EventsConfig {
                history_capacity: 100,
            },
            ..Default::default()
        }
    }

    /// Validate configuration for logical consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.games.win_probability) {
            return Err(ConfigError::InvalidValue(
                "games.win_probability must be within [0, 1]".to_string(),
            ));
        }

        if self.games.win_lock_threshold <= 0.0 {
            return Err(ConfigError::InvalidValue(
                "games.win_lock_threshold must be > 0".to_string(),
            ));
        }

        if self.games.slots_multiplier <= 0.0 {
            return Err(ConfigError::InvalidValue(
                "games.slots_multiplier must be > 0".to_string(),
            ));
        }

        if self.currency.cache_duration_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "currency.cache_duration_secs must be > 0".to_string(),
            ));
        }

        if self.currency.source_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "currency.source_timeout_secs must be > 0".to_string(),
            ));
        }

        if self.events.history_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "events.history_capacity must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn cache_duration(&self) -> Duration {
        Duration::from_secs(self.currency.cache_duration_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.currency.refresh_interval_secs)
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.currency.source_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("invalid configuration value: {0}")]
    InvalidValue(String),
}
