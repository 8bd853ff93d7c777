//! Error types for the Spinhouse wallet and game engine.
//!
//! One root error wraps per-domain sub-enums so callers can match on the
//! domain first and the specific failure second.

use thiserror::Error;

use crate::currency::Currency;

/// Root error type for all Spinhouse operations
#[derive(Debug, Error)]
pub enum CasinoError {
    /// Balance mutation errors
    #[error("wallet error: {0}")]
    Wallet(#[from] WalletError),

    /// Currency lookup/conversion errors
    #[error("currency error: {0}")]
    Currency(#[from] CurrencyError),

    /// Game validation and resolution errors
    #[error("game error: {0}")]
    Game(#[from] GameError),

    /// Persistence errors
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Balance mutation errors
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: f64, required: f64 },
}

/// Currency lookup/conversion errors
#[derive(Debug, Error)]
pub enum CurrencyError {
    #[error("invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("no exchange rate available for {0}")]
    ConversionUnavailable(Currency),
}

/// Game validation and resolution errors
#[derive(Debug, Error)]
pub enum GameError {
    #[error("unsupported game type: {0}")]
    UnsupportedGame(String),

    #[error("invalid bet amount: {0}")]
    InvalidBet(f64),

    #[error("dice prediction must be between {min} and {max}, got {got}")]
    InvalidPrediction { min: u8, max: u8, got: u8 },

    #[error("missing game parameters: {0}")]
    MissingParameters(&'static str),
}

/// Persistence errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error("corrupted record: {0}")]
    CorruptedData(String),
}

/// Convenience type alias for Results
pub type CasinoResult<T> = Result<T, CasinoError>;
