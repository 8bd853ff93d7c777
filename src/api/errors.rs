//! API Error Handling
//!
//! Maps domain errors onto structured JSON error responses with proper
//! HTTP status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::{CasinoError, CurrencyError, GameError, StorageError, WalletError};

/// Top-level API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body with structured information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable error code (INSUFFICIENT_FUNDS, INVALID_BET, ...)
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// API error carrying the HTTP mapping of a domain failure
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(code: &'static str, message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code,
            message,
        }
    }
}

impl From<CasinoError> for ApiError {
    fn from(err: CasinoError) -> Self {
        let (status, code) = match &err {
            CasinoError::Wallet(WalletError::AccountNotFound(_)) => {
                (StatusCode::NOT_FOUND, "ACCOUNT_NOT_FOUND")
            }
            CasinoError::Wallet(WalletError::InvalidAmount(_)) => {
                (StatusCode::BAD_REQUEST, "INVALID_AMOUNT")
            }
            CasinoError::Wallet(WalletError::InsufficientFunds { .. }) => {
                (StatusCode::BAD_REQUEST, "INSUFFICIENT_FUNDS")
            }
            CasinoError::Currency(CurrencyError::InvalidCurrency(_)) => {
                (StatusCode::BAD_REQUEST, "INVALID_CURRENCY")
            }
            CasinoError::Currency(CurrencyError::ConversionUnavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "CONVERSION_UNAVAILABLE")
            }
            CasinoError::Game(GameError::UnsupportedGame(_)) => {
                (StatusCode::BAD_REQUEST, "UNSUPPORTED_GAME")
            }
            CasinoError::Game(GameError::InvalidBet(_)) => {
                (StatusCode::BAD_REQUEST, "INVALID_BET")
            }
            CasinoError::Game(GameError::InvalidPrediction { .. }) => {
                (StatusCode::BAD_REQUEST, "INVALID_PREDICTION")
            }
            CasinoError::Game(GameError::MissingParameters(_)) => {
                (StatusCode::BAD_REQUEST, "MISSING_PARAMETERS")
            }
            CasinoError::Storage(StorageError::WriteFailed(_))
            | CasinoError::Storage(StorageError::CorruptedData(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        Self {
            status,
            code,
            message: err.to_string(),
        }
    }
}

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        CasinoError::from(err).into()
    }
}

impl From<CurrencyError> for ApiError {
    fn from(err: CurrencyError) -> Self {
        CasinoError::from(err).into()
    }
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        CasinoError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: ErrorBody {
                code: self.code.to_string(),
                message: self.message,
            },
        });

        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_maps_to_bad_request() {
        let err: ApiError = CasinoError::Wallet(WalletError::InsufficientFunds {
            balance: 1.0,
            required: 2.0,
        })
        .into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "INSUFFICIENT_FUNDS");
    }

    #[test]
    fn test_account_not_found_maps_to_404() {
        let err: ApiError = WalletError::AccountNotFound("x".to_string()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
