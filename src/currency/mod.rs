//! Multi-currency support: currency codes, conversion, and the cached
//! exchange-rate service.

pub mod convert;
pub mod rates;
pub mod sources;

pub use convert::{convert_with_table, round_amount, round_to};
pub use rates::{RateService, RateTable};
pub use sources::{CryptoPriceSource, HttpCryptoSource, HttpFiatSource, RateSource, SourceError};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::CurrencyError;

/// Supported currencies
///
/// `Sol` is the cryptocurrency-denominated unit; everything else is fiat.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Bdt,
    Sol,
}

impl Currency {
    /// Base unit of the rate table and the reference currency for the
    /// win-lock rule.
    pub const REFERENCE: Currency = Currency::Usd;

    /// ISO-style code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Bdt => "BDT",
            Currency::Sol => "SOL",
        }
    }

    /// Parse a currency code (case-insensitive)
    pub fn from_code(code: &str) -> Result<Self, CurrencyError> {
        match code.to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "BDT" => Ok(Currency::Bdt),
            "SOL" => Ok(Currency::Sol),
            other => Err(CurrencyError::InvalidCurrency(other.to_string())),
        }
    }

    pub fn is_crypto(&self) -> bool {
        matches!(self, Currency::Sol)
    }

    /// Decimal places amounts in this currency are rounded to
    pub fn decimals(&self) -> u32 {
        if self.is_crypto() {
            8
        } else {
            2
        }
    }

    /// All supported currencies
    pub fn all() -> [Currency; 4] {
        [Currency::Usd, Currency::Eur, Currency::Bdt, Currency::Sol]
    }

    /// All fiat currencies, the set every fiat source must answer for
    pub fn fiat() -> [Currency; 3] {
        [Currency::Usd, Currency::Eur, Currency::Bdt]
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for currency in Currency::all() {
            assert_eq!(Currency::from_code(currency.code()).unwrap(), currency);
        }
    }

    #[test]
    fn test_from_code_is_case_insensitive() {
        assert_eq!(Currency::from_code("bdt").unwrap(), Currency::Bdt);
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert!(matches!(
            Currency::from_code("XYZ"),
            Err(CurrencyError::InvalidCurrency(_))
        ));
    }

    #[test]
    fn test_precision() {
        assert_eq!(Currency::Usd.decimals(), 2);
        assert_eq!(Currency::Sol.decimals(), 8);
    }
}
