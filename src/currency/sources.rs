//! External exchange-rate and crypto price sources.
//!
//! Sources sit behind small traits so the rate service can walk a
//! prioritized list and tests can inject deterministic implementations.
//! The static fallback table lives here too.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::collections::HashMap;

use super::Currency;
use crate::config::{CryptoSourceConfig, CurrencyConfig};

/// Failures local to a single source attempt; the caller falls through to
/// the next source in the list.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(String),

    #[error("response missing rate for {0}")]
    MissingCurrency(Currency),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// A fiat rate source. A successful fetch must answer for every requested
/// currency; partial answers are treated as failure.
#[async_trait]
pub trait RateSource: Send + Sync {
    fn name(&self) -> &str;

    /// Units of each requested currency per one base unit (USD)
    async fn fetch(&self, currencies: &[Currency]) -> Result<HashMap<Currency, f64>, SourceError>;
}

/// A crypto price source returning the USD price of one crypto unit.
#[async_trait]
pub trait CryptoPriceSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_price(&self) -> Result<f64, SourceError>;
}

/// Fiat source over an exchange-rate HTTP API with a top-level `rates`
/// object keyed by currency code.
pub struct HttpFiatSource {
    name: String,
    url: String,
    client: reqwest::Client,
}

impl HttpFiatSource {
    pub fn new(url: String, client: reqwest::Client) -> Self {
        let name = source_name(&url);
        Self { name, url, client }
    }
}

#[async_trait]
impl RateSource for HttpFiatSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, currencies: &[Currency]) -> Result<HashMap<Currency, f64>, SourceError> {
        let body: serde_json::Value = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?
            .json()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        let rates = body
            .get("rates")
            .and_then(|v| v.as_object())
            .ok_or_else(|| SourceError::Malformed("no 'rates' object".to_string()))?;

        let mut out = HashMap::with_capacity(currencies.len());
        for &currency in currencies {
            let rate = rates
                .get(currency.code())
                .and_then(value_as_f64)
                .ok_or(SourceError::MissingCurrency(currency))?;
            if rate <= 0.0 {
                return Err(SourceError::Malformed(format!(
                    "non-positive rate for {currency}"
                )));
            }
            out.insert(currency, rate);
        }
        Ok(out)
    }
}

/// Crypto price source over an HTTP API; the USD price is located by a JSON
/// pointer so one implementation covers differently shaped endpoints.
pub struct HttpCryptoSource {
    name: String,
    url: String,
    pointer: String,
    client: reqwest::Client,
}

impl HttpCryptoSource {
    pub fn new(config: &CryptoSourceConfig, client: reqwest::Client) -> Self {
        Self {
            name: source_name(&config.url),
            url: config.url.clone(),
            pointer: config.pointer.clone(),
            client,
        }
    }
}

#[async_trait]
impl CryptoPriceSource for HttpCryptoSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_price(&self) -> Result<f64, SourceError> {
        let body: serde_json::Value = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?
            .json()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        let price = body
            .pointer(&self.pointer)
            .and_then(value_as_f64)
            .ok_or_else(|| {
                SourceError::Malformed(format!("no price at pointer '{}'", self.pointer))
            })?;

        if price <= 0.0 {
            return Err(SourceError::Malformed(format!(
                "non-positive price: {price}"
            )));
        }
        Ok(price)
    }
}

/// Build the configured prioritized source lists.
pub fn build_sources(
    config: &CurrencyConfig,
    client: reqwest::Client,
) -> (Vec<Box<dyn RateSource>>, Vec<Box<dyn CryptoPriceSource>>) {
    let fiat = config
        .fiat_sources
        .iter()
        .map(|url| Box::new(HttpFiatSource::new(url.clone(), client.clone())) as Box<dyn RateSource>)
        .collect();

    let crypto = config
        .crypto_sources
        .iter()
        .map(|c| Box::new(HttpCryptoSource::new(c, client.clone())) as Box<dyn CryptoPriceSource>)
        .collect();

    (fiat, crypto)
}

/// Hardcoded rates used until the first successful refresh.
pub static STATIC_RATES: Lazy<HashMap<Currency, f64>> = Lazy::new(|| {
    HashMap::from([
        (Currency::Usd, 1.0),
        (Currency::Eur, 0.92),
        (Currency::Bdt, 110.0),
        // One SOL priced at 150 USD
        (Currency::Sol, 1.0 / 150.0),
    ])
});

/// Some tickers quote prices as JSON strings
fn value_as_f64(value: &serde_json::Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

/// Short display name for a source URL (its host)
fn source_name(url: &str) -> String {
    url.split("//")
        .nth(1)
        .and_then(|rest| rest.split('/').next())
        .unwrap_or(url)
        .to_string()
}
