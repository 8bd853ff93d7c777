//! Cached exchange-rate service.
//!
//! Keeps one in-memory rate table relative to the base unit, refreshed from
//! prioritized external sources on a timer and lazily when a read finds the
//! table stale. A failed refresh never clears the table: the previous
//! snapshot (or the static fallback, before any successful load) stays in
//! place, so conversions always have rates to work with.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{interval, timeout};
use tracing::{debug, info, warn};

use super::convert::convert_with_table;
use super::sources::{build_sources, CryptoPriceSource, RateSource, STATIC_RATES};
use super::Currency;
use crate::config::CurrencyConfig;
use crate::errors::{CasinoResult, CurrencyError};

/// Immutable snapshot of the rate table.
///
/// `rates[c]` is the number of units of `c` per one base unit. A refresh
/// either replaces the whole snapshot or leaves the previous one untouched.
#[derive(Debug, Clone)]
pub struct RateTable {
    pub base: Currency,
    pub rates: HashMap<Currency, f64>,
    pub last_updated: DateTime<Utc>,
}

impl RateTable {
    /// Static table used until the first successful refresh
    pub fn fallback() -> Self {
        Self {
            base: Currency::REFERENCE,
            rates: STATIC_RATES.clone(),
            last_updated: Utc::now(),
        }
    }

    /// Rate for one currency
    pub fn rate(&self, currency: Currency) -> CasinoResult<f64> {
        self.rates
            .get(&currency)
            .copied()
            .filter(|r| *r > 0.0)
            .ok_or_else(|| CurrencyError::ConversionUnavailable(currency).into())
    }

    /// Cross rate: units of `to` per one unit of `from`
    pub fn exchange_rate(&self, from: Currency, to: Currency) -> CasinoResult<f64> {
        Ok(self.rate(to)? / self.rate(from)?)
    }

    /// Convert an amount between currencies, rounded to the precision of
    /// the target currency.
    pub fn convert(&self, amount: f64, from: Currency, to: Currency) -> CasinoResult<f64> {
        convert_with_table(self, amount, from, to)
    }

    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.last_updated
    }

    pub fn age_minutes(&self) -> i64 {
        self.age().num_minutes()
    }
}

/// Process-wide exchange-rate cache with layered refresh.
pub struct RateService {
    table: RwLock<RateTable>,
    fiat_sources: Vec<Box<dyn RateSource>>,
    crypto_sources: Vec<Box<dyn CryptoPriceSource>>,
    cache_duration: Duration,
    source_timeout: Duration,
    /// Serializes refreshes so concurrent stale reads don't stampede the
    /// external sources
    refresh_lock: Mutex<()>,
}

impl RateService {
    /// Build a service with HTTP sources from configuration
    pub fn new(config: &CurrencyConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.source_timeout_secs))
            .build()
            .unwrap_or_default();
        let (fiat_sources, crypto_sources) = build_sources(config, client);

        Self::with_sources(
            fiat_sources,
            crypto_sources,
            Duration::from_secs(config.cache_duration_secs),
            Duration::from_secs(config.source_timeout_secs),
        )
    }

    /// Build a service with explicit sources (tests inject mocks here)
    pub fn with_sources(
        fiat_sources: Vec<Box<dyn RateSource>>,
        crypto_sources: Vec<Box<dyn CryptoPriceSource>>,
        cache_duration: Duration,
        source_timeout: Duration,
    ) -> Self {
        Self {
            table: RwLock::new(RateTable::fallback()),
            fiat_sources,
            crypto_sources,
            cache_duration,
            source_timeout,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Current table, refreshed first if older than the cache duration.
    pub async fn rates(&self) -> RateTable {
        if self.is_stale().await {
            self.refresh_if_stale().await;
        }

        self.table.read().await.clone()
    }

    /// Convert using the current (possibly refreshed) table
    pub async fn convert(&self, amount: f64, from: Currency, to: Currency) -> CasinoResult<f64> {
        self.rates().await.convert(amount, from, to)
    }

    /// Cross rate using the current (possibly refreshed) table
    pub async fn exchange_rate(&self, from: Currency, to: Currency) -> CasinoResult<f64> {
        self.rates().await.exchange_rate(from, to)
    }

    /// Query the prioritized source lists and swap in a new table.
    ///
    /// The first fiat source answering for every required currency wins;
    /// crypto prices are merged in from their own source list. When every
    /// source fails the previous table is kept as-is.
    pub async fn refresh(&self) {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_inner().await;
    }

    async fn is_stale(&self) -> bool {
        self.table.read().await.age().num_seconds() as u64 >= self.cache_duration.as_secs()
    }

    /// Refresh unless another caller already did while we waited for the
    /// guard.
    async fn refresh_if_stale(&self) {
        let _guard = self.refresh_lock.lock().await;
        if !self.is_stale().await {
            return;
        }
        self.refresh_inner().await;
    }

    async fn refresh_inner(&self) {
        let fiat = self.fetch_fiat().await;
        let crypto = self.fetch_crypto().await;

        if fiat.is_none() && crypto.is_none() {
            let age = self.table.read().await.age().num_seconds();
            warn!(
                age_secs = age,
                "all rate sources failed; keeping previous table"
            );
            return;
        }

        let fiat_ok = fiat.is_some();
        let crypto_ok = crypto.is_some();

        let mut table = self.table.write().await;
        let mut rates = table.rates.clone();
        if let Some(fiat_rates) = fiat {
            rates.extend(fiat_rates);
        }
        if let Some(price_usd) = crypto {
            // Sources quote the USD price of one crypto unit; the table
            // stores units per base.
            rates.insert(Currency::Sol, 1.0 / price_usd);
        }

        *table = RateTable {
            base: Currency::REFERENCE,
            rates,
            last_updated: Utc::now(),
        };
        info!(fiat = fiat_ok, crypto = crypto_ok, "exchange rates refreshed");
    }

    async fn fetch_fiat(&self) -> Option<HashMap<Currency, f64>> {
        let required = Currency::fiat();
        for source in &self.fiat_sources {
            match timeout(self.source_timeout, source.fetch(&required)).await {
                Ok(Ok(rates)) => {
                    debug!(source = source.name(), "fiat rates fetched");
                    return Some(rates);
                }
                Ok(Err(e)) => {
                    warn!(source = source.name(), error = %e, "fiat source failed");
                }
                Err(_) => {
                    warn!(source = source.name(), "fiat source timed out");
                }
            }
        }
        None
    }

    async fn fetch_crypto(&self) -> Option<f64> {
        for source in &self.crypto_sources {
            match timeout(self.source_timeout, source.fetch_price()).await {
                Ok(Ok(price)) => {
                    debug!(source = source.name(), price, "crypto price fetched");
                    return Some(price);
                }
                Ok(Err(e)) => {
                    warn!(source = source.name(), error = %e, "crypto source failed");
                }
                Err(_) => {
                    warn!(source = source.name(), "crypto source timed out");
                }
            }
        }
        None
    }

    /// Background refresh loop: one immediate refresh, then one per interval.
    pub fn spawn_refresh_task(self: &Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            service.refresh().await;
            let mut ticker = interval(period);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                service.refresh().await;
            }
        })
    }
}
