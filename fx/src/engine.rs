//! Main FX engine implementation.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use ratekit_common::{ttl_from_minutes, Currency, Money};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::cache::RateCache;
use crate::config::FxConfig;
use crate::conversion::{apply_margin, divide, effective_rate, multiply, Conversion};
use crate::error::{FxError, FxResult};
use crate::provider::{fetch_rates, HttpRateSource, RateSource};
use crate::table::RateTable;

/// Rate lookup and conversion context.
///
/// Owns its configuration and its cache, so independent engines never
/// share state.
pub struct FxEngine {
    source: Arc<dyn RateSource>,
    config: RwLock<FxConfig>,
    cache: RateCache,
}

impl FxEngine {
    /// Create a new FX engine with the given rate source.
    pub fn new(config: FxConfig, source: Arc<dyn RateSource>) -> Self {
        Self {
            source,
            config: RwLock::new(config),
            cache: RateCache::new(),
        }
    }

    /// Create an engine that fetches over HTTP.
    pub fn with_http(config: FxConfig) -> FxResult<Self> {
        config.validate()?;
        let source = HttpRateSource::with_timeout(config.request_timeout)?;
        Ok(Self::new(config, Arc::new(source)))
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> FxConfig {
        self.config.read().clone()
    }

    pub fn base_currency(&self) -> Currency {
        self.config.read().base_currency.clone()
    }

    pub fn margin_percent(&self) -> Decimal {
        self.config.read().margin_percent
    }

    /// Change the base currency and drop the cached table.
    pub async fn set_base(&self, code: &str) -> FxResult<()> {
        let base = Currency::parse(code)?;
        let previous = self
            .cache
            .clear_with(|| std::mem::replace(&mut self.config.write().base_currency, base.clone()))
            .await;

        info!(from = %previous, to = %base, "Base currency changed");
        Ok(())
    }

    /// Set the margin percentage applied to conversions.
    pub fn set_margin(&self, percent: Decimal) {
        if percent >= Decimal::ONE_HUNDRED {
            warn!(margin_percent = %percent, "Margin of 100% or more gives non-positive rates");
        }
        self.config.write().margin_percent = percent;
        debug!(margin_percent = %percent, "Margin updated");
    }

    /// Set how many minutes a fetched table stays fresh.
    pub fn set_cache_ttl(&self, minutes: u64) {
        self.config.write().cache_ttl_minutes = minutes;
        debug!(cache_ttl_minutes = minutes, "Cache TTL updated");
    }

    /// Turn offline mode on or off.
    pub fn set_offline_mode(&self, offline: bool) {
        self.config.write().offline_mode = offline;
        info!(offline, "Offline mode updated");
    }

    /// Replace the endpoint templates.
    pub fn set_endpoints(&self, endpoints: Vec<String>) -> FxResult<()> {
        let mut candidate = self.config();
        candidate.endpoints = endpoints;
        candidate.validate()?;

        self.config.write().endpoints = candidate.endpoints;
        Ok(())
    }

    /// Current rate table for the configured base.
    #[instrument(skip(self))]
    pub async fn rates(&self) -> FxResult<Arc<RateTable>> {
        let (base, ttl, offline, endpoints) = {
            let config = self.config.read();
            (
                config.base_currency.clone(),
                ttl_from_minutes(config.cache_ttl_minutes),
                config.offline_mode,
                config.endpoints.clone(),
            )
        };

        self.cache
            .get_or_fetch(&base, ttl, offline, || {
                fetch_rates(self.source.as_ref(), &endpoints, &base)
            })
            .await
    }

    /// Drop the cached table and fetch a fresh one.
    #[instrument(skip(self))]
    pub async fn refresh_rates(&self) -> FxResult<Arc<RateTable>> {
        self.cache.clear().await;
        let table = self.rates().await?;
        info!(rates = table.len(), "Rates refreshed");
        Ok(table)
    }

    /// Rate from the base to `currency`.
    pub async fn rate(&self, currency: &Currency) -> FxResult<Decimal> {
        self.rates()
            .await?
            .get(currency)
            .ok_or_else(|| FxError::CurrencyNotFound(currency.clone()))
    }

    /// Rate with the margin applied, whatever its sign.
    pub async fn rate_with_margin(&self, currency: &Currency) -> FxResult<Decimal> {
        let rate = self.rate(currency).await?;
        apply_margin(rate, self.margin_percent())
    }

    /// `1 / rate`: how much base one unit of `currency` is worth.
    pub async fn inverse(&self, currency: &Currency) -> FxResult<Decimal> {
        let rate = self.rate(currency).await?;
        divide(Decimal::ONE, rate)
    }

    /// Convert `amount` of the base currency into `currency`.
    ///
    /// A positive margin is applied; zero or negative margins convert at
    /// the plain rate.
    #[instrument(skip(self), fields(currency = %currency, amount = %amount))]
    pub async fn convert(&self, currency: &Currency, amount: Decimal) -> FxResult<Decimal> {
        let rate = self.rate(currency).await?;
        multiply(amount, effective_rate(rate, self.margin_percent())?)
    }

    /// Convert and return the full conversion record.
    pub async fn convert_detailed(&self, currency: &Currency, amount: Decimal) -> FxResult<Conversion> {
        let rate = self.rate(currency).await?;
        let input = Money::new(amount, self.base_currency());
        let conversion = Conversion::compute(input, currency.clone(), rate, self.margin_percent())?;

        debug!(
            conversion_id = %conversion.id,
            effective_rate = %conversion.effective_rate,
            "Conversion completed"
        );

        Ok(conversion)
    }

    /// Convert `amount` of `currency` back into the base, at the plain rate.
    pub async fn convert_to_base(&self, currency: &Currency, amount: Decimal) -> FxResult<Decimal> {
        let rate = self.rate(currency).await?;
        divide(amount, rate)
    }

    /// Human-readable rate line, e.g. `<EUR: 1 USD = 0.920000 EUR>`.
    pub async fn describe(&self, currency: &Currency) -> String {
        match self.rate(currency).await {
            Ok(rate) => format!(
                "<{}: 1 {} = {:.6} {}>",
                currency,
                self.base_currency(),
                rate,
                currency
            ),
            Err(_) => format!("<Currency: {}>", currency),
        }
    }

    /// Get engine status.
    pub async fn status(&self) -> FxStatus {
        let config = self.config();
        let cache = self.cache.stats().await;

        FxStatus {
            base_currency: config.base_currency,
            margin_percent: config.margin_percent,
            cache_ttl_minutes: config.cache_ttl_minutes,
            offline_mode: config.offline_mode,
            using_fallback: cache.using_fallback,
            cached_currencies: cache.entries,
            last_fetch: cache.fetched_at,
        }
    }
}

/// Engine status snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct FxStatus {
    pub base_currency: Currency,
    pub margin_percent: Decimal,
    pub cache_ttl_minutes: u64,
    pub offline_mode: bool,
    pub using_fallback: bool,
    pub cached_currencies: usize,
    pub last_fetch: Option<DateTime<Utc>>,
}

impl fmt::Display for FxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Base currency: {}", self.base_currency)?;
        writeln!(f, "Margin: {}%", self.margin_percent)?;
        writeln!(f, "Cache TTL: {} minutes", self.cache_ttl_minutes)?;
        writeln!(f, "Offline mode: {}", self.offline_mode)?;
        writeln!(f, "Using fallback rates: {}", self.using_fallback)?;
        write!(f, "Cached currencies: {}", self.cached_currencies)?;
        if let Some(at) = self.last_fetch {
            write!(f, "\nLast fetch: {}", at.to_rfc3339())?;
        }
        Ok(())
    }
}
