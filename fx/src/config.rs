//! Engine configuration.

use std::time::Duration;

use ratekit_common::{constants, Currency};
use rust_decimal::Decimal;

use crate::error::{FxError, FxResult};

/// ExchangeRate-API open access endpoint (no key required).
pub const DEFAULT_ENDPOINT: &str = "https://open.er-api.com/v6/latest/{BASE}";

/// Runtime settings for an [`FxEngine`](crate::FxEngine).
#[derive(Debug, Clone, PartialEq)]
pub struct FxConfig {
    /// Currency that amounts are denominated in before conversion.
    pub base_currency: Currency,
    /// Markdown applied to rates, in percent (3.5 = 3.5%).
    pub margin_percent: Decimal,
    /// How long a fetched table stays fresh.
    pub cache_ttl_minutes: u64,
    /// Never touch the network; serve whatever is cached.
    pub offline_mode: bool,
    /// URL templates tried in order. `{base}` and `{BASE}` are substituted.
    pub endpoints: Vec<String>,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            base_currency: Currency::usd(),
            margin_percent: Decimal::ZERO,
            cache_ttl_minutes: constants::DEFAULT_CACHE_TTL_MINUTES,
            offline_mode: false,
            endpoints: vec![DEFAULT_ENDPOINT.to_string()],
            request_timeout: constants::request_timeout(),
        }
    }
}

impl FxConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup. Unparseable values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(base) = lookup("FX_BASE_CURRENCY") {
            if let Ok(base) = Currency::parse(&base) {
                config.base_currency = base;
            }
        }

        if let Some(margin) = lookup("FX_MARGIN_PERCENT") {
            if let Ok(margin) = margin.trim().parse() {
                config.margin_percent = margin;
            }
        }

        if let Some(ttl) = lookup("FX_CACHE_TTL_MINUTES") {
            if let Ok(ttl) = ttl.trim().parse() {
                config.cache_ttl_minutes = ttl;
            }
        }

        if let Some(offline) = lookup("FX_OFFLINE_MODE") {
            config.offline_mode = matches!(
                offline.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        if let Some(endpoints) = lookup("FX_ENDPOINTS") {
            let endpoints: Vec<String> = endpoints
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(String::from)
                .collect();
            if !endpoints.is_empty() {
                config.endpoints = endpoints;
            }
        }

        if let Some(secs) = lookup("FX_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = secs.trim().parse() {
                config.request_timeout = Duration::from_secs(secs);
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> FxResult<()> {
        Currency::parse(self.base_currency.code())?;

        if self.endpoints.is_empty() && !self.offline_mode {
            return Err(FxError::InvalidConfig(
                "At least one endpoint is required unless offline".to_string(),
            ));
        }

        if let Some(bad) = self
            .endpoints
            .iter()
            .find(|e| !e.contains("{base}") && !e.contains("{BASE}"))
        {
            return Err(FxError::InvalidConfig(format!(
                "Endpoint has no {{base}} or {{BASE}} placeholder: {}",
                bad
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(FxError::InvalidConfig(
                "Request timeout cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}
