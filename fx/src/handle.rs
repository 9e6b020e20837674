//! Lightweight per-currency handles.

use std::fmt;

use ratekit_common::Currency;
use rust_decimal::Decimal;

use crate::conversion::Conversion;
use crate::engine::FxEngine;
use crate::error::FxResult;

/// One currency code. Holds no rate data; every call goes through the
/// engine's cache, so any number of handles per code behave the same.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurrencyHandle {
    currency: Currency,
}

impl CurrencyHandle {
    pub fn new(currency: Currency) -> Self {
        Self { currency }
    }

    /// Build a handle from an untrusted code.
    pub fn parse(code: &str) -> FxResult<Self> {
        Ok(Self::new(Currency::parse(code)?))
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn code(&self) -> &str {
        self.currency.code()
    }

    /// Current rate from the engine's base to this currency.
    pub async fn rate(&self, engine: &FxEngine) -> FxResult<Decimal> {
        engine.rate(&self.currency).await
    }

    /// Rate with the engine's margin applied.
    pub async fn rate_with_margin(&self, engine: &FxEngine) -> FxResult<Decimal> {
        engine.rate_with_margin(&self.currency).await
    }

    /// `1 / rate`.
    pub async fn inverse(&self, engine: &FxEngine) -> FxResult<Decimal> {
        engine.inverse(&self.currency).await
    }

    /// Convert `amount` of the base currency into this currency.
    pub async fn convert(&self, engine: &FxEngine, amount: Decimal) -> FxResult<Decimal> {
        engine.convert(&self.currency, amount).await
    }

    /// Like [`convert`](Self::convert), returning the full record.
    pub async fn convert_detailed(&self, engine: &FxEngine, amount: Decimal) -> FxResult<Conversion> {
        engine.convert_detailed(&self.currency, amount).await
    }

    /// Convert `amount` of this currency back into the base currency.
    pub async fn convert_to_base(&self, engine: &FxEngine, amount: Decimal) -> FxResult<Decimal> {
        engine.convert_to_base(&self.currency, amount).await
    }

    pub async fn describe(&self, engine: &FxEngine) -> String {
        engine.describe(&self.currency).await
    }
}

impl fmt::Display for CurrencyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.currency)
    }
}

impl From<Currency> for CurrencyHandle {
    fn from(currency: Currency) -> Self {
        Self::new(currency)
    }
}
