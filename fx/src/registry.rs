//! Static registry of supported currency codes.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use ratekit_common::Currency;

use crate::error::FxResult;
use crate::handle::CurrencyHandle;

/// Broad grouping used when listing currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Major,
    Europe,
    Asia,
    MiddleEastAfrica,
    Americas,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Region::Major => "Major World Currencies",
            Region::Europe => "European Currencies",
            Region::Asia => "Asian Currencies",
            Region::MiddleEastAfrica => "Middle East & Africa",
            Region::Americas => "Americas",
        };
        f.write_str(name)
    }
}

/// Every code the registry knows about, in listing order.
pub const CURRENCY_CODES: &[(&str, Region)] = &[
    ("USD", Region::Major),
    ("EUR", Region::Major),
    ("GBP", Region::Major),
    ("JPY", Region::Major),
    ("CNY", Region::Major),
    ("CHF", Region::Major),
    ("AUD", Region::Major),
    ("CAD", Region::Major),
    ("NZD", Region::Major),
    ("HKD", Region::Major),
    ("SGD", Region::Major),
    ("SEK", Region::Europe),
    ("NOK", Region::Europe),
    ("DKK", Region::Europe),
    ("PLN", Region::Europe),
    ("CZK", Region::Europe),
    ("HUF", Region::Europe),
    ("RON", Region::Europe),
    ("BGN", Region::Europe),
    ("HRK", Region::Europe),
    ("RSD", Region::Europe),
    ("ISK", Region::Europe),
    ("RUB", Region::Europe),
    ("UAH", Region::Europe),
    ("TRY", Region::Europe),
    ("INR", Region::Asia),
    ("KRW", Region::Asia),
    ("THB", Region::Asia),
    ("MYR", Region::Asia),
    ("IDR", Region::Asia),
    ("PHP", Region::Asia),
    ("VND", Region::Asia),
    ("TWD", Region::Asia),
    ("PKR", Region::Asia),
    ("BDT", Region::Asia),
    ("LKR", Region::Asia),
    ("NPR", Region::Asia),
    ("MMK", Region::Asia),
    ("KHR", Region::Asia),
    ("AED", Region::MiddleEastAfrica),
    ("SAR", Region::MiddleEastAfrica),
    ("ILS", Region::MiddleEastAfrica),
    ("EGP", Region::MiddleEastAfrica),
    ("ZAR", Region::MiddleEastAfrica),
    ("NGN", Region::MiddleEastAfrica),
    ("KES", Region::MiddleEastAfrica),
    ("GHS", Region::MiddleEastAfrica),
    ("MAD", Region::MiddleEastAfrica),
    ("QAR", Region::MiddleEastAfrica),
    ("KWD", Region::MiddleEastAfrica),
    ("BHD", Region::MiddleEastAfrica),
    ("OMR", Region::MiddleEastAfrica),
    ("JOD", Region::MiddleEastAfrica),
    ("MXN", Region::Americas),
    ("BRL", Region::Americas),
    ("ARS", Region::Americas),
    ("CLP", Region::Americas),
    ("COP", Region::Americas),
    ("PEN", Region::Americas),
    ("UYU", Region::Americas),
];

/// Lookup table from code to handle, built once from [`CURRENCY_CODES`].
pub struct CurrencyRegistry {
    handles: Vec<(CurrencyHandle, Region)>,
    index: HashMap<Currency, usize>,
}

impl CurrencyRegistry {
    /// Build a registry from the static code list.
    pub fn new() -> Self {
        let handles: Vec<(CurrencyHandle, Region)> = CURRENCY_CODES
            .iter()
            .map(|(code, region)| (CurrencyHandle::new(Currency::new(*code)), *region))
            .collect();
        let index = handles
            .iter()
            .enumerate()
            .map(|(i, (handle, _))| (handle.currency().clone(), i))
            .collect();

        Self { handles, index }
    }

    /// Process-wide registry instance.
    pub fn global() -> &'static CurrencyRegistry {
        static REGISTRY: OnceLock<CurrencyRegistry> = OnceLock::new();
        REGISTRY.get_or_init(CurrencyRegistry::new)
    }

    /// Look up a handle by code, in any case.
    pub fn get(&self, code: &str) -> Option<&CurrencyHandle> {
        let currency = Currency::parse(code).ok()?;
        self.index.get(&currency).map(|&i| &self.handles[i].0)
    }

    /// Handle for any valid code, registered or not.
    pub fn handle(&self, code: &str) -> FxResult<CurrencyHandle> {
        match self.get(code) {
            Some(handle) => Ok(handle.clone()),
            None => CurrencyHandle::parse(code),
        }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// Handles in listing order.
    pub fn iter(&self) -> impl Iterator<Item = &CurrencyHandle> {
        self.handles.iter().map(|(handle, _)| handle)
    }

    /// Handles belonging to one region, in listing order.
    pub fn in_region(&self, region: Region) -> impl Iterator<Item = &CurrencyHandle> {
        self.handles
            .iter()
            .filter(move |(_, r)| *r == region)
            .map(|(handle, _)| handle)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Default for CurrencyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        let registry = CurrencyRegistry::new();

        assert_eq!(registry.len(), 60);
        assert_eq!(registry.get("eur").unwrap().currency(), &Currency::eur());
        assert!(registry.contains("JPY"));
        assert!(registry.get("ZZZ").is_none());
        assert!(registry.get("not a code").is_none());

        assert_eq!(registry.handle("zzz").unwrap().code(), "ZZZ");
        assert!(registry.handle("zz").is_err());
    }

    #[test]
    fn test_codes_are_unique_and_valid() {
        let registry = CurrencyRegistry::new();
        assert_eq!(registry.index.len(), CURRENCY_CODES.len());
        for (code, _) in CURRENCY_CODES {
            assert!(Currency::parse(code).is_ok(), "{} is not a valid code", code);
        }
    }

    #[test]
    fn test_listing_order_and_regions() {
        let registry = CurrencyRegistry::global();

        let first: Vec<&str> = registry.iter().take(3).map(|h| h.code()).collect();
        assert_eq!(first, vec!["USD", "EUR", "GBP"]);

        let americas: Vec<&str> = registry.in_region(Region::Americas).map(|h| h.code()).collect();
        assert_eq!(americas, vec!["MXN", "BRL", "ARS", "CLP", "COP", "PEN", "UYU"]);
        assert_eq!(registry.in_region(Region::Asia).count(), 14);
    }
}
