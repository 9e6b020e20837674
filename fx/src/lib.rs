//! ratekit FX engine
//!
//! Cached currency rate lookup and conversion against remote rate APIs.
//!
//! # Features
//!
//! - Sequential fallback across several endpoint templates
//! - Normalization of the common rate payload shapes
//! - Single-entry rate cache with configurable TTL and offline fallback
//! - Percentage margin applied to conversions
//!
//! # Example
//!
//! ```rust,ignore
//! use ratekit_fx::{CurrencyRegistry, FxConfig, FxEngine};
//! use rust_decimal_macros::dec;
//!
//! let engine = FxEngine::with_http(FxConfig::default())?;
//! let eur = CurrencyRegistry::global().get("EUR").unwrap();
//!
//! // $100 in EUR
//! let amount = eur.convert(&engine, dec!(100)).await?;
//!
//! // Same, with a PayPal-like markup
//! engine.set_margin(dec!(3.5));
//! let marked_down = eur.convert(&engine, dec!(100)).await?;
//! ```

pub mod cache;
pub mod config;
pub mod conversion;
pub mod engine;
pub mod error;
pub mod handle;
pub mod normalize;
pub mod provider;
pub mod registry;
pub mod table;

pub use cache::{CacheStats, RateCache};
pub use config::FxConfig;
pub use conversion::Conversion;
pub use engine::{FxEngine, FxStatus};
pub use error::{EndpointError, FxError, FxResult};
pub use handle::CurrencyHandle;
pub use provider::{HttpRateSource, RateSource};
pub use registry::{CurrencyRegistry, Region};
pub use table::RateTable;

#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateSource;
