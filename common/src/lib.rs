//! ratekit common types
//!
//! Value types shared by the rate engine and the demo harness: validated
//! currency codes, monetary amounts, and timing defaults.

pub mod monetary;
pub mod error;
pub mod time;

pub use monetary::*;
pub use error::*;
pub use time::*;
