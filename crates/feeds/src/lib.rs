//! Market data collection for the funding-carry monitor.
//!
//! - `source` - the `MarketData` trait the sampler consumes
//! - `rest` - Gate.io REST implementation

pub mod error;
pub mod rest;
pub mod source;

pub use error::*;
pub use rest::*;
pub use source::*;
