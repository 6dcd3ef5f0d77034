//! Funding-carry signal engine.
//!
//! This crate contains the signal computation, the watch configuration shared
//! between the background tasks, and the market sampler loop.

pub mod funding;
pub mod sampler;
pub mod signal;
pub mod watch;

pub use funding::*;
pub use sampler::*;
pub use signal::*;
pub use watch::*;
