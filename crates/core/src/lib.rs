//! Core data types for the funding-carry monitor.

pub mod alert;
pub mod asset;
pub mod price;

pub use alert::*;
pub use asset::*;
pub use price::*;
