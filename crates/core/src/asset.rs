//! Coin and contract symbol definitions.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Quote currency every watched contract settles in.
pub const QUOTE_SUFFIX: &str = "_USDT";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SymbolError {
    #[error("empty coin symbol")]
    Empty,
    #[error("invalid character in coin symbol: {0}")]
    InvalidChar(String),
}

/// Base coin symbol (e.g., "BTC"), always stored upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coin(CompactString);

impl Coin {
    /// Create a coin from user or provider text, normalizing case.
    pub fn new(symbol: &str) -> Result<Self, SymbolError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(SymbolError::Empty);
        }
        if symbol.chars().any(char::is_whitespace) {
            return Err(SymbolError::InvalidChar(symbol.to_string()));
        }
        Ok(Self(CompactString::new(symbol.to_uppercase())))
    }

    /// Contract name on the USDT-settled markets (e.g., "BTC_USDT").
    pub fn contract(&self) -> String {
        format!("{}{}", self.0, QUOTE_SUFFIX)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
