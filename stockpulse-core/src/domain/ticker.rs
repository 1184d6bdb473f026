//! Exchange-qualified equity symbols with their display name and market.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Suffix that marks a domestic (Madrid exchange) listing.
pub const DOMESTIC_SUFFIX: &str = ".MC";

/// Market segment a listing trades in.
///
/// Domestic listings are quoted in the dashboard's home currency; foreign
/// listings are converted through the exchange rate before any comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    Domestic,
    Foreign,
}

impl Market {
    /// Infer the market from the symbol suffix convention.
    pub fn from_symbol(symbol: &str) -> Self {
        if symbol.ends_with(DOMESTIC_SUFFIX) {
            Self::Domestic
        } else {
            Self::Foreign
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Domestic => "domestic",
            Self::Foreign => "foreign",
        }
    }
}

/// An equity in the watchlist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub name: String,
    pub market: Market,
}

impl Ticker {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        let symbol = symbol.into();
        let market = Market::from_symbol(&symbol);
        Self {
            symbol,
            name: name.into(),
            market,
        }
    }

    /// A ticker outside the reference table: its display name is the symbol.
    pub fn literal(symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        Self::new(symbol.clone(), symbol)
    }

    pub fn is_domestic(&self) -> bool {
        self.market == Market::Domestic
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_marks_domestic() {
        assert_eq!(Market::from_symbol("BBVA.MC"), Market::Domestic);
        assert_eq!(Market::from_symbol("AAPL"), Market::Foreign);
        assert_eq!(Market::from_symbol("BRK-B"), Market::Foreign);
    }

    #[test]
    fn suffix_must_be_trailing() {
        assert_eq!(Market::from_symbol(".MCX"), Market::Foreign);
    }

    #[test]
    fn literal_uses_symbol_as_name() {
        let t = Ticker::literal("ZZZ");
        assert_eq!(t.name, "ZZZ");
        assert!(!t.is_domestic());
    }
}
